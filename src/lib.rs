pub mod core;

pub use crate::core::error::{BootstrapError, BootstrapResult};
pub use crate::core::orchestrator::run;
pub use crate::core::settings::GlobalSettings;
