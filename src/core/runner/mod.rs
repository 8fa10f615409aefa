// ─── Application Runner ───
// Command assembly, process execution, and the two launch strategies:
// run on the runtime fetched this run, or on the one already installed.

pub mod command;
pub mod current;
pub mod exec;
pub mod shutdown;
pub mod target;
pub mod version;

use tracing::info;

use crate::core::error::BootstrapResult;
use crate::core::runner::version::VersionMatcher;
use crate::core::settings::GlobalSettings;

/// Which runtime the application will be launched on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchStrategy {
    /// Download/unpack the target runtime and launch on it.
    FetchedRuntime,
    /// The installed runtime satisfies the target version; launch on it and
    /// skip the runtime fetch.
    InstalledRuntime,
}

/// Pick the launch strategy for this run. The installed runtime is used only
/// when it satisfies the target version expression and the configuration
/// does not force a fetch.
pub fn select_strategy(settings: &GlobalSettings) -> BootstrapResult<LaunchStrategy> {
    if settings.always_fetch_runtime() {
        info!("Configured to always fetch the target runtime");
        return Ok(LaunchStrategy::FetchedRuntime);
    }
    if VersionMatcher.matches(settings)? {
        info!(
            "Installed runtime {} satisfies target {}",
            settings.current_runtime_version(),
            settings.target_runtime_version()
        );
        Ok(LaunchStrategy::InstalledRuntime)
    } else {
        info!(
            "Installed runtime {:?} does not satisfy target {:?}",
            settings.current_runtime_version(),
            settings.target_runtime_version()
        );
        Ok(LaunchStrategy::FetchedRuntime)
    }
}
