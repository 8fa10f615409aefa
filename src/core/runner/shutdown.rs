use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::core::error::BootstrapResult;
use crate::core::events::bus::{EventBus, ProgressObserver};
use crate::core::events::catalog::EVENT_APP_STARTED;
use crate::core::events::ProgressEvent;
use crate::core::settings::GlobalSettings;

const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Ends the bootstrap process once the application has been handed off.
/// A short grace period lets the spawned process detach cleanly before the
/// host exits. When `close_on_end` is off the bootstrap stays alive so its
/// log keeps mirroring the child's output.
pub struct CloseObserver {
    settings: Arc<GlobalSettings>,
}

impl CloseObserver {
    pub fn new(settings: Arc<GlobalSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ProgressObserver for CloseObserver {
    async fn update(&self, event: &ProgressEvent, _bus: &EventBus) -> BootstrapResult<()> {
        if event.name() != EVENT_APP_STARTED {
            return Ok(());
        }
        tokio::time::sleep(EXIT_GRACE).await;
        if self.settings.close_on_end() {
            info!("Application handed off, closing bootstrap");
            std::process::exit(0);
        }
        Ok(())
    }
}
