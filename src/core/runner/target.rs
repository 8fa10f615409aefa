use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::info;

use crate::core::error::{BootstrapError, BootstrapResult};
use crate::core::events::bus::{EventBus, ProgressObserver};
use crate::core::events::catalog::{EventCatalog, EVENT_APP_STARTING, EVENT_RUNTIME_UNZIPPED};
use crate::core::events::ProgressEvent;
use crate::core::runner::command::CommandFactory;
use crate::core::runner::exec::CommandExecutor;
use crate::core::settings::GlobalSettings;
use crate::core::transfer;

/// Launches the application on the runtime that was downloaded and unpacked
/// this run (or restored from cache). The unpack location arrives through
/// the unzip completion event, so this observer watches for it and holds
/// it until the start request.
pub struct TargetRuntimeRunner {
    settings: Arc<GlobalSettings>,
    catalog: EventCatalog,
    executor: Arc<dyn CommandExecutor>,
    runtime_dir: Mutex<Option<PathBuf>>,
}

impl TargetRuntimeRunner {
    pub fn new(
        settings: Arc<GlobalSettings>,
        catalog: EventCatalog,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            settings,
            catalog,
            executor,
            runtime_dir: Mutex::new(None),
        }
    }

    async fn launch(&self, bus: &EventBus) -> BootstrapResult<()> {
        let runtime_dir = self
            .runtime_dir
            .lock()
            .expect("runtime dir lock poisoned")
            .clone()
            .ok_or_else(|| {
                BootstrapError::Other("start requested before the runtime was unpacked".into())
            })?;

        if self.settings.is_macos() {
            mark_runtime_executable(&runtime_dir)?;
        }

        let command = CommandFactory.run_application_command(&self.settings, &runtime_dir);
        info!("Starting application on fetched runtime: {}", command);
        self.executor.spawn_detached(&command).await?;
        bus.publish(self.catalog.app_started()).await
    }
}

#[async_trait]
impl ProgressObserver for TargetRuntimeRunner {
    async fn update(&self, event: &ProgressEvent, bus: &EventBus) -> BootstrapResult<()> {
        match event.name() {
            EVENT_RUNTIME_UNZIPPED => {
                if let Some(detail) = event.detail() {
                    if !detail.path().trim().is_empty() {
                        *self.runtime_dir.lock().expect("runtime dir lock poisoned") =
                            Some(PathBuf::from(detail.path()));
                    }
                }
                Ok(())
            }
            EVENT_APP_STARTING => self.launch(bus).await,
            _ => Ok(()),
        }
    }
}

/// A zip archive does not carry the executable bit, so on macOS the
/// extracted launcher binary cannot be spawned until it is restored.
#[cfg(unix)]
fn mark_runtime_executable(runtime_dir: &std::path::Path) -> BootstrapResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let binary = transfer::runtime_command_path(runtime_dir);
    std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
        .map_err(|source| BootstrapError::io(&binary, source))
}

#[cfg(not(unix))]
fn mark_runtime_executable(_runtime_dir: &std::path::Path) -> BootstrapResult<()> {
    Ok(())
}
