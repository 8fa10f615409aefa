use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::core::error::BootstrapResult;
use crate::core::events::bus::{EventBus, ProgressObserver};
use crate::core::events::catalog::{EventCatalog, EVENT_APP_STARTING};
use crate::core::events::ProgressEvent;
use crate::core::runner::command::CommandFactory;
use crate::core::runner::exec::CommandExecutor;
use crate::core::settings::GlobalSettings;

/// Launches the application on the runtime already installed on this
/// machine. No download or unpack happened, so the launcher binary comes
/// from the configured runtime home and is assumed executable.
pub struct CurrentRuntimeRunner {
    settings: Arc<GlobalSettings>,
    catalog: EventCatalog,
    executor: Arc<dyn CommandExecutor>,
}

impl CurrentRuntimeRunner {
    pub fn new(
        settings: Arc<GlobalSettings>,
        catalog: EventCatalog,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            settings,
            catalog,
            executor,
        }
    }
}

#[async_trait]
impl ProgressObserver for CurrentRuntimeRunner {
    async fn update(&self, event: &ProgressEvent, bus: &EventBus) -> BootstrapResult<()> {
        if event.name() != EVENT_APP_STARTING {
            return Ok(());
        }
        let runtime_home = Path::new(self.settings.current_runtime_home());
        let command = CommandFactory.run_application_command(&self.settings, runtime_home);
        info!("Starting application on installed runtime: {}", command);
        self.executor.spawn_detached(&command).await?;
        bus.publish(self.catalog.app_started()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::core::runner::command::ExecutableCommand;
    use crate::core::settings::test_support::SettingsBuilder;

    struct RecordingExecutor {
        spawned: Mutex<Vec<ExecutableCommand>>,
    }

    #[async_trait]
    impl CommandExecutor for RecordingExecutor {
        async fn exit_code(&self, _command: &ExecutableCommand) -> BootstrapResult<i32> {
            Ok(0)
        }

        async fn spawn_detached(&self, command: &ExecutableCommand) -> BootstrapResult<()> {
            self.spawned.lock().unwrap().push(command.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn spawns_from_the_configured_runtime_home() {
        let settings = Arc::new(
            SettingsBuilder::new()
                .current_runtime_home("/usr/lib/jvm/installed")
                .dependency_urls(&["http://example.com/app.jar"])
                .build(),
        );
        let catalog = EventCatalog::init(&settings);
        let executor = Arc::new(RecordingExecutor {
            spawned: Mutex::new(Vec::new()),
        });
        let runner = Arc::new(CurrentRuntimeRunner::new(
            settings,
            catalog.clone(),
            executor.clone(),
        ));

        let bus = EventBus::new();
        bus.register(runner);
        bus.publish(catalog.app_starting()).await.unwrap();

        let spawned = executor.spawned.lock().unwrap();
        assert_eq!(spawned.len(), 1);
        assert!(spawned[0].program().starts_with("/usr/lib/jvm/installed"));
    }

    #[tokio::test]
    async fn ignores_unrelated_events() {
        let settings = Arc::new(SettingsBuilder::new().build());
        let catalog = EventCatalog::init(&settings);
        let executor = Arc::new(RecordingExecutor {
            spawned: Mutex::new(Vec::new()),
        });
        let runner = Arc::new(CurrentRuntimeRunner::new(
            settings,
            catalog.clone(),
            executor.clone(),
        ));

        let bus = EventBus::new();
        bus.register(runner);
        bus.publish(catalog.runtime_downloaded()).await.unwrap();

        assert!(executor.spawned.lock().unwrap().is_empty());
    }
}
