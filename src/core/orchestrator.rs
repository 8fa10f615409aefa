use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::cache::observer::CacheObserver;
use crate::core::cache::CacheStore;
use crate::core::downloader::dependency::DependencyDownloader;
use crate::core::downloader::runtime::RuntimeDownloader;
use crate::core::error::{BootstrapError, BootstrapResult};
use crate::core::events::bus::{EventBus, ProgressObserver};
use crate::core::events::catalog::{
    EventCatalog, EVENT_RUNTIME_DOWNLOADED, EVENT_RUNTIME_UNZIPPED,
};
use crate::core::events::ProgressEvent;
use crate::core::runner::current::CurrentRuntimeRunner;
use crate::core::runner::exec::{CommandExecutor, TokioCommandExecutor};
use crate::core::runner::shutdown::CloseObserver;
use crate::core::runner::target::TargetRuntimeRunner;
use crate::core::runner::{self, LaunchStrategy};
use crate::core::settings::GlobalSettings;
use crate::core::transfer::FileTransfer;

/// Drives the pipeline forward: each time a step reports completion, the
/// next request event from the replay sequence is published. The workers
/// never talk to each other directly; this observer is the only source of
/// request events after the first.
pub struct ReplayObserver {
    queue: Mutex<VecDeque<ProgressEvent>>,
}

impl ReplayObserver {
    pub fn new(catalog: &EventCatalog) -> Self {
        Self {
            queue: Mutex::new(catalog.replay_sequence().into()),
        }
    }

    pub fn pop_next(&self) -> Option<ProgressEvent> {
        self.queue
            .lock()
            .expect("replay queue lock poisoned")
            .pop_front()
    }

    fn is_advance_trigger(event: &ProgressEvent) -> bool {
        matches!(event, ProgressEvent::DependencyDownloadFinished { .. })
            || matches!(
                event.name(),
                EVENT_RUNTIME_DOWNLOADED | EVENT_RUNTIME_UNZIPPED
            )
    }
}

#[async_trait]
impl ProgressObserver for ReplayObserver {
    async fn update(&self, event: &ProgressEvent, bus: &EventBus) -> BootstrapResult<()> {
        if !Self::is_advance_trigger(event) {
            return Ok(());
        }
        match self.pop_next() {
            Some(next) => {
                debug!("Step complete ({}), advancing to {}", event, next);
                bus.publish(next).await
            }
            None => Ok(()),
        }
    }
}

/// Wire up every observer and run the bootstrap to completion.
///
/// The first replay event is published here; everything after that is
/// event-driven. When this returns, the application process has been
/// spawned (and, with `close_on_end`, the process has already exited).
pub async fn run(settings: GlobalSettings) -> BootstrapResult<()> {
    let settings = Arc::new(settings);
    let catalog = EventCatalog::init(&settings);
    let strategy = runner::select_strategy(&settings)?;
    let store = CacheStore;
    let cache = store.load(&settings.cache_path());
    let executor: Arc<dyn CommandExecutor> = Arc::new(TokioCommandExecutor);
    let transfer = FileTransfer::new()?;

    let bus = EventBus::new();
    let replay = Arc::new(ReplayObserver::new(&catalog));
    bus.register(replay.clone());
    bus.register(Arc::new(RuntimeDownloader::new(
        settings.clone(),
        catalog.clone(),
        FileTransfer::new()?,
        executor.clone(),
        strategy == LaunchStrategy::FetchedRuntime,
        cache,
    )));
    bus.register(Arc::new(DependencyDownloader::new(
        settings.clone(),
        catalog.clone(),
        transfer,
    )));
    match strategy {
        LaunchStrategy::FetchedRuntime => {
            bus.register(Arc::new(TargetRuntimeRunner::new(
                settings.clone(),
                catalog.clone(),
                executor,
            )));
        }
        LaunchStrategy::InstalledRuntime => {
            bus.register(Arc::new(CurrentRuntimeRunner::new(
                settings.clone(),
                catalog.clone(),
                executor,
            )));
        }
    }
    bus.register(Arc::new(CacheObserver::new(settings.clone(), store)));
    bus.register(Arc::new(CloseObserver::new(settings)));

    let first = replay
        .pop_next()
        .ok_or_else(|| BootstrapError::Other("replay sequence is empty".into()))?;
    info!("Bootstrap pipeline starting with {}", first);
    bus.publish(first).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::events::catalog::{
        EVENT_APP_STARTED, EVENT_APP_STARTING, EVENT_RUNTIME_DOWNLOAD_REQUEST,
        EVENT_RUNTIME_UNZIP_REQUEST,
    };
    use crate::core::events::DetailPayload;
    use crate::core::runner::command::ExecutableCommand;
    use crate::core::settings::test_support::SettingsBuilder;

    /// Answers every request event with its completion event, without doing
    /// any real work.
    struct FakeWorker {
        catalog: EventCatalog,
    }

    #[async_trait]
    impl ProgressObserver for FakeWorker {
        async fn update(&self, event: &ProgressEvent, bus: &EventBus) -> BootstrapResult<()> {
            match event {
                ProgressEvent::DependencyDownloadRequest { url, .. } => {
                    bus.publish(self.catalog.dependency_download_finished(url))
                        .await
                }
                _ => match event.name() {
                    EVENT_RUNTIME_DOWNLOAD_REQUEST => {
                        bus.publish(self.catalog.runtime_downloaded().with_detail(
                            DetailPayload::RuntimeDownloaded {
                                archive_path: "/tmp/jre.zip".into(),
                            },
                        ))
                        .await
                    }
                    EVENT_RUNTIME_UNZIP_REQUEST => {
                        bus.publish(self.catalog.runtime_unzipped().with_detail(
                            DetailPayload::RuntimeUnzipped {
                                unpack_dir: "/tmp/jre_unpacked".into(),
                            },
                        ))
                        .await
                    }
                    _ => Ok(()),
                },
            }
        }
    }

    struct CountingExecutor {
        spawns: Mutex<u32>,
    }

    #[async_trait]
    impl crate::core::runner::exec::CommandExecutor for CountingExecutor {
        async fn exit_code(&self, _command: &ExecutableCommand) -> BootstrapResult<i32> {
            Ok(0)
        }

        async fn spawn_detached(&self, _command: &ExecutableCommand) -> BootstrapResult<()> {
            *self.spawns.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct NameLog {
        names: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProgressObserver for NameLog {
        async fn update(&self, event: &ProgressEvent, _bus: &EventBus) -> BootstrapResult<()> {
            self.names.lock().unwrap().push(event.name().to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn pipeline_runs_each_step_once_in_order_and_launches_once() {
        let settings = Arc::new(
            SettingsBuilder::new()
                .dependency_urls(&["http://example.com/app.jar", "http://example.com/lib.jar"])
                .build(),
        );
        let catalog = EventCatalog::init(&settings);
        let executor = Arc::new(CountingExecutor {
            spawns: Mutex::new(0),
        });
        let replay = Arc::new(ReplayObserver::new(&catalog));
        let log = Arc::new(NameLog {
            names: Mutex::new(Vec::new()),
        });

        let bus = EventBus::new();
        bus.register(replay.clone());
        bus.register(Arc::new(FakeWorker {
            catalog: catalog.clone(),
        }));
        bus.register(Arc::new(TargetRuntimeRunner::new(
            settings,
            catalog.clone(),
            executor.clone(),
        )));
        bus.register(log.clone());

        let first = replay.pop_next().unwrap();
        bus.publish(first).await.unwrap();

        assert_eq!(*executor.spawns.lock().unwrap(), 1);
        assert_eq!(
            *log.names.lock().unwrap(),
            vec![
                EVENT_RUNTIME_DOWNLOAD_REQUEST.to_string(),
                EVENT_RUNTIME_DOWNLOADED.to_string(),
                EVENT_RUNTIME_UNZIP_REQUEST.to_string(),
                EVENT_RUNTIME_UNZIPPED.to_string(),
                "http://example.com/app.jar".to_string(),
                "http://example.com/app.jar".to_string(),
                "http://example.com/lib.jar".to_string(),
                "http://example.com/lib.jar".to_string(),
                EVENT_APP_STARTING.to_string(),
                EVENT_APP_STARTED.to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn completions_beyond_the_sequence_are_ignored() {
        let settings = Arc::new(SettingsBuilder::new().build());
        let catalog = EventCatalog::init(&settings);
        let replay = Arc::new(ReplayObserver::new(&catalog));
        while replay.pop_next().is_some() {}

        let bus = EventBus::new();
        bus.register(replay);

        bus.publish(catalog.runtime_downloaded()).await.unwrap();
        bus.publish(catalog.runtime_unzipped()).await.unwrap();
    }
}
