use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::core::cache::CacheStatus;
use crate::core::error::{BootstrapError, BootstrapResult};
use crate::core::events::bus::{EventBus, ProgressObserver};
use crate::core::events::catalog::{
    EventCatalog, EVENT_RUNTIME_DOWNLOADED, EVENT_RUNTIME_DOWNLOAD_REQUEST,
    EVENT_RUNTIME_UNZIP_REQUEST,
};
use crate::core::events::{DetailPayload, ProgressEvent};
use crate::core::runner::command::CommandFactory;
use crate::core::runner::exec::CommandExecutor;
use crate::core::settings::GlobalSettings;
use crate::core::transfer::{self, FileTransfer, MIN_FREE_DISK_BYTES};

/// Materializes the target runtime: downloads the archive on the download
/// request and unpacks it on the unzip request, publishing a completion
/// event with the result path after each step.
///
/// Prior results are honored. A cached archive that still exists on disk
/// skips the download; a cached unpack directory is reused only when its
/// launcher binary still runs (exit code 0 on a version probe).
///
/// When the run launches on the installed runtime, `fetch_runtime` is off:
/// both steps do no work but still publish their completion events so the
/// pipeline advances.
pub struct RuntimeDownloader {
    settings: Arc<GlobalSettings>,
    catalog: EventCatalog,
    transfer: FileTransfer,
    executor: Arc<dyn CommandExecutor>,
    fetch_runtime: bool,
    cache: CacheStatus,
    archive_path: Mutex<Option<PathBuf>>,
}

impl RuntimeDownloader {
    pub fn new(
        settings: Arc<GlobalSettings>,
        catalog: EventCatalog,
        transfer: FileTransfer,
        executor: Arc<dyn CommandExecutor>,
        fetch_runtime: bool,
        cache: CacheStatus,
    ) -> Self {
        Self {
            settings,
            catalog,
            transfer,
            executor,
            fetch_runtime,
            cache,
            archive_path: Mutex::new(None),
        }
    }

    async fn download(&self, bus: &EventBus) -> BootstrapResult<()> {
        if !self.fetch_runtime {
            debug!("Launching on installed runtime, runtime download skipped");
            return bus.publish(self.catalog.runtime_downloaded()).await;
        }

        let version = self.settings.target_runtime_version();
        let archive = match self.cache.downloaded_path(version) {
            Some(cached) if Path::new(cached).is_file() => {
                info!("Reusing cached runtime archive: {}", cached);
                PathBuf::from(cached)
            }
            _ => {
                let dest = self.settings.runtime_archive_path();
                transfer::ensure_min_disk_space(self.settings.work_dir(), MIN_FREE_DISK_BYTES)?;
                self.transfer
                    .download_to_file(self.settings.runtime_url(), &dest)
                    .await?;
                dest
            }
        };

        let event = self
            .catalog
            .runtime_downloaded()
            .with_detail(DetailPayload::RuntimeDownloaded {
                archive_path: archive.to_string_lossy().to_string(),
            });
        bus.publish(event).await
    }

    async fn unzip(&self, bus: &EventBus) -> BootstrapResult<()> {
        if !self.fetch_runtime {
            debug!("Launching on installed runtime, runtime unzip skipped");
            return bus.publish(self.catalog.runtime_unzipped()).await;
        }

        let version = self.settings.target_runtime_version();
        let unpack_dir = match self.cache.unzipped_path(version) {
            Some(cached) if self.probe_runtime(Path::new(cached)).await => {
                info!("Reusing cached unpacked runtime: {}", cached);
                PathBuf::from(cached)
            }
            _ => self.extract_archive().await?,
        };

        let event = self
            .catalog
            .runtime_unzipped()
            .with_detail(DetailPayload::RuntimeUnzipped {
                unpack_dir: unpack_dir.to_string_lossy().to_string(),
            });
        bus.publish(event).await
    }

    /// A cached unpack directory counts only if its launcher still runs.
    /// A probe failure is not fatal; it just forces a fresh extraction.
    async fn probe_runtime(&self, runtime_dir: &Path) -> bool {
        let probe = CommandFactory.version_probe_command(runtime_dir);
        match self.executor.exit_code(&probe).await {
            Ok(0) => true,
            Ok(code) => {
                debug!("Cached runtime probe exited with {}", code);
                false
            }
            Err(err) => {
                debug!("Cached runtime probe failed: {}", err);
                false
            }
        }
    }

    async fn extract_archive(&self) -> BootstrapResult<PathBuf> {
        let archive = self
            .archive_path
            .lock()
            .expect("archive path lock poisoned")
            .clone()
            .unwrap_or_else(|| self.settings.runtime_archive_path());
        let dest = self.settings.runtime_unzip_dir();

        transfer::ensure_min_disk_space(self.settings.work_dir(), MIN_FREE_DISK_BYTES)?;
        let zip_path = archive.clone();
        let dest_dir = dest.clone();
        tokio::task::spawn_blocking(move || transfer::extract_zip(&zip_path, &dest_dir))
            .await
            .map_err(|err| BootstrapError::Other(format!("unzip task failed: {}", err)))??;
        Ok(dest)
    }
}

#[async_trait]
impl ProgressObserver for RuntimeDownloader {
    async fn update(&self, event: &ProgressEvent, bus: &EventBus) -> BootstrapResult<()> {
        match event.name() {
            EVENT_RUNTIME_DOWNLOAD_REQUEST => self.download(bus).await,
            EVENT_RUNTIME_DOWNLOADED => {
                // Remember where the archive landed for the unzip step.
                if let Some(detail) = event.detail() {
                    if !detail.path().trim().is_empty() {
                        *self.archive_path.lock().expect("archive path lock poisoned") =
                            Some(PathBuf::from(detail.path()));
                    }
                }
                Ok(())
            }
            EVENT_RUNTIME_UNZIP_REQUEST => self.unzip(bus).await,
            _ => Ok(()),
        }
    }
}
