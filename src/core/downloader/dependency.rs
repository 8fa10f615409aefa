use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::core::error::BootstrapResult;
use crate::core::events::bus::{EventBus, ProgressObserver};
use crate::core::events::catalog::EventCatalog;
use crate::core::events::ProgressEvent;
use crate::core::settings::GlobalSettings;
use crate::core::transfer::{self, FileTransfer, MIN_FREE_DISK_BYTES};

/// Fetches one application dependency per download request event, into the
/// per-run dependency directory, and reports each completed fetch so the
/// pipeline can advance to the next one.
pub struct DependencyDownloader {
    settings: Arc<GlobalSettings>,
    catalog: EventCatalog,
    transfer: FileTransfer,
}

impl DependencyDownloader {
    pub fn new(settings: Arc<GlobalSettings>, catalog: EventCatalog, transfer: FileTransfer) -> Self {
        Self {
            settings,
            catalog,
            transfer,
        }
    }

    async fn fetch(&self, url: &str, bus: &EventBus) -> BootstrapResult<()> {
        let dest = self.settings.dependency_destination(url);
        transfer::ensure_min_disk_space(self.settings.work_dir(), MIN_FREE_DISK_BYTES)?;
        self.transfer.download_to_file(url, &dest).await?;
        info!("Dependency ready: {:?}", dest);
        bus.publish(self.catalog.dependency_download_finished(url))
            .await
    }
}

#[async_trait]
impl ProgressObserver for DependencyDownloader {
    async fn update(&self, event: &ProgressEvent, bus: &EventBus) -> BootstrapResult<()> {
        match event {
            ProgressEvent::DependencyDownloadRequest { url, .. } => self.fetch(url, bus).await,
            _ => Ok(()),
        }
    }
}
