use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::core::cache::{CacheStore, StatusKind, StatusRecord};
use crate::core::error::BootstrapResult;
use crate::core::events::bus::{EventBus, ProgressObserver};
use crate::core::events::catalog::{EVENT_RUNTIME_DOWNLOADED, EVENT_RUNTIME_UNZIPPED};
use crate::core::events::ProgressEvent;
use crate::core::settings::GlobalSettings;

/// Persists a status record immediately after each successful runtime
/// download or unzip, so a later run can skip the step. Completion events
/// with a blank result path (current-runtime strategy) are not recorded.
pub struct CacheObserver {
    settings: Arc<GlobalSettings>,
    store: CacheStore,
}

impl CacheObserver {
    pub fn new(settings: Arc<GlobalSettings>, store: CacheStore) -> Self {
        Self { settings, store }
    }

    fn record_result(&self, kind: StatusKind, event: &ProgressEvent) {
        let Some(detail) = event.detail() else {
            return;
        };
        let path = detail.path();
        if path.trim().is_empty() {
            return;
        }
        debug!("Caching {:?} result for {}: {}", kind, event.name(), path);
        self.store.record(
            &self.settings.cache_path(),
            StatusRecord::new(kind, self.settings.target_runtime_version(), path),
        );
    }
}

#[async_trait]
impl ProgressObserver for CacheObserver {
    async fn update(&self, event: &ProgressEvent, _bus: &EventBus) -> BootstrapResult<()> {
        match event.name() {
            EVENT_RUNTIME_DOWNLOADED => self.record_result(StatusKind::Downloaded, event),
            EVENT_RUNTIME_UNZIPPED => self.record_result(StatusKind::Unzipped, event),
            _ => {}
        }
        Ok(())
    }
}
