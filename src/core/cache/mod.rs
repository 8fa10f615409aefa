// ─── Cache Storage ───
// Disk-backed record of prior download/unzip results, keyed by
// (step kind, runtime version). Used to skip redundant work across runs.

pub mod observer;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Downloaded,
    Unzipped,
}

/// A cached `(kind, version) -> path` mapping. Identity is the key only;
/// the path is payload and gets replaced on upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusRecord {
    pub kind: StatusKind,
    pub version: String,
    pub path: String,
}

impl StatusRecord {
    pub fn new(kind: StatusKind, version: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind,
            version: version.into(),
            path: path.into(),
        }
    }
}

impl PartialEq for StatusRecord {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.version == other.version
    }
}

impl Eq for StatusRecord {}

impl std::hash::Hash for StatusRecord {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.version.hash(state);
    }
}

/// The full cache: at most one record per `(kind, version)` key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheStatus {
    records: Vec<StatusRecord>,
}

impl CacheStatus {
    /// Insert a record, replacing any stored record with the same key.
    pub fn upsert(&mut self, record: StatusRecord) {
        self.records.retain(|existing| existing != &record);
        self.records.push(record);
    }

    pub fn downloaded_path(&self, version: &str) -> Option<&str> {
        self.path_for(StatusKind::Downloaded, version)
    }

    pub fn unzipped_path(&self, version: &str) -> Option<&str> {
        self.path_for(StatusKind::Unzipped, version)
    }

    fn path_for(&self, kind: StatusKind, version: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|record| record.kind == kind && record.version == version)
            .map(|record| record.path.as_str())
    }

    pub fn records(&self) -> &[StatusRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads and persists the cache file. A broken cache never aborts the
/// bootstrap: loads fall back to empty, saves are logged and swallowed.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStore;

impl CacheStore {
    pub fn load(&self, path: &Path) -> CacheStatus {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!("No readable cache at {:?}: {}", path, err);
                return CacheStatus::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(status) => status,
            Err(err) => {
                warn!("Discarding corrupt cache at {:?}: {}", path, err);
                CacheStatus::default()
            }
        }
    }

    pub fn save(&self, status: &CacheStatus, path: &Path) {
        let payload = match serde_json::to_vec_pretty(status) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("Failed to serialize cache: {}", err);
                return;
            }
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!("Failed to create cache directory {:?}: {}", parent, err);
                return;
            }
        }
        if let Err(err) = std::fs::write(path, payload) {
            warn!("Failed to write cache to {:?}: {}", path, err);
        }
    }

    /// Load-modify-save for a single record, synchronously on every
    /// mutation. Never batched, so a crash mid-bootstrap keeps every step
    /// already completed.
    pub fn record(&self, path: &Path, record: StatusRecord) {
        let mut status = self.load(path);
        status.upsert(record);
        self.save(&status, path);
    }
}
