use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the bootstrap engine.
/// Every module returns `Result<T, BootstrapError>`.
///
/// Cache failures and cached-runtime probe failures never appear here: both
/// are recovered locally (empty cache / re-extraction) and only logged.
#[derive(Debug, Error)]
pub enum BootstrapError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Configuration ───────────────────────────────────
    #[error("Configuration error: {0}")]
    Configuration(String),

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}. Please try again.")]
    DownloadFailed { url: String, status: u16 },

    // ── Archive ─────────────────────────────────────────
    #[error("Archive extraction error: {0}")]
    Extraction(#[from] zip::result::ZipError),

    // ── Process ─────────────────────────────────────────
    #[error("Failed to start command [{command}]: {source}")]
    ProcessSpawn {
        command: String,
        source: std::io::Error,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

impl BootstrapError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BootstrapError::Io {
            path: path.into(),
            source,
        }
    }
}
