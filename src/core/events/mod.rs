// ─── Progress Events ───
// The closed event set the bootstrap engine communicates with, plus the
// reentrancy-safe bus that delivers it and the catalog that defines the
// replay sequence.

pub mod bus;
pub mod catalog;

use std::hash::{Hash, Hasher};

/// Data attached to a completion event recording where a downloaded or
/// extracted artifact landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailPayload {
    RuntimeDownloaded { archive_path: String },
    RuntimeUnzipped { unpack_dir: String },
}

impl DetailPayload {
    /// The result path carried by the payload. May be empty when the step
    /// was skipped because the application runs on the current runtime.
    pub fn path(&self) -> &str {
        match self {
            DetailPayload::RuntimeDownloaded { archive_path } => archive_path,
            DetailPayload::RuntimeUnzipped { unpack_dir } => unpack_dir,
        }
    }
}

/// One event in the bootstrap pipeline.
///
/// Identity is the variant plus the name (or URL); message and detail are
/// excluded, so the same logical event can be raised many times with
/// different payloads and still compare equal for routing and replay
/// bookkeeping.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    Simple {
        name: &'static str,
        message: String,
        detail: Option<DetailPayload>,
    },
    DependencyDownloadRequest {
        url: String,
        message: String,
    },
    DependencyDownloadFinished {
        url: String,
        message: String,
    },
}

impl ProgressEvent {
    pub fn name(&self) -> &str {
        match self {
            ProgressEvent::Simple { name, .. } => name,
            ProgressEvent::DependencyDownloadRequest { url, .. } => url,
            ProgressEvent::DependencyDownloadFinished { url, .. } => url,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ProgressEvent::Simple { message, .. } => message,
            ProgressEvent::DependencyDownloadRequest { message, .. } => message,
            ProgressEvent::DependencyDownloadFinished { message, .. } => message,
        }
    }

    pub fn detail(&self) -> Option<&DetailPayload> {
        match self {
            ProgressEvent::Simple { detail, .. } => detail.as_ref(),
            _ => None,
        }
    }

    /// Attach a detail payload to a simple event. No-op for per-URL events,
    /// which carry their URL as identity instead.
    pub fn with_detail(mut self, payload: DetailPayload) -> Self {
        if let ProgressEvent::Simple { detail, .. } = &mut self {
            *detail = Some(payload);
        }
        self
    }
}

impl PartialEq for ProgressEvent {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ProgressEvent::Simple { name: a, .. }, ProgressEvent::Simple { name: b, .. }) => {
                a == b
            }
            (
                ProgressEvent::DependencyDownloadRequest { url: a, .. },
                ProgressEvent::DependencyDownloadRequest { url: b, .. },
            ) => a == b,
            (
                ProgressEvent::DependencyDownloadFinished { url: a, .. },
                ProgressEvent::DependencyDownloadFinished { url: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}

impl Eq for ProgressEvent {}

impl Hash for ProgressEvent {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        self.name().hash(state);
    }
}

impl std::fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name(), self.message())
    }
}
