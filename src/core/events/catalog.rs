use crate::core::events::ProgressEvent;
use crate::core::settings::GlobalSettings;
use crate::core::transfer;

pub const EVENT_RUNTIME_DOWNLOAD_REQUEST: &str = "runtime-download-request";
pub const EVENT_RUNTIME_DOWNLOADED: &str = "runtime-downloaded";
pub const EVENT_RUNTIME_UNZIP_REQUEST: &str = "runtime-unzip-request";
pub const EVENT_RUNTIME_UNZIPPED: &str = "runtime-unzipped";
pub const EVENT_APP_STARTING: &str = "app-starting";
pub const EVENT_APP_STARTED: &str = "app-started";

/// Defines the canonical event set and the ordered replay sequence for one
/// bootstrap run. Build it from settings before anything is published.
///
/// The sequence ordering is a hard pipeline constraint: the runtime must be
/// ready before dependencies are fetched, and dependencies must be ready
/// before the application starts.
#[derive(Debug, Clone)]
pub struct EventCatalog {
    dependency_urls: Vec<String>,
}

impl EventCatalog {
    pub fn init(settings: &GlobalSettings) -> Self {
        Self {
            dependency_urls: settings.dependency_urls().to_vec(),
        }
    }

    /// The ordered list of request events the orchestrator advances through,
    /// one per completed step.
    pub fn replay_sequence(&self) -> Vec<ProgressEvent> {
        let mut sequence = vec![self.runtime_download_request(), self.runtime_unzip_request()];
        for url in &self.dependency_urls {
            sequence.push(self.dependency_download_request(url));
        }
        sequence.push(self.app_starting());
        sequence
    }

    pub fn runtime_download_request(&self) -> ProgressEvent {
        simple(EVENT_RUNTIME_DOWNLOAD_REQUEST, "Runtime download...")
    }

    pub fn runtime_downloaded(&self) -> ProgressEvent {
        simple(EVENT_RUNTIME_DOWNLOADED, "Runtime download finished")
    }

    pub fn runtime_unzip_request(&self) -> ProgressEvent {
        simple(EVENT_RUNTIME_UNZIP_REQUEST, "Runtime unzip...")
    }

    pub fn runtime_unzipped(&self) -> ProgressEvent {
        simple(EVENT_RUNTIME_UNZIPPED, "Runtime unzip finished")
    }

    pub fn app_starting(&self) -> ProgressEvent {
        simple(EVENT_APP_STARTING, "Starting application")
    }

    pub fn app_started(&self) -> ProgressEvent {
        simple(EVENT_APP_STARTED, "Application is started")
    }

    pub fn dependency_download_request(&self, url: &str) -> ProgressEvent {
        ProgressEvent::DependencyDownloadRequest {
            url: url.to_string(),
            message: format!("Download of {}", transfer::filename_from_url(url)),
        }
    }

    pub fn dependency_download_finished(&self, url: &str) -> ProgressEvent {
        ProgressEvent::DependencyDownloadFinished {
            url: url.to_string(),
            message: format!("Download of {} finished", transfer::filename_from_url(url)),
        }
    }
}

fn simple(name: &'static str, message: &str) -> ProgressEvent {
    ProgressEvent::Simple {
        name,
        message: message.to_string(),
        detail: None,
    }
}
