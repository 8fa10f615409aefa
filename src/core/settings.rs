use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Deserialize;

use crate::core::error::{BootstrapError, BootstrapResult};
use crate::core::transfer;

/// Read-only configuration surface for one bootstrap run.
///
/// The host delivery environment resolves these values; the engine only
/// consumes them. Loaded from a JSON file by the binary.
///
/// Work-directory artifacts are stamped with a per-run session timestamp so
/// concurrent runs do not trample each other's unzip and dependency dirs;
/// the downloaded runtime archive keeps a stable name so the cache can skip
/// the fetch on the next run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    target_runtime_version: String,
    current_runtime_version: String,
    /// Directory of the installed runtime, used by the current-runtime
    /// strategy (`<home>/bin/java` must exist there).
    current_runtime_home: String,
    runtime_url: String,
    dependency_urls: Vec<String>,
    work_dir: PathBuf,
    cache_path: PathBuf,
    path_separator: String,
    initial_heap_size: String,
    max_heap_size: String,
    /// Whitespace-separated extra VM arguments.
    vm_args: String,
    /// `-D` property tokens forwarded verbatim to the target VM.
    properties: Vec<String>,
    main_class: String,
    application_arguments: Vec<String>,
    os_name: String,
    always_fetch_runtime: bool,
    close_on_end: bool,
    #[serde(skip)]
    session_stamp: i64,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            target_runtime_version: String::new(),
            current_runtime_version: String::new(),
            current_runtime_home: String::new(),
            runtime_url: String::new(),
            dependency_urls: Vec::new(),
            work_dir: PathBuf::new(),
            cache_path: PathBuf::new(),
            path_separator: default_path_separator().to_string(),
            initial_heap_size: String::new(),
            max_heap_size: String::new(),
            vm_args: String::new(),
            properties: Vec::new(),
            main_class: String::new(),
            application_arguments: Vec::new(),
            os_name: std::env::consts::OS.to_string(),
            always_fetch_runtime: false,
            close_on_end: false,
            session_stamp: Utc::now().timestamp(),
        }
    }
}

fn default_path_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}

impl GlobalSettings {
    pub fn from_json_file(path: &Path) -> BootstrapResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| BootstrapError::io(path, source))?;
        let mut settings: GlobalSettings = serde_json::from_slice(&bytes)?;
        settings.session_stamp = Utc::now().timestamp();
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> BootstrapResult<()> {
        if self.work_dir.as_os_str().is_empty() {
            return Err(BootstrapError::Configuration(
                "work_dir is not defined".into(),
            ));
        }
        if self.main_class.trim().is_empty() {
            return Err(BootstrapError::Configuration(
                "main_class is not defined".into(),
            ));
        }
        if self.runtime_url.trim().is_empty() {
            return Err(BootstrapError::Configuration(
                "runtime_url is not defined".into(),
            ));
        }
        Ok(())
    }

    pub fn target_runtime_version(&self) -> &str {
        &self.target_runtime_version
    }

    pub fn current_runtime_version(&self) -> &str {
        &self.current_runtime_version
    }

    pub fn current_runtime_home(&self) -> &str {
        &self.current_runtime_home
    }

    pub fn runtime_url(&self) -> &str {
        &self.runtime_url
    }

    pub fn dependency_urls(&self) -> &[String] {
        &self.dependency_urls
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn cache_path(&self) -> PathBuf {
        if self.cache_path.as_os_str().is_empty() {
            self.work_dir.join("springboard-cache.json")
        } else {
            self.cache_path.clone()
        }
    }

    /// Destination for the fetched runtime archive: the URL basename under
    /// the work directory. Stable across runs so the cache can reuse it.
    pub fn runtime_archive_path(&self) -> PathBuf {
        self.work_dir
            .join(transfer::filename_from_url(&self.runtime_url))
    }

    /// Directory the runtime archive is extracted into, unique per run.
    pub fn runtime_unzip_dir(&self) -> PathBuf {
        let filename = transfer::filename_from_url(&self.runtime_url);
        let stem = filename.rsplit_once('.').map(|(s, _)| s).unwrap_or(filename);
        self.work_dir
            .join(format!("{}_{}", stem, self.session_stamp))
    }

    /// Directory the dependency archives are fetched into, unique per run.
    pub fn dependency_dir(&self) -> PathBuf {
        self.work_dir
            .join(format!("springboard_{}", self.session_stamp))
    }

    pub fn dependency_destination(&self, url: &str) -> PathBuf {
        self.dependency_dir().join(transfer::filename_from_url(url))
    }

    /// All dependency destinations joined with the classpath separator.
    pub fn classpath_text(&self) -> String {
        self.dependency_urls
            .iter()
            .map(|url| self.dependency_destination(url).to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(&self.path_separator)
    }

    pub fn path_separator(&self) -> &str {
        &self.path_separator
    }

    /// `-Xms` flag token, or an empty string when no initial heap size is
    /// configured (blank tokens are stripped during command assembly).
    pub fn initial_heap_flag(&self) -> String {
        if self.initial_heap_size.trim().is_empty() {
            String::new()
        } else {
            format!("-Xms{}", self.initial_heap_size)
        }
    }

    pub fn max_heap_flag(&self) -> String {
        if self.max_heap_size.trim().is_empty() {
            String::new()
        } else {
            format!("-Xmx{}", self.max_heap_size)
        }
    }

    pub fn vm_args_list(&self) -> Vec<String> {
        self.vm_args
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    pub fn main_class(&self) -> &str {
        &self.main_class
    }

    pub fn application_arguments(&self) -> &[String] {
        &self.application_arguments
    }

    pub fn os_name(&self) -> &str {
        &self.os_name
    }

    pub fn is_macos(&self) -> bool {
        self.os_name == "macos" || self.os_name.starts_with("Mac")
    }

    pub fn always_fetch_runtime(&self) -> bool {
        self.always_fetch_runtime
    }

    pub fn close_on_end(&self) -> bool {
        self.close_on_end
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;

    pub struct SettingsBuilder {
        settings: GlobalSettings,
    }

    impl SettingsBuilder {
        pub fn new() -> Self {
            let mut settings = GlobalSettings::default();
            settings.work_dir = PathBuf::from("/tmp/springboard-test");
            settings.main_class = "com.example.Main".to_string();
            settings.session_stamp = 1700000000;
            Self { settings }
        }

        pub fn target_version(mut self, version: &str) -> Self {
            self.settings.target_runtime_version = version.to_string();
            self
        }

        pub fn current_version(mut self, version: &str) -> Self {
            self.settings.current_runtime_version = version.to_string();
            self
        }

        pub fn runtime_url(mut self, url: &str) -> Self {
            self.settings.runtime_url = url.to_string();
            self
        }

        pub fn dependency_urls(mut self, urls: &[&str]) -> Self {
            self.settings.dependency_urls = urls.iter().map(|u| u.to_string()).collect();
            self
        }

        pub fn work_dir(mut self, dir: &Path) -> Self {
            self.settings.work_dir = dir.to_path_buf();
            self
        }

        pub fn initial_heap_size(mut self, size: &str) -> Self {
            self.settings.initial_heap_size = size.to_string();
            self
        }

        pub fn max_heap_size(mut self, size: &str) -> Self {
            self.settings.max_heap_size = size.to_string();
            self
        }

        pub fn vm_args(mut self, args: &str) -> Self {
            self.settings.vm_args = args.to_string();
            self
        }

        pub fn properties(mut self, props: &[&str]) -> Self {
            self.settings.properties = props.iter().map(|p| p.to_string()).collect();
            self
        }

        pub fn application_arguments(mut self, args: &[&str]) -> Self {
            self.settings.application_arguments = args.iter().map(|a| a.to_string()).collect();
            self
        }

        pub fn path_separator(mut self, sep: &str) -> Self {
            self.settings.path_separator = sep.to_string();
            self
        }

        pub fn os_name(mut self, name: &str) -> Self {
            self.settings.os_name = name.to_string();
            self
        }

        pub fn always_fetch_runtime(mut self, flag: bool) -> Self {
            self.settings.always_fetch_runtime = flag;
            self
        }

        pub fn close_on_end(mut self, flag: bool) -> Self {
            self.settings.close_on_end = flag;
            self
        }

        pub fn current_runtime_home(mut self, home: &str) -> Self {
            self.settings.current_runtime_home = home.to_string();
            self
        }

        pub fn build(self) -> GlobalSettings {
            self.settings
        }
    }

    pub fn settings_with_dependencies(urls: &[&str]) -> GlobalSettings {
        SettingsBuilder::new()
            .target_version("1.8.0")
            .current_version("1.8.0")
            .runtime_url("http://example.com/runtime/jre-1.8.0.zip")
            .dependency_urls(urls)
            .build()
    }
}
