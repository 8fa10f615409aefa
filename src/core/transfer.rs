// ─── File Transfer ───
// HTTP fetch and archive extraction shared by both downloaders.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::core::error::{BootstrapError, BootstrapResult};

const USER_AGENT: &str = "Springboard/0.1.0";
const HTTP_TIMEOUT_SECS: u64 = 120;
pub const MIN_FREE_DISK_BYTES: u64 = 512 * 1024 * 1024;

/// Last path segment of a URL, or the URL itself when it has no slash.
pub fn filename_from_url(url: &str) -> &str {
    match url.rsplit_once('/') {
        Some((_, name)) => name,
        None => url,
    }
}

/// Path of the runtime launcher binary inside an unpacked runtime directory.
pub fn runtime_command_path(runtime_dir: &Path) -> PathBuf {
    runtime_dir.join("bin").join(runtime_exe())
}

fn runtime_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Streaming HTTP fetcher with a shared client.
pub struct FileTransfer {
    client: Client,
}

impl FileTransfer {
    pub fn new() -> BootstrapResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Download `url` to `dest`, creating parent directories as needed.
    /// The body is streamed to disk chunk by chunk; a non-success status is
    /// a fatal download failure.
    pub async fn download_to_file(&self, url: &str, dest: &Path) -> BootstrapResult<()> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| BootstrapError::io(parent, source))?;
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(BootstrapError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|source| BootstrapError::io(dest, source))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|source| BootstrapError::io(dest, source))?;
        }
        file.flush()
            .await
            .map_err(|source| BootstrapError::io(dest, source))?;

        debug!("Downloaded: {} -> {:?}", url, dest);
        Ok(())
    }
}

/// Extract a zip archive into `dest_dir`, preserving the entry layout.
/// Entry paths are sanitized via `enclosed_name` so a crafted archive cannot
/// escape the destination.
pub fn extract_zip(zip_path: &Path, dest_dir: &Path) -> BootstrapResult<()> {
    let zip_file =
        std::fs::File::open(zip_path).map_err(|source| BootstrapError::io(zip_path, source))?;
    let mut archive = zip::ZipArchive::new(zip_file)?;

    std::fs::create_dir_all(dest_dir).map_err(|source| BootstrapError::io(dest_dir, source))?;

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let rel_path = entry
            .enclosed_name()
            .ok_or_else(|| BootstrapError::Other("Invalid zip entry path".into()))?;
        let out_path = dest_dir.join(rel_path);

        if entry.name().ends_with('/') {
            std::fs::create_dir_all(&out_path)
                .map_err(|source| BootstrapError::io(&out_path, source))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|source| BootstrapError::io(parent, source))?;
        }

        let mut out = std::fs::File::create(&out_path)
            .map_err(|source| BootstrapError::io(&out_path, source))?;
        std::io::copy(&mut entry, &mut out)
            .map_err(|source| BootstrapError::io(&out_path, source))?;
    }

    info!("Extracted {:?} into {:?}", zip_path, dest_dir);
    Ok(())
}

/// Refuse to start a download or extraction when the disk holding `path`
/// is nearly full.
pub fn ensure_min_disk_space(path: &Path, minimum_bytes: u64) -> BootstrapResult<()> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut best_len = 0usize;
    let mut available = None;
    for disk in disks.list() {
        let mount = disk.mount_point();
        if canonical.starts_with(mount) {
            let len = mount.as_os_str().len();
            if len >= best_len {
                best_len = len;
                available = Some(disk.available_space());
            }
        }
    }
    if let Some(bytes) = available {
        if bytes < minimum_bytes {
            return Err(BootstrapError::Other(format!(
                "Not enough disk space at {:?}: available={} required={}",
                path, bytes, minimum_bytes
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn filename_is_last_url_segment() {
        assert_eq!(
            filename_from_url("http://example.com/dist/app.jar"),
            "app.jar"
        );
        assert_eq!(filename_from_url("app.jar"), "app.jar");
    }

    #[test]
    fn runtime_command_lives_under_bin() {
        let path = runtime_command_path(Path::new("/tmp/jre"));
        if cfg!(windows) {
            assert!(path.ends_with("bin/java.exe"));
        } else {
            assert!(path.ends_with("bin/java"));
        }
    }

    #[test]
    fn extract_zip_reproduces_entry_layout() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("runtime.zip");

        let file = std::fs::File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.add_directory("bin/", options).unwrap();
        writer.start_file("bin/java", options).unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        writer.start_file("release", options).unwrap();
        writer.write_all(b"JAVA_VERSION=1.8.0\n").unwrap();
        writer.finish().unwrap();

        let dest = dir.path().join("unpacked");
        extract_zip(&zip_path, &dest).unwrap();

        assert!(dest.join("bin/java").is_file());
        assert_eq!(
            std::fs::read_to_string(dest.join("release")).unwrap(),
            "JAVA_VERSION=1.8.0\n"
        );
    }
}
