//! Streaming HTTP fetcher

use futures::StreamExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::config::InstallerConfig;
use crate::fs_ops::{best_effort, remove_file_if_exists};
use crate::fetch::{
    FetchCallback, FetchProgress,
    error::{FetchError, FileOperation, Result},
};

/// Downloads remote archives into local files
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    progress_interval: Duration,
    settle_delay: Duration,
}

impl Fetcher {
    pub fn new(config: &InstallerConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.fetch_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|source| FetchError::Client { source })?;

        Ok(Self {
            client,
            progress_interval: config.progress_interval,
            settle_delay: config.fetch_settle_delay,
        })
    }

    /// Fetch `url` into `dest_path`.
    ///
    /// `on_progress` is called at most once per progress interval while the
    /// body streams, then once more at 100% when the body is complete. The
    /// call returns only after the settle delay. On failure no partial file
    /// is left behind.
    pub async fn fetch(
        &self,
        url: &str,
        dest_path: &Path,
        on_progress: Option<FetchCallback>,
    ) -> Result<u64> {
        async move {
            url::Url::parse(url).map_err(|source| FetchError::InvalidUrl {
                url: url.to_string(),
                source,
            })?;

            if let Some(parent) = dest_path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| FetchError::file_system(parent, FileOperation::CreateDir, e))?;
            }

            let temp_path = partial_path(dest_path);
            let result = match self.stream_to_file(url, &temp_path, on_progress).await {
                Ok(size) => fs::rename(&temp_path, dest_path)
                    .await
                    .map(|()| size)
                    .map_err(|e| FetchError::file_system(dest_path, FileOperation::Move, e)),
                Err(e) => Err(e),
            };

            match result {
                Ok(size) => {
                    info!("Downloaded {} bytes to {}", size, dest_path.display());
                    if !self.settle_delay.is_zero() {
                        tokio::time::sleep(self.settle_delay).await;
                    }
                    Ok(size)
                }
                Err(e) => {
                    if e.is_recoverable() {
                        warn!("Download failed ({}), may succeed on a later run: {}", e.category(), e);
                    } else {
                        error!("Download failed ({}): {}", e.category(), e);
                    }
                    best_effort("partial download cleanup", remove_file_if_exists(&temp_path)).await;
                    best_effort("partial download cleanup", remove_file_if_exists(dest_path)).await;
                    Err(e)
                }
            }
        }
        .instrument(info_span!("fetch", url = %url))
        .await
    }

    async fn stream_to_file(
        &self,
        url: &str,
        temp_path: &Path,
        on_progress: Option<FetchCallback>,
    ) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::HttpRequest { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total_size = response.content_length();
        debug!("Content length: {:?}", total_size);

        let mut file = fs::File::create(temp_path)
            .await
            .map_err(|e| FetchError::file_system(temp_path, FileOperation::Create, e))?;

        let mut stream = response.bytes_stream();
        let mut downloaded = 0u64;
        let start_time = Instant::now();
        let mut last_progress_time = start_time;

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result
                .map_err(|source| FetchError::HttpRequest { url: url.to_string(), source })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| FetchError::file_system(temp_path, FileOperation::Write, e))?;
            downloaded += chunk.len() as u64;

            let now = Instant::now();
            if now.duration_since(last_progress_time) >= self.progress_interval {
                if let Some(ref callback) = on_progress {
                    callback(FetchProgress::new(downloaded, total_size, now.duration_since(start_time)));
                }
                last_progress_time = now;
            }
        }

        file.flush()
            .await
            .map_err(|e| FetchError::file_system(temp_path, FileOperation::Write, e))?;
        file.sync_all()
            .await
            .map_err(|e| FetchError::file_system(temp_path, FileOperation::Write, e))?;
        drop(file);

        if let Some(ref callback) = on_progress {
            callback(FetchProgress::finished(downloaded, total_size, start_time.elapsed()));
        }

        Ok(downloaded)
    }
}

/// Sibling path receiving the body until it is complete
fn partial_path(dest_path: &Path) -> PathBuf {
    let mut name = dest_path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".part");
    dest_path.with_file_name(name)
}

/// Staging file name for `url`: its last non-empty path segment
pub fn file_name_from_url(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;

    let name = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(String::from)
        .unwrap_or_else(|| "downloaded_file".to_string());
    Ok(name)
}
