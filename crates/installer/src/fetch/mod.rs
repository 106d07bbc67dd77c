//! Remote archive fetching
//!
//! Streams archives over HTTP(S) into a staging directory with throttled
//! progress reporting, and combines the progress of concurrent downloads
//! into a single figure:
//! - `http`: the streaming fetcher
//! - `aggregate`: combined progress across concurrent fetches
//! - `error`: fetch error types

pub mod aggregate;
pub mod error;
pub mod http;

pub use aggregate::{AggregateProgress, DownloadAggregator};
pub use error::{FetchError, FileOperation, Result};
pub use http::{Fetcher, file_name_from_url};

use std::sync::Arc;
use std::time::Duration;

/// Progress callback for a single fetch
pub type FetchCallback = Arc<dyn Fn(FetchProgress) + Send + Sync>;

/// Snapshot of one in-flight download
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchProgress {
    pub downloaded_bytes: u64,
    /// `None` when the server did not send a content length
    pub total_bytes: Option<u64>,
    /// 0.0..=100.0, 0.0 while the total is unknown
    pub percentage: f64,
    pub speed_bps: f64,
    pub elapsed: Duration,
}

impl FetchProgress {
    pub fn new(downloaded_bytes: u64, total_bytes: Option<u64>, elapsed: Duration) -> Self {
        let percentage = match total_bytes {
            Some(total) if total > 0 => (downloaded_bytes as f64 / total as f64 * 100.0).min(100.0),
            _ => 0.0,
        };
        let secs = elapsed.as_secs_f64();
        let speed_bps = if secs > 0.0 { downloaded_bytes as f64 / secs } else { 0.0 };

        Self {
            downloaded_bytes,
            total_bytes,
            percentage,
            speed_bps,
            elapsed,
        }
    }

    /// Final snapshot of a completed download, always at 100%
    pub fn finished(downloaded_bytes: u64, total_bytes: Option<u64>, elapsed: Duration) -> Self {
        Self {
            total_bytes: Some(total_bytes.unwrap_or(downloaded_bytes)),
            percentage: 100.0,
            ..Self::new(downloaded_bytes, total_bytes, elapsed)
        }
    }

    pub fn is_finished(&self) -> bool {
        self.percentage >= 100.0
    }
}

#[cfg(test)]
mod tests;
