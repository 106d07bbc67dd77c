//! Configuration types for the installer

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::assets::default_asset_roots;
use crate::extract::{ToolCandidate, ToolKind, default_candidates, fallback_commands};
use crate::layout::AssetSubject;

const RELEASE_BASE_URL: &str =
    "https://github.com/EcosDelDoblaje/LiesOfP-Doblaje/releases/download/v1.2.0";

/// A remote archive, possibly split into several volumes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteArchive {
    pub subject: AssetSubject,
    /// Part URLs in volume order. The first part is the one handed to the
    /// extractor; the tools pick up the remaining volumes next to it.
    pub parts: Vec<String>,
}

impl RemoteArchive {
    pub fn single<S: Into<String>>(subject: AssetSubject, url: S) -> Self {
        Self { subject, parts: vec![url.into()] }
    }

    pub fn split<I, S>(subject: AssetSubject, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subject,
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_split(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Configuration for install and uninstall runs
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    /// Archives fetched during install, one per overlaid movie directory
    pub archives: Vec<RemoteArchive>,
    pub user_agent: String,
    /// Whole-request timeout for a single archive download
    pub fetch_timeout: Duration,
    /// Minimum time between two progress callbacks of one download
    pub progress_interval: Duration,
    /// Pause after a download finishes so the OS releases the file handle
    pub fetch_settle_delay: Duration,
    /// Pause after every download of a run has finished
    pub download_settle_delay: Duration,
    pub extract_timeout: Duration,
    /// Cap on captured stdout/stderr per extraction tool invocation
    pub extract_output_limit: usize,
    /// Asset search roots, probed in order
    pub asset_roots: Vec<PathBuf>,
    /// Ranked extraction tools, probed in order
    pub tool_candidates: Vec<ToolCandidate>,
    /// Bare commands tried once every ranked candidate failed
    pub fallback_commands: Vec<ToolCandidate>,
    /// Pause after each progress step so a UI can render it
    pub step_delay: Duration,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            archives: default_archives(),
            user_agent: format!("EcosDelDoblaje-Installer/{}", env!("CARGO_PKG_VERSION")),
            fetch_timeout: Duration::from_secs(600), // 10 minutes, archives are large
            progress_interval: Duration::from_secs(2),
            fetch_settle_delay: Duration::from_millis(500),
            download_settle_delay: Duration::from_secs(1),
            extract_timeout: Duration::from_secs(600),
            extract_output_limit: 64 * 1024 * 1024, // 64MB
            asset_roots: default_asset_roots(),
            tool_candidates: default_candidates(),
            fallback_commands: fallback_commands(),
            step_delay: Duration::ZERO,
        }
    }
}

impl InstallerConfig {
    /// Default configuration with overrides from the environment.
    ///
    /// A `.env` file in the working directory is loaded first when present.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenv::dotenv() {
            debug!("Loaded environment from {}", path.display());
        }

        let mut config = Self::default();

        if let Ok(urls) = env::var("ECOS_CINEMATIC_URLS") {
            let parts: Vec<String> = urls
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(String::from)
                .collect();
            if !parts.is_empty() {
                config.set_archive(RemoteArchive::split(AssetSubject::Cinematic, parts));
            }
        }

        if let Ok(url) = env::var("ECOS_SPLASH_URL") {
            if !url.trim().is_empty() {
                config.set_archive(RemoteArchive::single(AssetSubject::Splash, url.trim()));
            }
        }

        if let Ok(dir) = env::var("ECOS_ASSETS_DIR") {
            config.asset_roots.insert(0, PathBuf::from(dir));
        }

        if let Ok(tool) = env::var("ECOS_SEVENZIP") {
            config
                .tool_candidates
                .insert(0, ToolCandidate::new(ToolKind::SevenZip, tool));
        }

        if let Ok(secs) = env::var("ECOS_FETCH_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) => config.fetch_timeout = Duration::from_secs(secs),
                Err(e) => warn!("Ignoring ECOS_FETCH_TIMEOUT_SECS={}: {}", secs, e),
            }
        }

        config
    }

    /// Replace the archive for `archive.subject`, or add it
    pub fn set_archive(&mut self, archive: RemoteArchive) {
        match self.archives.iter_mut().find(|a| a.subject == archive.subject) {
            Some(existing) => *existing = archive,
            None => self.archives.push(archive),
        }
    }

    pub fn with_archives(mut self, archives: Vec<RemoteArchive>) -> Self {
        self.archives = archives;
        self
    }

    pub fn with_asset_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.asset_roots = roots;
        self
    }

    pub fn with_tool_candidates(mut self, candidates: Vec<ToolCandidate>) -> Self {
        self.tool_candidates = candidates;
        self
    }

    pub fn with_fallback_commands(mut self, commands: Vec<ToolCandidate>) -> Self {
        self.fallback_commands = commands;
        self
    }

    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Drop every settle delay and pacing pause
    pub fn without_delays(mut self) -> Self {
        self.fetch_settle_delay = Duration::ZERO;
        self.download_settle_delay = Duration::ZERO;
        self.step_delay = Duration::ZERO;
        self
    }
}

fn default_archives() -> Vec<RemoteArchive> {
    vec![
        RemoteArchive::split(
            AssetSubject::Cinematic,
            [
                format!("{RELEASE_BASE_URL}/Cinematicas.7z.001"),
                format!("{RELEASE_BASE_URL}/Cinematicas.7z.002"),
            ],
        ),
        RemoteArchive::single(AssetSubject::Splash, format!("{RELEASE_BASE_URL}/Splash.7z")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_covers_both_subjects() {
        let config = InstallerConfig::default();
        assert_eq!(config.archives.len(), 2);
        assert!(config.archives.iter().any(|a| a.subject == AssetSubject::Cinematic && a.is_split()));
        assert!(config.archives.iter().any(|a| a.subject == AssetSubject::Splash && !a.is_split()));
        assert_eq!(config.progress_interval, Duration::from_secs(2));
        assert!(config.fetch_timeout >= Duration::from_secs(60));
    }

    #[test]
    fn test_set_archive_replaces_by_subject() {
        let mut config = InstallerConfig::default();
        config.set_archive(RemoteArchive::single(AssetSubject::Splash, "http://localhost/s.7z"));

        assert_eq!(config.archives.len(), 2);
        let splash = config.archives.iter().find(|a| a.subject == AssetSubject::Splash).unwrap();
        assert_eq!(splash.parts, vec!["http://localhost/s.7z".to_string()]);
    }

    #[test]
    fn test_without_delays() {
        let config = InstallerConfig::default()
            .with_step_delay(Duration::from_millis(500))
            .without_delays();
        assert_eq!(config.step_delay, Duration::ZERO);
        assert_eq!(config.fetch_settle_delay, Duration::ZERO);
        assert_eq!(config.download_settle_delay, Duration::ZERO);
    }
}
