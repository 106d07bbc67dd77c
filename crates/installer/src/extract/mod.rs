//! Archive extraction through a ranked chain of external tools
//!
//! Every candidate is a `(kind, program)` pair; the kind selects the command
//! line template. Candidates are tried in order and the first successful run
//! wins. Path candidates that do not exist are skipped without counting as a
//! failure. Once the ranked list is exhausted a fixed round of bare commands,
//! resolved through `PATH`, gets one more chance.

pub mod error;
pub mod runner;
pub mod tools;

pub use error::{ExtractError, Result};
pub use runner::{ProcessRunner, TokioProcessRunner, ToolOutput};
pub use tools::{ToolCandidate, ToolKind, default_candidates, fallback_commands};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::config::InstallerConfig;

/// The tool that extracted an archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub tool: ToolKind,
    pub program: PathBuf,
}

pub struct ArchiveExtractor {
    candidates: Vec<ToolCandidate>,
    fallbacks: Vec<ToolCandidate>,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
}

impl ArchiveExtractor {
    pub fn new(config: &InstallerConfig) -> Self {
        Self {
            candidates: config.tool_candidates.clone(),
            fallbacks: config.fallback_commands.clone(),
            runner: Arc::new(TokioProcessRunner::new(config.extract_output_limit)),
            timeout: config.extract_timeout,
        }
    }

    /// Replace the process runner, e.g. with a scripted one in tests
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn candidates(&self) -> &[ToolCandidate] {
        &self.candidates
    }

    /// Extract `archive` into `dest`, creating `dest` if needed
    pub async fn extract(&self, archive: &Path, dest: &Path) -> Result<Extraction> {
        async move {
            check_readable(archive).await?;

            tokio::fs::create_dir_all(dest)
                .await
                .map_err(|source| ExtractError::CreateDestination {
                    path: dest.to_path_buf(),
                    source,
                })?;

            let mut attempts = 0;
            let mut last_error: Option<String> = None;
            let mut in_fallback = false;

            let ranked = self.candidates.iter().map(|c| (c, false));
            let fallback = self.fallbacks.iter().map(|c| (c, true));

            for (candidate, is_fallback) in ranked.chain(fallback) {
                if !candidate.is_available() {
                    debug!("Skipping missing tool {}", candidate.program.display());
                    continue;
                }
                if is_fallback && !in_fallback {
                    in_fallback = true;
                    info!("Ranked extraction tools exhausted after {} attempts, trying bare commands", attempts);
                }

                attempts += 1;
                match self.try_candidate(candidate, archive, dest).await {
                    Ok(()) => {
                        info!(
                            "Extracted {} with {} ({})",
                            archive.display(),
                            candidate.kind,
                            candidate.program.display()
                        );
                        return Ok(Extraction {
                            tool: candidate.kind,
                            program: candidate.program.clone(),
                        });
                    }
                    Err(message) => {
                        warn!("{} failed: {}", candidate.program.display(), message);
                        last_error = Some(message);
                    }
                }
            }

            Err(ExtractError::Exhausted {
                archive: archive.to_path_buf(),
                attempts,
                last_error: last_error.unwrap_or_else(|| "no extraction tool could be started".to_string()),
            })
        }
        .instrument(info_span!("extract", archive = %archive.display()))
        .await
    }

    async fn try_candidate(
        &self,
        candidate: &ToolCandidate,
        archive: &Path,
        dest: &Path,
    ) -> std::result::Result<(), String> {
        let args = candidate.kind.command_args(archive, dest);
        match self.runner.run(&candidate.program, &args, self.timeout).await {
            Ok(output) if output.success => Ok(()),
            Ok(output) => Err(output.error_text()),
            Err(e) => Err(format!("{}: {}", candidate.program.display(), e)),
        }
    }
}

async fn check_readable(archive: &Path) -> Result<()> {
    let unreadable = |source: std::io::Error| ExtractError::ArchiveUnreadable {
        path: archive.to_path_buf(),
        source,
    };
    let file = tokio::fs::File::open(archive).await.map_err(unreadable)?;
    let metadata = file.metadata().await.map_err(unreadable)?;
    if !metadata.is_file() {
        return Err(unreadable(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok(())
}
