//! Install and uninstall workflows
//!
//! An [`Orchestrator`] drives both workflows as fixed linear step sequences
//! against one game install directory. Each run owns a [`WorkflowRun`]
//! context; the only state shared between runs is the in-flight flag that
//! keeps a second run from starting while one is active.

pub mod error;
mod install;
pub mod result;
pub mod status;
mod uninstall;


pub use error::{ErrorKind, InstallError, Result};
pub use result::{InstallOptions, OperationResult};
pub use status::{ModStatus, StartupStatus, is_mod_installed, mod_status, startup_status, validate_target};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{Instrument, error, info, info_span};

use crate::assets::AssetLocator;
use crate::config::InstallerConfig;
use crate::extract::ArchiveExtractor;
use crate::fetch::{FetchError, Fetcher};
use crate::layout::GameLayout;
use crate::progress::{ProgressCallback, StepReporter};

/// Runs install and uninstall workflows, one at a time
pub struct Orchestrator {
    config: InstallerConfig,
    fetcher: Fetcher,
    extractor: ArchiveExtractor,
    assets: AssetLocator,
    progress: Option<ProgressCallback>,
    running: AtomicBool,
}

impl Orchestrator {
    pub fn new(config: InstallerConfig) -> std::result::Result<Self, FetchError> {
        let fetcher = Fetcher::new(&config)?;
        let extractor = ArchiveExtractor::new(&config);
        let assets = AssetLocator::new(config.asset_roots.clone());

        Ok(Self {
            config,
            fetcher,
            extractor,
            assets,
            progress: None,
            running: AtomicBool::new(false),
        })
    }

    /// Set a progress callback for workflow updates
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn with_extractor(mut self, extractor: ArchiveExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_asset_locator(mut self, assets: AssetLocator) -> Self {
        self.assets = assets;
        self
    }

    pub fn config(&self) -> &InstallerConfig {
        &self.config
    }

    /// True while an install or uninstall run is in flight
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Install the mod into `target`. Never fails outright: errors are
    /// reported through the returned [`OperationResult`].
    pub async fn install(&self, target: &Path, options: InstallOptions) -> OperationResult {
        match self.try_install(target, options).await {
            Ok(mods_dir) => OperationResult::installed("¡Instalación completada con éxito!", &mods_dir),
            Err(e) => {
                error!("Installation failed ({:?}): {}", e.kind(), e);
                OperationResult::failed(&e)
            }
        }
    }

    /// Install the mod into `target`, returning the mods directory written to
    pub async fn try_install(&self, target: &Path, options: InstallOptions) -> Result<PathBuf> {
        let _guard = self.acquire()?;
        let run = self.start_run(target, install::TOTAL_STEPS);
        info!("Installing into {} (music: {})", target.display(), options.install_music);

        self.run_install(&run, options)
            .instrument(info_span!("install", target = %target.display()))
            .await
    }

    /// Remove the mod from `target` and restore the original movies
    pub async fn uninstall(&self, target: &Path) -> OperationResult {
        match self.try_uninstall(target).await {
            Ok(()) => OperationResult::succeeded("El mod se ha desinstalado correctamente"),
            Err(e) => {
                error!("Uninstall failed ({:?}): {}", e.kind(), e);
                OperationResult::failed(&e)
            }
        }
    }

    pub async fn try_uninstall(&self, target: &Path) -> Result<()> {
        let _guard = self.acquire()?;
        let run = self.start_run(target, uninstall::TOTAL_STEPS);
        info!("Uninstalling from {}", target.display());

        self.run_uninstall(&run)
            .instrument(info_span!("uninstall", target = %target.display()))
            .await
    }

    fn acquire(&self) -> Result<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| InstallError::AlreadyRunning)?;
        Ok(RunGuard { flag: &self.running })
    }

    fn start_run(&self, target: &Path, total_steps: usize) -> WorkflowRun {
        WorkflowRun {
            layout: GameLayout::new(target),
            reporter: Arc::new(StepReporter::new(total_steps, self.progress.clone())),
            step_delay: self.config.step_delay,
        }
    }
}

/// Clears the in-flight flag when a run ends, however it ends
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// State owned by a single workflow run
pub(crate) struct WorkflowRun {
    pub(crate) layout: GameLayout,
    pub(crate) reporter: Arc<StepReporter>,
    step_delay: Duration,
}

impl WorkflowRun {
    /// Report a step and give a UI the configured time to render it
    pub(crate) async fn step(&self, step: usize, message: impl Into<String>, percentage: u8) {
        let message = message.into();
        info!("Step {}: {}", step, message);
        self.reporter.report(step, message, percentage);
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
    }
}
