//! Installer Library
//!
//! Installs and removes the Ecos del Doblaje Spanish dubbing mod for
//! Lies of P. The library turns a vanilla game directory into a modded one
//! and back: it downloads the movie archives, backs up the original movies,
//! extracts the replacements, copies the mod packages into the game's
//! `~mods` directory and restores everything on uninstall.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use installer::{
//!     ConsoleProgressReporter, GameLocator, InstallOptions, InstallerConfig,
//!     IntoProgressCallback, Orchestrator, PlatformLocator,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Find the game
//! let game = PlatformLocator::new().locate().ok_or("Lies of P not found")?;
//!
//! // Create the orchestrator with a console progress sink
//! let orchestrator = Orchestrator::new(InstallerConfig::from_env())?
//!     .with_progress_callback(ConsoleProgressReporter::new(false).into_callback());
//!
//! // Install with the optional music package
//! let result = orchestrator.install(&game, InstallOptions::with_music(true)).await;
//! if result.success {
//!     println!("Installed into {:?}", result.installed_path);
//! } else {
//!     eprintln!("Install failed: {:?}", result.error);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Capitalization-tolerant paths**: every content directory variant is probed
//! - **Concurrent downloads**: split archives are fetched in parallel with combined progress
//! - **Extraction fallback chain**: bundled 7-Zip, WinRAR and tar are tried in order
//! - **Backup and restore**: original movies are saved before they are overwritten
//! - **Install discovery**: Steam libraries, Epic, Microsoft Store and common folders

pub mod assets;
pub mod backup;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod fs_ops;
pub mod host;
pub mod install;
pub mod layout;
pub mod progress;

// Re-export commonly used types for convenience
pub use assets::{AssetLocator, AssetNotFound};
pub use backup::BackupManager;
pub use config::{InstallerConfig, RemoteArchive};
pub use extract::{ArchiveExtractor, ExtractError, ProcessRunner, ToolCandidate, ToolKind};
pub use fetch::{FetchError, FetchProgress, Fetcher};
pub use host::{FolderPicker, GameLocator, PlatformLocator, launch_game, open_external};
pub use install::{
    ErrorKind, InstallError, InstallOptions, ModStatus, OperationResult, Orchestrator,
    StartupStatus, is_mod_installed, mod_status, startup_status, validate_target,
};
pub use layout::{AssetSubject, GameLayout, ModComponent};
pub use progress::{
    ConsoleProgressReporter, IntoProgressCallback, NullProgressReporter, ProgressCallback,
    ProgressEvent, ProgressReporter,
};
