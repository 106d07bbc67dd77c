//! Collaborators provided by the host system: install discovery, manual
//! folder selection and URI hand-offs

pub mod launch;
pub mod locate;
pub mod vdf;

pub use launch::{STEAM_APP_ID, game_launch_uri, launch_game, open_external};
pub use locate::{Installation, PATH_OVERRIDE_VAR, Platform, PlatformLocator, looks_like_game};

use std::path::PathBuf;

/// Finds the game install directory without user interaction
pub trait GameLocator: Send + Sync {
    fn locate(&self) -> Option<PathBuf>;
}

/// Lets the player choose the game directory by hand
pub trait FolderPicker {
    fn pick(&self) -> Option<PathBuf>;
}
