//! Read-only queries about a game directory

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::host::GameLocator;
use crate::layout::{GameLayout, ModComponent};

/// True if `path` holds one of the recognized game executables
pub fn validate_target(path: &Path) -> bool {
    GameLayout::new(path).is_game_dir()
}

/// Which packages are currently present in the mods directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModStatus {
    /// Mods directory holding the dubbing package, or the first existing one
    pub mods_dir: Option<PathBuf>,
    pub dubbing: bool,
    pub locres: bool,
    pub music: bool,
}

impl ModStatus {
    pub fn is_installed(&self, component: ModComponent) -> bool {
        match component {
            ModComponent::Dubbing => self.dubbing,
            ModComponent::Locres => self.locres,
            ModComponent::Music => self.music,
        }
    }

    /// True when any package is present, matching what uninstall removes
    pub fn any_installed(&self) -> bool {
        self.dubbing || self.locres || self.music
    }

    pub fn installed_components(&self) -> Vec<ModComponent> {
        ModComponent::ALL
            .into_iter()
            .filter(|c| self.is_installed(*c))
            .collect()
    }
}

/// Probe every mods directory variant of `path`
pub fn mod_status(path: &Path) -> ModStatus {
    let dirs = GameLayout::new(path).existing_mods_dirs();
    let present = |component: ModComponent| dirs.iter().any(|dir| dir.join(component.file_name()).is_file());

    let mods_dir = dirs
        .iter()
        .find(|dir| dir.join(ModComponent::Dubbing.file_name()).is_file())
        .or_else(|| dirs.first())
        .cloned();

    let status = ModStatus {
        mods_dir,
        dubbing: present(ModComponent::Dubbing),
        locres: present(ModComponent::Locres),
        music: present(ModComponent::Music),
    };
    debug!("Mod status of {}: {:?}", path.display(), status);
    status
}

/// The mod counts as installed when any of its packages is present
pub fn is_mod_installed(path: &Path) -> bool {
    mod_status(path).any_installed()
}

/// What a front end shows on its first screen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartupStatus {
    pub found: bool,
    pub game_path: Option<PathBuf>,
    pub mod_installed: bool,
    pub installed: Vec<ModComponent>,
}

pub fn startup_status(locator: &dyn GameLocator) -> StartupStatus {
    let Some(game_path) = locator.locate() else {
        return StartupStatus::default();
    };
    let status = mod_status(&game_path);
    StartupStatus {
        found: true,
        mod_installed: status.any_installed(),
        installed: status.installed_components(),
        game_path: Some(game_path),
    }
}
