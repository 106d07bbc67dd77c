//! Lies of P install discovery across stores and common directories

use directories::BaseDirs;
use serde::Serialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::host::GameLocator;
use crate::host::vdf::read_library_folders;
use crate::layout::GameLayout;

/// Environment variable naming the game directory explicitly
pub const PATH_OVERRIDE_VAR: &str = "LIESOFP_PATH";

/// Folder names the game is commonly installed under
pub const GAME_FOLDER_NAMES: [&str; 5] = ["Lies of P", "LiesofP", "LOP", "Lies.of.P", "Lies_of_P"];

const STEAM_FOLDER: &str = "Lies of P";
const EPIC_FOLDERS: [&str; 3] = ["LiesofP", "Lies of P", "LOP"];
const STORE_PACKAGE_HINTS: [&str; 3] = ["liesofp", "lies", "neowiz"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Platform {
    /// Named by `LIESOFP_PATH`
    Override,
    Steam,
    Epic,
    MicrosoftStore,
    Manual,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Override => write!(f, "{PATH_OVERRIDE_VAR}"),
            Platform::Steam => write!(f, "Steam"),
            Platform::Epic => write!(f, "Epic Games Store"),
            Platform::MicrosoftStore => write!(f, "Microsoft Store"),
            Platform::Manual => write!(f, "Manual Installation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Installation {
    pub path: PathBuf,
    pub platform: Platform,
}

/// Scans Steam libraries, Epic and Microsoft Store folders and common game
/// directories for a Lies of P install
#[derive(Debug, Clone, Default)]
pub struct PlatformLocator {
    /// Steam client installs; their `libraryfolders.vdf` adds more libraries
    pub steam_roots: Vec<PathBuf>,
    pub epic_roots: Vec<PathBuf>,
    /// Microsoft Store package roots (`WindowsApps`)
    pub store_roots: Vec<PathBuf>,
    /// Directories that may directly hold a game folder
    pub common_roots: Vec<PathBuf>,
    pub honor_env_override: bool,
}

impl PlatformLocator {
    /// Locator over this host's well-known locations
    pub fn new() -> Self {
        let drives = available_drives();
        let home = home_dir();

        let mut steam_roots: Vec<PathBuf> = drives
            .iter()
            .flat_map(|drive| {
                [
                    drive.join("Program Files (x86)").join("Steam"),
                    drive.join("Program Files").join("Steam"),
                    drive.join("Steam"),
                ]
            })
            .collect();
        steam_roots.extend(registry_steam_roots());
        if let Some(ref home) = home {
            steam_roots.push(home.join("AppData").join("Local").join("Steam"));
            steam_roots.push(home.join(".steam").join("steam"));
            steam_roots.push(home.join(".local").join("share").join("Steam"));
        }

        let mut epic_roots: Vec<PathBuf> = drives
            .iter()
            .flat_map(|drive| [drive.join("Program Files").join("Epic Games"), drive.join("Epic Games")])
            .collect();
        if let Some(ref home) = home {
            epic_roots.push(home.join("Epic Games"));
        }

        let store_roots = drives
            .iter()
            .map(|drive| drive.join("Program Files").join("WindowsApps"))
            .collect();

        let mut common_roots: Vec<PathBuf> = drives
            .iter()
            .flat_map(|drive| {
                [
                    drive.join("Games"),
                    drive.join("Program Files"),
                    drive.join("Program Files (x86)"),
                    drive.to_path_buf(),
                ]
            })
            .collect();
        if let Some(ref home) = home {
            common_roots.push(home.join("Games"));
            common_roots.push(home.join("Desktop"));
        }

        Self {
            steam_roots,
            epic_roots,
            store_roots,
            common_roots,
            honor_env_override: true,
        }
    }

    /// Every install found, in discovery order, without duplicates
    pub fn installations(&self) -> Vec<Installation> {
        let mut found: Vec<Installation> = Vec::new();
        let mut push = |path: PathBuf, platform: Platform| {
            if !found.iter().any(|i| i.path == path) {
                info!("Found Lies of P ({}) at {}", platform, path.display());
                found.push(Installation { path, platform });
            }
        };

        if self.honor_env_override {
            if let Some(path) = env::var_os(PATH_OVERRIDE_VAR).map(PathBuf::from) {
                if looks_like_game(&path) {
                    push(path, Platform::Override);
                } else {
                    debug!("{} does not point at the game: {}", PATH_OVERRIDE_VAR, path.display());
                }
            }
        }

        for library in self.steam_libraries() {
            let candidate = library.join("steamapps").join("common").join(STEAM_FOLDER);
            if looks_like_game(&candidate) {
                push(candidate, Platform::Steam);
            }
        }

        for root in &self.epic_roots {
            for folder in EPIC_FOLDERS {
                let candidate = root.join(folder);
                if looks_like_game(&candidate) {
                    push(candidate, Platform::Epic);
                }
            }
        }

        for root in &self.store_roots {
            for candidate in store_packages(root) {
                if looks_like_game(&candidate) {
                    push(candidate, Platform::MicrosoftStore);
                }
            }
        }

        for root in &self.common_roots {
            if !root.is_dir() {
                continue;
            }
            for folder in GAME_FOLDER_NAMES {
                let candidate = root.join(folder);
                if looks_like_game(&candidate) {
                    push(candidate, Platform::Manual);
                }
            }
        }

        found
    }

    /// Steam client roots plus every extra library they list
    fn steam_libraries(&self) -> Vec<PathBuf> {
        let mut libraries: Vec<PathBuf> = Vec::new();
        for root in self.steam_roots.iter().filter(|root| root.is_dir()) {
            debug!("Found Steam at {}", root.display());
            let vdf = root.join("steamapps").join("libraryfolders.vdf");
            let extra = read_library_folders(&vdf).unwrap_or_default();
            for library in std::iter::once(root.clone()).chain(extra) {
                if !libraries.contains(&library) {
                    libraries.push(library);
                }
            }
        }
        libraries
    }
}

impl GameLocator for PlatformLocator {
    /// An explicit override wins, then Steam installs, then whatever was
    /// found first
    fn locate(&self) -> Option<PathBuf> {
        let installations = self.installations();
        installations
            .iter()
            .find(|i| i.platform == Platform::Override)
            .or_else(|| installations.iter().find(|i| i.platform == Platform::Steam))
            .or_else(|| installations.first())
            .map(|i| i.path.clone())
    }
}

/// True if `dir` holds a game executable in any known store layout
pub fn looks_like_game(dir: &Path) -> bool {
    if GameLayout::new(dir).is_game_dir() {
        return true;
    }
    let shipping = Path::new("Binaries").join("Win64").join("LiesofP-Win64-Shipping.exe");
    [
        dir.join(&shipping),
        dir.join("Game").join(&shipping),
        dir.join("Game").join("LiesofP.exe"),
    ]
    .iter()
    .any(|exe| exe.is_file())
}

/// Package folders below a `WindowsApps` root whose name hints at the game
fn store_packages(root: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(root) else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy().to_lowercase();
            STORE_PACKAGE_HINTS.iter().any(|hint| name.contains(hint))
        })
        .map(|entry| entry.path())
        .collect()
}

fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

#[cfg(windows)]
fn available_drives() -> Vec<PathBuf> {
    (b'A'..=b'Z')
        .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
        .filter(|drive| drive.is_dir())
        .collect()
}

#[cfg(not(windows))]
fn available_drives() -> Vec<PathBuf> {
    Vec::new()
}

#[cfg(windows)]
fn registry_steam_roots() -> Vec<PathBuf> {
    use winreg::RegKey;
    use winreg::enums::HKEY_LOCAL_MACHINE;

    let hklm = RegKey::predef(HKEY_LOCAL_MACHINE);
    [r"SOFTWARE\WOW6432Node\Valve\Steam", r"SOFTWARE\Valve\Steam"]
        .iter()
        .filter_map(|subkey| hklm.open_subkey(subkey).ok())
        .filter_map(|key| key.get_value::<String, _>("InstallPath").ok())
        .map(PathBuf::from)
        .collect()
}

#[cfg(not(windows))]
fn registry_steam_roots() -> Vec<PathBuf> {
    Vec::new()
}
