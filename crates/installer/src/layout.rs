//! Well-known game paths and capitalization-variant resolution
//!
//! Lies of P ships its content directory with inconsistent capitalization
//! depending on the store it was bought from. Every lookup of the mods
//! directory or the movie directories goes through [`GameLayout`], which
//! probes the accepted variants in order and falls back to the canonical one.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Executable names that identify a Lies of P install directory
pub const GAME_EXECUTABLES: [&str; 2] = ["LiesOfP.exe", "LOP.exe"];

/// Accepted content directory variants, canonical first
pub const CONTENT_VARIANTS: [&[&str]; 3] = [
    &["LiesofP", "Content"],
    &["LiesOfP", "Content"],
    &["Content"],
];

/// Name of the hidden backup root inside the movies directory
pub const BACKUP_ROOT_NAME: &str = "_backup_ecos_del_doblaje";

const MODS_SUBPATH: [&str; 2] = ["Paks", "~mods"];
const MOVIES_DIR: &str = "Movies";

/// A payload kind the installer can place in the mods directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModComponent {
    Dubbing,
    Locres,
    Music,
}

impl ModComponent {
    pub const ALL: [ModComponent; 3] = [ModComponent::Dubbing, ModComponent::Locres, ModComponent::Music];

    /// File name of the package, both as shipped with the installer and as
    /// installed in the mods directory. Presence of this file in the mods
    /// directory is the only record that the component is installed.
    pub fn file_name(self) -> &'static str {
        match self {
            ModComponent::Dubbing => "000_Spanishmod_P.pak",
            ModComponent::Locres => "000_SpanishLocresmod_P.pak",
            ModComponent::Music => "000_SpanishMusicmod_P.pak",
        }
    }

    pub fn is_mandatory(self) -> bool {
        matches!(self, ModComponent::Dubbing)
    }

    /// Spanish label used in user-facing messages
    pub fn label(self) -> &'static str {
        match self {
            ModComponent::Dubbing => "doblaje",
            ModComponent::Locres => "textos",
            ModComponent::Music => "música",
        }
    }
}

impl fmt::Display for ModComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModComponent::Dubbing => write!(f, "dubbing"),
            ModComponent::Locres => write!(f, "locres"),
            ModComponent::Music => write!(f, "music"),
        }
    }
}

/// A movie directory that gets overlaid by a downloaded archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetSubject {
    Cinematic,
    Splash,
}

impl AssetSubject {
    pub const ALL: [AssetSubject; 2] = [AssetSubject::Cinematic, AssetSubject::Splash];

    /// Directory under `Content/Movies` holding this subject's files
    pub fn movies_subdir(self) -> &'static str {
        match self {
            AssetSubject::Cinematic => "Cinematics",
            AssetSubject::Splash => "Splash",
        }
    }

    /// Namespace of this subject inside the backup root
    pub fn backup_name(self) -> &'static str {
        match self {
            AssetSubject::Cinematic => "cinematicas",
            AssetSubject::Splash => "splash",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AssetSubject::Cinematic => "cinemáticas",
            AssetSubject::Splash => "pantallas de inicio",
        }
    }
}

impl fmt::Display for AssetSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetSubject::Cinematic => write!(f, "cinematic"),
            AssetSubject::Splash => write!(f, "splash"),
        }
    }
}

/// Path resolver rooted at a game install directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLayout {
    root: PathBuf,
}

impl GameLayout {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True if the root holds one of the recognized game executables
    pub fn is_game_dir(&self) -> bool {
        GAME_EXECUTABLES.iter().any(|exe| self.root.join(exe).is_file())
    }

    /// Content directories for every accepted variant, canonical first
    pub fn content_candidates(&self) -> Vec<PathBuf> {
        CONTENT_VARIANTS
            .iter()
            .map(|parts| parts.iter().fold(self.root.clone(), |path, part| path.join(part)))
            .collect()
    }

    /// First variant under which `relative` already exists
    pub fn find_existing(&self, relative: &Path) -> Option<PathBuf> {
        self.content_candidates()
            .into_iter()
            .map(|content| content.join(relative))
            .find(|candidate| {
                debug!("Probing {}", candidate.display());
                candidate.exists()
            })
    }

    /// Resolve `relative` against the content directory.
    ///
    /// Returns the first variant where the path exists; otherwise the path
    /// under the first content directory that exists; otherwise the path
    /// under the canonical variant.
    pub fn resolve(&self, relative: &Path) -> PathBuf {
        if let Some(existing) = self.find_existing(relative) {
            return existing;
        }

        let candidates = self.content_candidates();
        candidates
            .iter()
            .find(|content| content.is_dir())
            .unwrap_or(&candidates[0])
            .join(relative)
    }

    pub fn mods_relative() -> PathBuf {
        MODS_SUBPATH.iter().collect()
    }

    pub fn asset_relative(subject: AssetSubject) -> PathBuf {
        Path::new(MOVIES_DIR).join(subject.movies_subdir())
    }

    pub fn backup_relative() -> PathBuf {
        Path::new(MOVIES_DIR).join(BACKUP_ROOT_NAME)
    }

    /// Mods directory to write into
    pub fn mods_dir(&self) -> PathBuf {
        self.resolve(&Self::mods_relative())
    }

    /// Every mods directory variant that currently exists
    pub fn existing_mods_dirs(&self) -> Vec<PathBuf> {
        let relative = Self::mods_relative();
        let mut dirs: Vec<PathBuf> = Vec::new();
        for content in self.content_candidates() {
            let candidate = content.join(&relative);
            if candidate.is_dir() && !dirs.iter().any(|seen| same_dir(seen, &candidate)) {
                dirs.push(candidate);
            }
        }
        dirs
    }

    pub fn asset_dir(&self, subject: AssetSubject) -> PathBuf {
        self.resolve(&Self::asset_relative(subject))
    }

    pub fn backup_root(&self) -> PathBuf {
        self.resolve(&Self::backup_relative())
    }
}

/// Case-insensitive filesystems expose the same directory under several
/// variants; compare canonical paths so it is only reported once.
fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_component_file_names_are_unique() {
        let mut names: Vec<_> = ModComponent::ALL.iter().map(|c| c.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 3);
        assert!(ModComponent::Dubbing.is_mandatory());
        assert!(!ModComponent::Music.is_mandatory());
    }

    #[test]
    fn test_game_dir_detection() {
        let temp_dir = tempdir().unwrap();
        let layout = GameLayout::new(temp_dir.path());
        assert!(!layout.is_game_dir());

        std::fs::write(temp_dir.path().join("LOP.exe"), b"").unwrap();
        assert!(layout.is_game_dir());
    }

    #[test]
    fn test_resolve_uses_canonical_variant_when_nothing_exists() {
        let temp_dir = tempdir().unwrap();
        let layout = GameLayout::new(temp_dir.path());

        let expected = temp_dir.path().join("LiesofP").join("Content").join("Paks").join("~mods");
        assert_eq!(layout.mods_dir(), expected);
    }

    #[test]
    fn test_resolve_finds_non_canonical_variant() {
        let temp_dir = tempdir().unwrap();
        let mods = temp_dir.path().join("Content").join("Paks").join("~mods");
        std::fs::create_dir_all(&mods).unwrap();

        let layout = GameLayout::new(temp_dir.path());
        assert_eq!(layout.mods_dir(), mods);
        assert_eq!(layout.existing_mods_dirs(), vec![mods]);
    }

    #[test]
    fn test_resolve_prefers_existing_content_dir_for_fresh_paths() {
        let temp_dir = tempdir().unwrap();
        let content = temp_dir.path().join("Content");
        std::fs::create_dir_all(&content).unwrap();

        let layout = GameLayout::new(temp_dir.path());
        assert_eq!(
            layout.backup_root(),
            content.join("Movies").join(BACKUP_ROOT_NAME)
        );
    }
}
