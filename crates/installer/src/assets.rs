//! Mod package lookup across packaged and development locations

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// No candidate root holds the requested package
#[derive(Debug, Error)]
#[error("No se encontró el archivo '{name}'. Ubicaciones verificadas: {locations}")]
pub struct AssetNotFound {
    pub name: String,
    pub probed: Vec<PathBuf>,
    locations: String,
}

impl AssetNotFound {
    pub fn new(name: &str, probed: Vec<PathBuf>) -> Self {
        let locations = probed
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            name: name.to_string(),
            probed,
            locations,
        }
    }
}

/// Resolves payload file names against an ordered list of roots
#[derive(Debug, Clone)]
pub struct AssetLocator {
    roots: Vec<PathBuf>,
}

impl AssetLocator {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Every path probed for `name`, in probing order
    pub fn candidates(&self, name: &str) -> Vec<PathBuf> {
        self.roots.iter().map(|root| root.join(name)).collect()
    }

    /// First existing candidate for `name`
    pub fn locate(&self, name: &str) -> Result<PathBuf, AssetNotFound> {
        let candidates = self.candidates(name);
        for candidate in &candidates {
            debug!("Checking: {}", candidate.display());
            if candidate.is_file() {
                info!("Found {} at {}", name, candidate.display());
                return Ok(candidate.clone());
            }
        }
        Err(AssetNotFound::new(name, candidates))
    }

    pub fn locate_optional(&self, name: &str) -> Option<PathBuf> {
        self.locate(name).ok()
    }
}

impl Default for AssetLocator {
    fn default() -> Self {
        Self::new(default_asset_roots())
    }
}

/// Directory holding bundled resources of a packaged build
pub fn resources_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("resources")))
}

/// Source-tree root of a development checkout
pub fn development_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// Packaged locations first, then development, then the working directory
pub fn default_asset_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(resources) = resources_dir() {
        roots.push(resources.join("app").join("assets"));
        roots.push(resources.join("assets"));
    }
    roots.push(development_root().join("assets"));
    if let Ok(cwd) = env::current_dir() {
        roots.push(cwd.join("assets"));
    }
    roots
}
