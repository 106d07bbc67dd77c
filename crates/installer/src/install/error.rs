//! Workflow error types

use std::path::PathBuf;
use thiserror::Error;

use crate::assets::AssetNotFound;
use crate::extract::ExtractError;
use crate::fetch::FetchError;
use crate::layout::AssetSubject;

/// Errors that abort an install or uninstall run. Messages are shown to the
/// player as-is.
#[derive(Debug, Error)]
pub enum InstallError {
    #[error("No se encontró Lies of P en {}. Verifica que la ruta contenga LiesOfP.exe o LOP.exe", path.display())]
    GameNotFound { path: PathBuf },

    #[error("No se encontraron archivos del mod para desinstalar")]
    NothingToUninstall,

    #[error("Ya hay una instalación o desinstalación en curso")]
    AlreadyRunning,

    #[error("Error al descargar los archivos: {0}")]
    Fetch(#[from] FetchError),

    #[error("Error al extraer los archivos: {0}")]
    Extract(#[from] ExtractError),

    #[error("{0}")]
    MissingAsset(#[from] AssetNotFound),

    #[error("Verificación fallida para {}: {reason}", path.display())]
    Verification { path: PathBuf, reason: String },

    #[error("No se pudo eliminar {}: {source}", file.display())]
    Removal {
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error de archivos en {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No se pudieron restaurar las {}: {source}", subject.label())]
    Restore {
        subject: AssetSubject,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, InstallError>;

/// Failure classes a caller can react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Target is not the game, nothing installed, or a run is already active.
    /// Raised before anything is modified.
    Precondition,
    Transport,
    Extraction,
    MandatoryAsset,
    Verification,
    Io,
}

impl InstallError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        InstallError::Io { path: path.into(), source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            InstallError::GameNotFound { .. }
            | InstallError::NothingToUninstall
            | InstallError::AlreadyRunning => ErrorKind::Precondition,
            InstallError::Fetch(_) => ErrorKind::Transport,
            InstallError::Extract(_) => ErrorKind::Extraction,
            InstallError::MissingAsset(_) => ErrorKind::MandatoryAsset,
            InstallError::Verification { .. } | InstallError::Removal { .. } => ErrorKind::Verification,
            InstallError::Io { .. } | InstallError::Restore { .. } => ErrorKind::Io,
        }
    }
}
