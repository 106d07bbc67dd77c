use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::install::error::InstallError;

/// Options chosen by the player before an install run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallOptions {
    pub install_music: bool,
}

impl InstallOptions {
    pub fn with_music(install_music: bool) -> Self {
        Self { install_music }
    }
}

/// Terminal outcome of an install or uninstall run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed_path: Option<PathBuf>,
}

impl OperationResult {
    pub fn succeeded(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
            installed_path: None,
        }
    }

    pub fn installed(message: impl Into<String>, path: &Path) -> Self {
        Self {
            installed_path: Some(path.to_path_buf()),
            ..Self::succeeded(message)
        }
    }

    pub fn failed(error: &InstallError) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.to_string()),
            installed_path: None,
        }
    }
}
