//! The five-step uninstall workflow

use std::path::PathBuf;
use tracing::{info, warn};

use crate::backup::BackupManager;
use crate::fs_ops::{best_effort, relax_permissions, remove_dir_if_empty};
use crate::install::error::{InstallError, Result};
use crate::install::{Orchestrator, WorkflowRun};
use crate::layout::{AssetSubject, ModComponent};

pub(crate) const TOTAL_STEPS: usize = 5;

impl Orchestrator {
    pub(crate) async fn run_uninstall(&self, run: &WorkflowRun) -> Result<()> {
        let layout = &run.layout;

        // Step 1: every mods directory variant is searched
        run.step(1, "Buscando archivos del mod...", 10).await;
        let installed: Vec<PathBuf> = layout
            .existing_mods_dirs()
            .iter()
            .flat_map(|dir| ModComponent::ALL.into_iter().map(move |c| dir.join(c.file_name())))
            .filter(|path| path.is_file())
            .collect();
        if installed.is_empty() {
            return Err(InstallError::NothingToUninstall);
        }
        info!("Found {} package files", installed.len());

        // Step 2
        run.step(2, "Eliminando archivos del mod...", 30).await;
        for file in &installed {
            best_effort("permission relaxation", relax_permissions(file)).await;
            tokio::fs::remove_file(file)
                .await
                .map_err(|source| InstallError::Removal { file: file.clone(), source })?;
            if file.exists() {
                return Err(InstallError::Verification {
                    path: file.clone(),
                    reason: "el archivo sigue existiendo después de eliminarlo".to_string(),
                });
            }
            info!("Removed {}", file.display());
        }

        // Steps 3 and 4: put the original movies back
        let backups = BackupManager::for_layout(layout);
        let mut restored_any = false;
        for (step, percentage, subject) in [(3, 55, AssetSubject::Cinematic), (4, 80, AssetSubject::Splash)] {
            run.step(step, format!("Restaurando {} originales...", subject.label()), percentage)
                .await;
            let target = layout.asset_dir(subject);
            let restored = backups
                .restore_subject(subject, &target)
                .await
                .map_err(|source| InstallError::Restore { subject, source })?;
            if restored {
                restored_any = true;
            } else {
                warn!("No {} backup found, leaving {} as is", subject, target.display());
            }
        }

        // Step 5
        run.step(5, "Limpiando archivos residuales...", 95).await;
        for dir in layout.existing_mods_dirs() {
            best_effort("mods directory pruning", remove_dir_if_empty(&dir)).await;
        }
        if restored_any {
            best_effort("backup cleanup", backups.discard()).await;
        } else {
            best_effort("backup cleanup", remove_dir_if_empty(backups.root())).await;
        }

        run.step(5, "¡Desinstalación completada!", 100).await;
        Ok(())
    }
}
