//! The ten-step install workflow

use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::backup::BackupManager;
use crate::fetch::{DownloadAggregator, FetchCallback, file_name_from_url};
use crate::fs_ops::{best_effort, set_owner_rw};
use crate::install::error::{InstallError, Result};
use crate::install::result::InstallOptions;
use crate::install::{Orchestrator, WorkflowRun};
use crate::layout::{AssetSubject, ModComponent};
use crate::progress::format_speed;

pub(crate) const TOTAL_STEPS: usize = 10;

// Downloads report inside this percentage band
const DOWNLOAD_START: f64 = 10.0;
const DOWNLOAD_SPAN: f64 = 40.0;

/// One archive volume to fetch into the staging directory
struct StagedPart {
    subject: AssetSubject,
    url: String,
    path: PathBuf,
    /// First volume of its archive; the one handed to the extractor
    first: bool,
}

impl Orchestrator {
    pub(crate) async fn run_install(&self, run: &WorkflowRun, options: InstallOptions) -> Result<PathBuf> {
        let layout = &run.layout;

        // Step 1: the target must be the game
        run.step(1, "Verificando la instalación del juego...", 5).await;
        if !layout.is_game_dir() {
            return Err(InstallError::GameNotFound { path: layout.root().to_path_buf() });
        }

        // Step 2: fetch every archive concurrently into a fresh staging dir
        run.step(2, "Descargando archivos de cinemáticas y pantallas de inicio...", DOWNLOAD_START as u8)
            .await;
        let staging = tempfile::Builder::new()
            .prefix("ecos-del-doblaje-")
            .tempdir()
            .map_err(|e| InstallError::io(std::env::temp_dir(), e))?;
        let archives = self.fetch_archives(run, staging.path()).await?;
        if !self.config.download_settle_delay.is_zero() {
            tokio::time::sleep(self.config.download_settle_delay).await;
        }

        // Step 3: snapshot the originals before anything is overwritten
        run.step(3, "Creando copia de seguridad de los archivos originales...", 55).await;
        // A record only goes away on uninstall, so an existing one predates
        // every overlay, including those of failed runs.
        let backups = BackupManager::for_layout(layout);
        for subject in AssetSubject::ALL {
            if backups.has_record(subject) {
                info!("Keeping existing {} backup", subject);
                continue;
            }
            let source = layout.asset_dir(subject);
            backups
                .backup_subject(subject, &source)
                .await
                .map_err(|e| InstallError::io(&source, e))?;
        }

        // Steps 4 and 5: overlay the movie directories
        for (step, percentage, subject) in [(4, 62, AssetSubject::Cinematic), (5, 70, AssetSubject::Splash)] {
            run.step(step, format!("Extrayendo {}...", subject.label()), percentage).await;
            match archives.iter().find(|(s, _)| *s == subject) {
                Some((_, archive)) => {
                    let dest = layout.asset_dir(subject);
                    let extraction = self.extractor.extract(archive, &dest).await?;
                    debug!("{} extracted by {}", subject, extraction.tool);
                }
                None => info!("No archive configured for {}, skipping", subject),
            }
        }

        // Step 6
        run.step(6, "Preparando la carpeta de mods...", 75).await;
        let mods_dir = layout.mods_dir();
        tokio::fs::create_dir_all(&mods_dir)
            .await
            .map_err(|e| InstallError::io(&mods_dir, e))?;

        // Step 7: packages
        run.step(7, "Copiando archivos del doblaje...", 80).await;
        let copied = self.copy_packages(run, &mods_dir, options).await?;

        // Step 8
        run.step(8, "Ajustando permisos de archivos...", 92).await;
        for file in &copied {
            best_effort("permission normalization", set_owner_rw(file)).await;
        }

        // Step 9
        run.step(9, "Limpiando archivos temporales...", 95).await;
        best_effort("staging cleanup", async { staging.close() }).await;

        // Step 10
        run.step(10, "Verificando la instalación...", 98).await;
        let dubbing = mods_dir.join(ModComponent::Dubbing.file_name());
        if !dubbing.is_file() {
            return Err(InstallError::Verification {
                path: dubbing,
                reason: "el archivo del doblaje no está en la carpeta de mods".to_string(),
            });
        }

        run.step(10, "¡Instalación completada!", 100).await;
        info!("Mod installed into {}", mods_dir.display());
        Ok(mods_dir)
    }

    /// Fetch all configured archives; returns the first volume of each
    async fn fetch_archives(&self, run: &WorkflowRun, staging: &Path) -> Result<Vec<(AssetSubject, PathBuf)>> {
        let mut parts = Vec::new();
        for archive in &self.config.archives {
            for (volume, url) in archive.parts.iter().enumerate() {
                parts.push(StagedPart {
                    subject: archive.subject,
                    url: url.clone(),
                    path: staging.join(file_name_from_url(url)?),
                    first: volume == 0,
                });
            }
        }

        let aggregator = Arc::new(DownloadAggregator::new(parts.len()));
        let downloads = parts.iter().enumerate().map(|(index, part)| {
            let callback = download_callback(index, aggregator.clone(), run);
            self.fetcher.fetch(&part.url, &part.path, Some(callback))
        });
        let sizes = try_join_all(downloads).await?;
        info!(
            "Downloaded {} files ({} bytes)",
            sizes.len(),
            sizes.iter().sum::<u64>()
        );

        Ok(parts
            .into_iter()
            .filter(|part| part.first)
            .map(|part| (part.subject, part.path))
            .collect())
    }

    /// Copy the mandatory package and whichever optional packages apply.
    /// Returns the installed paths.
    async fn copy_packages(&self, run: &WorkflowRun, mods_dir: &Path, options: InstallOptions) -> Result<Vec<PathBuf>> {
        let mut copied = Vec::new();

        let dubbing = self.assets.locate(ModComponent::Dubbing.file_name())?;
        copied.push(copy_package(&dubbing, mods_dir, ModComponent::Dubbing).await?);

        run.step(7, "Copiando archivos de textos...", 85).await;
        match self.assets.locate_optional(ModComponent::Locres.file_name()) {
            Some(locres) => copied.push(copy_package(&locres, mods_dir, ModComponent::Locres).await?),
            None => info!("Text package not found, skipping"),
        }

        let music_target = mods_dir.join(ModComponent::Music.file_name());
        if options.install_music {
            run.step(7, "Copiando archivos de música...", 90).await;
            match self.assets.locate_optional(ModComponent::Music.file_name()) {
                Some(music) => copied.push(copy_package(&music, mods_dir, ModComponent::Music).await?),
                None => info!("Music package not found, skipping"),
            }
        } else if music_target.is_file() {
            info!("Removing music package left by an earlier install");
            tokio::fs::remove_file(&music_target)
                .await
                .map_err(|source| InstallError::Removal { file: music_target.clone(), source })?;
        }

        Ok(copied)
    }
}

async fn copy_package(source: &Path, mods_dir: &Path, component: ModComponent) -> Result<PathBuf> {
    let target = mods_dir.join(component.file_name());
    tokio::fs::copy(source, &target)
        .await
        .map_err(|e| InstallError::io(&target, e))?;
    info!("Installed {} package at {}", component, target.display());
    Ok(target)
}

/// Maps combined download progress onto the download band of step 2
fn download_callback(index: usize, aggregator: Arc<DownloadAggregator>, run: &WorkflowRun) -> FetchCallback {
    let reporter = run.reporter.clone();
    Arc::new(move |progress| {
        if let Some(combined) = aggregator.update(index, progress) {
            let percentage = DOWNLOAD_START + combined.percentage / 100.0 * DOWNLOAD_SPAN;
            reporter.report(
                2,
                format!(
                    "Descargando archivos... {:.0}% ({})",
                    combined.percentage,
                    format_speed(combined.speed_bps)
                ),
                percentage as u8,
            );
        }
    })
}
