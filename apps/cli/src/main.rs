//! Command-line front end for the Ecos del Doblaje installer

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use installer::{
    ConsoleProgressReporter, FolderPicker, GameLocator, InstallOptions, InstallerConfig,
    IntoProgressCallback, NullProgressReporter, OperationResult, Orchestrator, PlatformLocator,
    launch_game, mod_status, open_external, startup_status, validate_target,
};

#[derive(Parser)]
#[command(name = "ecos-cli", version, about = "Instalador del doblaje al español de Lies of P")]
struct Cli {
    /// Debug logging and every progress update
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Locate the game install directory
    Detect,
    /// Show which mod packages are installed
    Status {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Install the mod
    Install {
        #[arg(long)]
        path: Option<PathBuf>,
        /// Also install the music package
        #[arg(long)]
        music: bool,
    },
    /// Remove the mod and restore the original movies
    Uninstall {
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Start the game through Steam
    Launch,
    /// Open a web link in the default browser
    Open { url: String },
}

/// Asks for the game directory on stdin
struct PromptPicker;

impl FolderPicker for PromptPicker {
    fn pick(&self) -> Option<PathBuf> {
        print!("No se encontró Lies of P automáticamente. Introduce la ruta de la carpeta del juego: ");
        io::stdout().flush().ok()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        let line = line.trim().trim_matches('"');
        if line.is_empty() { None } else { Some(PathBuf::from(line)) }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let succeeded = match cli.command {
        Command::Detect => {
            let status = startup_status(&PlatformLocator::new());
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else if let Some(ref path) = status.game_path {
                println!("{}", path.display());
            } else {
                println!("No se encontró Lies of P");
            }
            status.found
        }
        Command::Status { path } => {
            let game = resolve_target(path)?;
            let status = mod_status(&game);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                println!("Juego: {}", game.display());
                println!("  Válido:   {}", yes_no(validate_target(&game)));
                println!("  Doblaje:  {}", yes_no(status.dubbing));
                println!("  Textos:   {}", yes_no(status.locres));
                println!("  Música:   {}", yes_no(status.music));
                if let Some(ref dir) = status.mods_dir {
                    println!("  Carpeta de mods: {}", dir.display());
                }
            }
            status.dubbing
        }
        Command::Install { path, music } => {
            let game = resolve_target(path)?;
            let orchestrator = orchestrator(cli.verbose, cli.json)?;
            let result = orchestrator.install(&game, InstallOptions::with_music(music)).await;
            report(&result, cli.json)?
        }
        Command::Uninstall { path } => {
            let game = resolve_target(path)?;
            let orchestrator = orchestrator(cli.verbose, cli.json)?;
            let result = orchestrator.uninstall(&game).await;
            report(&result, cli.json)?
        }
        Command::Launch => launch_game(),
        Command::Open { url } => open_external(&url),
    };

    Ok(if succeeded { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Explicit path, then auto-detection, then the prompt
fn resolve_target(path: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = path {
        debug!("Using explicit path {}", path.display());
        return Ok(path);
    }
    if let Some(path) = PlatformLocator::new().locate() {
        info!("Detected Lies of P at {}", path.display());
        return Ok(path);
    }
    match PromptPicker.pick() {
        Some(path) => Ok(path),
        None => bail!("No se indicó la carpeta de Lies of P"),
    }
}

fn orchestrator(verbose: bool, json: bool) -> anyhow::Result<Orchestrator> {
    let progress = if json {
        NullProgressReporter.into_callback()
    } else {
        ConsoleProgressReporter::new(verbose).into_callback()
    };
    let orchestrator = Orchestrator::new(InstallerConfig::from_env())
        .context("Failed to create HTTP client")?
        .with_progress_callback(progress);
    Ok(orchestrator)
}

fn report(result: &OperationResult, json: bool) -> anyhow::Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if result.success {
        println!("{}", result.message.as_deref().unwrap_or("Listo"));
        if let Some(ref path) = result.installed_path {
            println!("Instalado en {}", path.display());
        }
    } else {
        eprintln!("Error: {}", result.error.as_deref().unwrap_or("error desconocido"));
    }
    Ok(result.success)
}

fn yes_no(value: bool) -> &'static str {
    if value { "sí" } else { "no" }
}
