//! Fire-and-forget hand-offs to the host's URI handlers

use std::process::{Command, Stdio};
use tracing::{info, warn};

/// Steam application id of Lies of P
pub const STEAM_APP_ID: u32 = 1627720;

pub fn game_launch_uri() -> String {
    format!("steam://rungameid/{STEAM_APP_ID}")
}

/// Ask Steam to start the game. True if the request was handed off.
pub fn launch_game() -> bool {
    let uri = game_launch_uri();
    info!("Launching game via {}", uri);
    open_with_host(&uri)
}

/// True for the URLs [`open_external`] agrees to open
pub fn is_allowed_external(target: &str) -> bool {
    match url::Url::parse(target) {
        Ok(url) => matches!(url.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// Open an http(s) URL in the default browser. Any other scheme is refused.
pub fn open_external(target: &str) -> bool {
    if !is_allowed_external(target) {
        warn!("Refusing to open non-web URL: {}", target);
        return false;
    }
    open_with_host(target)
}

fn open_with_host(target: &str) -> bool {
    let result = host_command(target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    match result {
        Ok(_) => true,
        Err(e) => {
            warn!("Failed to open {}: {}", target, e);
            false
        }
    }
}

#[cfg(target_os = "windows")]
fn host_command(target: &str) -> Command {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x08000000;

    let mut cmd = Command::new("cmd");
    // The empty argument is the window title `start` expects first
    cmd.args(["/C", "start", "", target]).creation_flags(CREATE_NO_WINDOW);
    cmd
}

#[cfg(target_os = "macos")]
fn host_command(target: &str) -> Command {
    let mut cmd = Command::new("open");
    cmd.arg(target);
    cmd
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn host_command(target: &str) -> Command {
    let mut cmd = Command::new("xdg-open");
    cmd.arg(target);
    cmd
}
