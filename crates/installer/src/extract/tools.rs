//! Extraction tool candidates and their command-line templates

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::assets::{development_root, resources_dir};

/// Family of an extraction tool; each family takes its own flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    /// Bundled or installed 7-Zip (`7za`, `7zz`, `7z`)
    SevenZip,
    /// WinRAR's command-line companion `UnRAR`
    RarCli,
    /// `WinRAR.exe` driven in background mode
    RarGui,
    /// bsdtar, which reads 7z archives
    Tar,
}

impl ToolKind {
    pub fn family(self) -> &'static str {
        match self {
            ToolKind::SevenZip => "7zip",
            ToolKind::RarCli => "unrar",
            ToolKind::RarGui => "winrar",
            ToolKind::Tar => "tar",
        }
    }

    /// Arguments extracting `archive` into `dest`, overwriting without prompts
    pub fn command_args(self, archive: &Path, dest: &Path) -> Vec<OsString> {
        match self {
            ToolKind::SevenZip => {
                let mut output = OsString::from("-o");
                output.push(dest);
                vec!["x".into(), archive.into(), output, "-y".into()]
            }
            ToolKind::RarCli => vec!["x".into(), "-y".into(), archive.into(), dir_arg(dest)],
            ToolKind::RarGui => vec![
                "x".into(),
                "-ibck".into(),
                "-y".into(),
                archive.into(),
                dir_arg(dest),
            ],
            ToolKind::Tar => vec!["-xf".into(), archive.into(), "-C".into(), dest.into()],
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.family())
    }
}

/// RAR tools treat the destination as a directory only with a trailing separator
fn dir_arg(dest: &Path) -> OsString {
    let mut arg = dest.as_os_str().to_os_string();
    arg.push(std::path::MAIN_SEPARATOR_STR);
    arg
}

/// One ranked way to run an extraction tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCandidate {
    pub kind: ToolKind,
    pub program: PathBuf,
}

impl ToolCandidate {
    pub fn new<P: Into<PathBuf>>(kind: ToolKind, program: P) -> Self {
        Self { kind, program: program.into() }
    }

    /// True for filesystem paths, false for bare names resolved via `PATH`
    pub fn is_path(&self) -> bool {
        self.program.components().count() > 1 || self.program.is_absolute()
    }

    /// Path candidates must exist; bare commands are always worth a try
    pub fn is_available(&self) -> bool {
        !self.is_path() || self.program.is_file()
    }
}

#[cfg(windows)]
const BUNDLED_NAMES: [&str; 2] = ["7za.exe", "7zz.exe"];
#[cfg(not(windows))]
const BUNDLED_NAMES: [&str; 2] = ["7za", "7zz"];

/// Ranked candidates: bundled 7-Zip (packaged before development), then the
/// WinRAR companion, WinRAR itself and finally the system tar.
pub fn default_candidates() -> Vec<ToolCandidate> {
    let mut bin_dirs = Vec::new();
    if let Some(resources) = resources_dir() {
        bin_dirs.push(resources.join("app").join("bin"));
        bin_dirs.push(resources.join("bin"));
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        bin_dirs.push(exe_dir.join("bin"));
    }
    bin_dirs.push(development_root().join("bin"));

    let mut candidates: Vec<ToolCandidate> = bin_dirs
        .iter()
        .flat_map(|dir| {
            BUNDLED_NAMES
                .iter()
                .map(move |name| ToolCandidate::new(ToolKind::SevenZip, dir.join(name)))
        })
        .collect();

    candidates.extend(system_candidates());
    candidates
}

#[cfg(windows)]
fn system_candidates() -> Vec<ToolCandidate> {
    let program_files = std::env::var_os("ProgramFiles")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"));
    let program_files_x86 = std::env::var_os("ProgramFiles(x86)")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Program Files (x86)"));
    let system_root = std::env::var_os("SystemRoot")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Windows"));

    vec![
        ToolCandidate::new(ToolKind::RarCli, program_files.join("WinRAR").join("UnRAR.exe")),
        ToolCandidate::new(ToolKind::RarCli, program_files_x86.join("WinRAR").join("UnRAR.exe")),
        ToolCandidate::new(ToolKind::RarGui, program_files.join("WinRAR").join("WinRAR.exe")),
        ToolCandidate::new(ToolKind::RarGui, program_files_x86.join("WinRAR").join("WinRAR.exe")),
        ToolCandidate::new(ToolKind::Tar, system_root.join("System32").join("tar.exe")),
    ]
}

#[cfg(not(windows))]
fn system_candidates() -> Vec<ToolCandidate> {
    vec![
        ToolCandidate::new(ToolKind::RarCli, "/usr/bin/unrar"),
        ToolCandidate::new(ToolKind::Tar, "/usr/bin/bsdtar"),
    ]
}

/// Bare commands tried after every ranked candidate, resolved via `PATH`
pub fn fallback_commands() -> Vec<ToolCandidate> {
    vec![
        ToolCandidate::new(ToolKind::SevenZip, "7z"),
        ToolCandidate::new(ToolKind::SevenZip, "7za"),
        ToolCandidate::new(ToolKind::Tar, "tar"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seven_zip_args() {
        let args = ToolKind::SevenZip.command_args(Path::new("a.7z.001"), Path::new("out"));
        assert_eq!(args, vec![
            OsString::from("x"),
            OsString::from("a.7z.001"),
            OsString::from("-oout"),
            OsString::from("-y"),
        ]);
    }

    #[test]
    fn test_rar_args_use_trailing_separator() {
        let args = ToolKind::RarGui.command_args(Path::new("a.7z"), Path::new("out"));
        assert_eq!(args[1], OsString::from("-ibck"));
        let dest = args.last().unwrap().to_string_lossy().into_owned();
        assert!(dest.ends_with(std::path::MAIN_SEPARATOR));

        let args = ToolKind::RarCli.command_args(Path::new("a.7z"), Path::new("out"));
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn test_tar_args() {
        let args = ToolKind::Tar.command_args(Path::new("a.7z"), Path::new("out"));
        assert_eq!(args, vec![
            OsString::from("-xf"),
            OsString::from("a.7z"),
            OsString::from("-C"),
            OsString::from("out"),
        ]);
    }

    #[test]
    fn test_bare_commands_are_always_available() {
        let bare = ToolCandidate::new(ToolKind::SevenZip, "7z");
        assert!(!bare.is_path());
        assert!(bare.is_available());

        let missing = ToolCandidate::new(ToolKind::SevenZip, "/nonexistent/bin/7za");
        assert!(missing.is_path());
        assert!(!missing.is_available());
    }

    #[test]
    fn test_default_ranking_starts_with_bundled_tool() {
        let candidates = default_candidates();
        assert_eq!(candidates[0].kind, ToolKind::SevenZip);
        assert!(candidates.iter().all(ToolCandidate::is_path));
        assert!(fallback_commands().iter().any(|c| c.program == Path::new("7z")));
    }
}
