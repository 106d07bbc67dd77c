//! Steam `libraryfolders.vdf` reader

use std::io;
use std::path::{Path, PathBuf};

/// Library paths listed in the contents of a `libraryfolders.vdf` file.
///
/// Only the `"path"` entries matter; the rest of the key-value tree is
/// ignored. Escaped backslashes are unescaped.
pub fn parse_library_folders(raw: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();

    for line in raw.lines() {
        let parts: Vec<&str> = line.trim().split('"').collect();
        // `"path"<ws>"value"` splits into ["", "path", <ws>, "value", ""]
        if parts.len() >= 4 && parts[1].eq_ignore_ascii_case("path") {
            let path = parts[3].replace("\\\\", "\\");
            if !path.is_empty() {
                paths.push(PathBuf::from(path));
            }
        }
    }

    paths
}

pub fn read_library_folders(vdf: &Path) -> io::Result<Vec<PathBuf>> {
    let raw = std::fs::read_to_string(vdf)?;
    Ok(parse_library_folders(&raw))
}
