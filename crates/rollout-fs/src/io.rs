//! Plain read helpers that attach the offending path to I/O errors

use std::fs;

use crate::{Error, NormalizedPath, Result};

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// List the regular files directly inside `dir`, sorted by file name.
///
/// Hidden files (leading `.`) are skipped.
pub fn sorted_files(dir: &NormalizedPath) -> Result<Vec<NormalizedPath>> {
    let native_dir = dir.to_native();
    let mut names = Vec::new();
    for entry in fs::read_dir(&native_dir).map_err(|e| Error::io(&native_dir, e))? {
        let entry = entry.map_err(|e| Error::io(&native_dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.path().is_file() {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names.iter().map(|name| dir.join(name)).collect())
}
