//! Check-then-act filesystem helpers shared by the engine and the installer.

use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::error::{FgmodError, Result};

/// Removes a file, symlink or directory tree. Returns whether anything was there.
pub fn remove_path(path: &Utf8Path) -> Result<bool> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err.into()),
    };
    if meta.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(true)
}

/// Copies `src` over `dest`, replacing whatever is there.
pub fn copy_file(src: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    fs::copy(src, dest)?;
    Ok(())
}

/// Recursively copies `src` into `dest`. Files with the same relative path are
/// overwritten; anything else already under `dest` is left alone.
pub fn merge_copy_dir(src: &Utf8Path, dest: &Utf8Path) -> Result<usize> {
    fs::create_dir_all(dest)?;
    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(walk_error)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| FgmodError::Io(std::io::Error::other(e)))?;
        let rel = Utf8PathBuf::from(rel.to_string_lossy().to_string());
        let target = dest.join(&rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        fs::copy(entry.path(), &target)?;
        copied += 1;
    }
    Ok(copied)
}

/// Lowercase hex SHA-256 of the file at `path`.
pub fn file_digest(path: &Utf8Path) -> Result<String> {
    let mut file = fs::File::open(path)?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect())
}

#[cfg(unix)]
pub fn set_executable(path: &Utf8Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
pub fn set_executable(_path: &Utf8Path) -> Result<()> {
    Ok(())
}

fn walk_error(err: walkdir::Error) -> FgmodError {
    match err.into_io_error() {
        Some(io) => io.into(),
        None => FgmodError::Io(std::io::Error::other("filesystem loop while copying")),
    }
}
