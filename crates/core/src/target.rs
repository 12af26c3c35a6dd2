use camino::{Utf8Path, Utf8PathBuf};
use tracing::info;

use crate::error::{FgmodError, Result};

/// A game directory that passed validation and may be mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDir {
    path: Utf8PathBuf,
}

impl TargetDir {
    /// Validates a caller-supplied directory. Nothing is written here.
    pub fn resolve(raw: &str, home: &Utf8Path) -> Result<Self> {
        info!(directory = raw, "resolving target directory");
        let path = expand_home(raw, home);
        if !path.exists() {
            return Err(FgmodError::TargetMissing(path));
        }
        if !path.is_dir() {
            return Err(FgmodError::NotADirectory(path));
        }
        if !writable_and_traversable(&path) {
            return Err(FgmodError::TargetNotWritable(path));
        }
        info!(directory = raw, resolved = %path, "target directory resolved");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn join(&self, name: &str) -> Utf8PathBuf {
        self.path.join(name)
    }
}

pub fn expand_home(raw: &str, home: &Utf8Path) -> Utf8PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        home.join(rest)
    } else if raw == "~" {
        home.to_path_buf()
    } else {
        Utf8PathBuf::from(raw)
    }
}

#[cfg(unix)]
fn writable_and_traversable(path: &Utf8Path) -> bool {
    use std::ffi::CString;

    let Ok(c_path) = CString::new(path.as_str()) else {
        return false;
    };
    // SAFETY: c_path is a valid NUL-terminated string for the duration of the call.
    unsafe { libc::access(c_path.as_ptr(), libc::W_OK | libc::X_OK) == 0 }
}

#[cfg(not(unix))]
fn writable_and_traversable(path: &Utf8Path) -> bool {
    path.metadata()
        .map(|meta| !meta.permissions().readonly())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8(path: &std::path::Path) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(path.to_path_buf()).unwrap()
    }

    #[test]
    fn resolves_existing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = utf8(tmp.path());
        let target = TargetDir::resolve(dir.as_str(), Utf8Path::new("/home/deck")).unwrap();
        assert_eq!(target.path(), dir);
        assert_eq!(target.join("dxgi.dll"), dir.join("dxgi.dll"));
    }

    #[test]
    fn rejects_missing_directory() {
        let err = TargetDir::resolve("/definitely/not/a/game", Utf8Path::new("/home/deck"))
            .unwrap_err();
        assert!(matches!(err, FgmodError::TargetMissing(_)));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn rejects_plain_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let file = utf8(tmp.path());
        let err = TargetDir::resolve(file.as_str(), Utf8Path::new("/home/deck")).unwrap_err();
        assert!(matches!(err, FgmodError::NotADirectory(_)));
    }

    #[test]
    fn expands_tilde_against_home() {
        let home = Utf8Path::new("/home/deck");
        assert_eq!(
            expand_home("~/Games/Cyberpunk", home),
            Utf8PathBuf::from("/home/deck/Games/Cyberpunk")
        );
        assert_eq!(expand_home("~", home), Utf8PathBuf::from("/home/deck"));
        assert_eq!(expand_home("/opt/game", home), Utf8PathBuf::from("/opt/game"));
    }

    #[test]
    fn tilde_target_resolves_under_home() {
        let tmp = tempfile::tempdir().unwrap();
        let home = utf8(tmp.path());
        fs_err::create_dir(home.join("Game")).unwrap();
        let target = TargetDir::resolve("~/Game", &home).unwrap();
        assert_eq!(target.path(), home.join("Game"));
    }
}
