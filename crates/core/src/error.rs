use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

pub type Result<T, E = FgmodError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum FgmodError {
    #[error("Target directory does not exist: {0}")]
    TargetMissing(Utf8PathBuf),

    #[error("Target path is not a directory: {0}")]
    NotADirectory(Utf8PathBuf),

    #[error("Insufficient permissions for {0}")]
    TargetNotWritable(Utf8PathBuf),

    #[error("{0}")]
    Permission(#[source] io::Error),

    #[error("OptiScaler bundle not installed. Run Install first.")]
    BundleNotInstalled,

    #[error("{0} not found in the OptiScaler bundle. Reinstall OptiScaler.")]
    MissingBundleFile(String),

    #[error("Required file {0} not found in plugin source directory")]
    MissingSourceFile(String),

    #[error("OptiScaler archive not found in {0}")]
    ArchiveNotFound(Utf8PathBuf),

    #[error("extractor binary {0} not found on PATH")]
    ExtractorNotFound(String),

    #[error("Failed to extract OptiScaler archive: {stderr}")]
    Extract { status: Option<i32>, stderr: String },

    #[error("extractor did not finish within {0}s and was killed")]
    ExtractTimeout(u64),

    #[error("{0}")]
    Io(#[source] io::Error),

    #[error("manifest error: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl FgmodError {
    /// Target validation failures, raised before anything is touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::TargetMissing(_) | Self::NotADirectory(_) | Self::TargetNotWritable(_)
        )
    }

    pub fn is_permission(&self) -> bool {
        matches!(self, Self::Permission(_) | Self::TargetNotWritable(_))
    }
}

impl From<io::Error> for FgmodError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::PermissionDenied {
            Self::Permission(err)
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_maps_to_permission_variant() {
        let err: FgmodError = io::Error::new(io::ErrorKind::PermissionDenied, "nope").into();
        assert!(err.is_permission());
        assert!(!err.is_validation());
    }

    #[test]
    fn other_io_errors_stay_generic() {
        let err: FgmodError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, FgmodError::Io(_)));
        assert!(!err.is_permission());
    }

    #[test]
    fn validation_messages_name_the_path() {
        let err = FgmodError::NotADirectory(Utf8PathBuf::from("/games/file.txt"));
        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Target path is not a directory: /games/file.txt"
        );
    }

    #[test]
    fn extract_error_carries_stderr_verbatim() {
        let err = FgmodError::Extract {
            status: Some(2),
            stderr: "ERROR: Data Error".into(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to extract OptiScaler archive: ERROR: Data Error"
        );
    }
}
