use camino::Utf8PathBuf;

/// Errors produced while scanning Steam libraries.
#[derive(Debug, thiserror::Error)]
pub enum SteamError {
    #[error("libraryfolders.vdf not found")]
    LibraryFoldersMissing(Utf8PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
