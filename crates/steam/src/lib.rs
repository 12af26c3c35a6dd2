//! Installed-game discovery from local Steam library folders.
//!
//! Manifests are read a line at a time and only `appid`, `name` and
//! `installdir` are picked out. Files that cannot be decoded are skipped.

mod error;
mod library;

pub use error::SteamError;
pub use library::{
    common_root, is_candidate, list_installed_games, parse_app_manifest, parse_library_paths,
    InstalledGame, EXCLUDED_NAME_FRAGMENTS,
};
