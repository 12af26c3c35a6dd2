use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Serialize;
use tracing::{debug, warn};

use crate::SteamError;

/// Runtime tools that show up as apps but are never patch targets.
pub const EXCLUDED_NAME_FRAGMENTS: &[&str] = &["Proton", "Steam Linux Runtime"];

/// An installed Steam application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstalledGame {
    /// Steam app ID, kept as text exactly as the manifest has it.
    pub id: String,
    pub name: String,
    /// `<library>/steamapps/common/<installdir>`, when the manifest names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub install_dir: Option<String>,
}

/// Default location of installed game folders for the given home.
pub fn common_root(home: &Utf8Path) -> Utf8PathBuf {
    home.join(".local")
        .join("share")
        .join("Steam")
        .join("steamapps")
        .join("common")
}

pub fn is_candidate(name: &str) -> bool {
    !EXCLUDED_NAME_FRAGMENTS
        .iter()
        .any(|fragment| name.contains(fragment))
}

/// Extracts every `"path"` value from a `libraryfolders.vdf`.
pub fn parse_library_paths(content: &str) -> Vec<Utf8PathBuf> {
    content
        .lines()
        .filter_map(|line| value_after(line, "\"path\""))
        .map(|path| Utf8PathBuf::from(path.replace("\\\\", "/")))
        .collect()
}

/// Reads `appid`, `name` and `installdir` from an app manifest. Returns
/// `None` unless both the id and the name are present.
pub fn parse_app_manifest(content: &str) -> Option<(InstalledGame, Option<String>)> {
    let mut id = None;
    let mut name = None;
    let mut install_dir = None;
    for line in content.lines() {
        if id.is_none() {
            id = value_after(line, "\"appid\"");
        }
        if name.is_none() {
            name = value_after(line, "\"name\"");
        }
        if install_dir.is_none() {
            install_dir = value_after(line, "\"installdir\"");
        }
    }
    let id = id.filter(|v| !v.is_empty())?;
    let name = name.filter(|v| !v.is_empty())?;
    Some((
        InstalledGame {
            id,
            name,
            install_dir: None,
        },
        install_dir.filter(|v| !v.is_empty()),
    ))
}

fn value_after(line: &str, key: &str) -> Option<String> {
    let (_, rest) = line.split_once(key)?;
    Some(rest.trim().trim_matches('"').to_string())
}

/// Lists installed games across every library folder known to `steam_root`.
pub fn list_installed_games(steam_root: &Utf8Path) -> Result<Vec<InstalledGame>, SteamError> {
    let library_file = steam_root.join("steamapps").join("libraryfolders.vdf");
    if !library_file.exists() {
        return Err(SteamError::LibraryFoldersMissing(library_file));
    }
    let content = String::from_utf8_lossy(&fs::read(&library_file)?).into_owned();

    let mut games = Vec::new();
    for library in parse_library_paths(&content) {
        let steamapps = library.join("steamapps");
        if !steamapps.is_dir() {
            debug!(library = %library, "library folder has no steamapps directory");
            continue;
        }
        games.extend(scan_library(&steamapps));
    }

    games.retain(|game| is_candidate(&game.name));
    games.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    games.dedup_by(|a, b| a.id == b.id);
    Ok(games)
}

fn scan_library(steamapps: &Utf8Path) -> Vec<InstalledGame> {
    let mut games = Vec::new();
    let entries = match fs::read_dir(steamapps) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(library = %steamapps, error = %err, "skipping unreadable library folder");
            return games;
        }
    };
    for entry in entries {
        let Ok(entry) = entry else { continue };
        let file_name = entry.file_name().to_string_lossy().to_string();
        if !(file_name.starts_with("appmanifest_") && file_name.ends_with(".acf")) {
            continue;
        }
        let path = steamapps.join(&file_name);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(manifest = %path, error = %err, "skipping unreadable app manifest");
                continue;
            }
        };
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(err) => {
                warn!(manifest = %path, error = %err, "skipping app manifest due to encoding issue");
                continue;
            }
        };
        if let Some((mut game, install_dir)) = parse_app_manifest(&content) {
            game.install_dir =
                install_dir.map(|dir| steamapps.join("common").join(dir).to_string());
            games.push(game);
        }
    }
    games
}
