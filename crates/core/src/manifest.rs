use std::collections::{BTreeMap, BTreeSet};

use camino::Utf8Path;
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::fsops;
use crate::layout::MANIFEST_NAME;

/// What the engine put into one game directory.
///
/// The filesystem stays authoritative; this record only tells a mod-installed
/// copy of a backup-eligible library apart from the game's own file. Installed
/// files are keyed by name with the SHA-256 of the bytes that were written.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatchManifest {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub installed: BTreeMap<String, String>,
    #[serde(default)]
    pub backups: BTreeSet<String>,
}

impl PatchManifest {
    /// Loads the manifest from `dir`. A missing or unreadable manifest is empty.
    pub fn load(dir: &Utf8Path) -> Result<Self> {
        let path = dir.join(MANIFEST_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let bytes = fs::read(&path)?;
        match serde_json::from_slice(&bytes) {
            Ok(manifest) => Ok(manifest),
            Err(err) => {
                warn!(path = %path, error = %err, "ignoring malformed patch manifest");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, dir: &Utf8Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(dir.join(MANIFEST_NAME), json)?;
        Ok(())
    }

    pub fn is_installed(&self, name: &str) -> bool {
        self.installed.contains_key(name)
    }

    pub fn record_installed(&mut self, name: &str, digest: String) {
        self.installed.insert(name.to_string(), digest);
    }

    /// True when `path` still holds exactly the bytes recorded for `name`.
    /// A file replaced since the last patch no longer counts as ours.
    pub fn holds_installed_copy(&self, name: &str, path: &Utf8Path) -> Result<bool> {
        let Some(recorded) = self.installed.get(name) else {
            return Ok(false);
        };
        Ok(fsops::file_digest(path)? == *recorded)
    }

    pub fn record_backup(&mut self, name: &str) {
        self.backups.insert(name.to_string());
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        (tmp, path)
    }

    #[test]
    fn missing_manifest_is_empty() {
        let (_tmp, dir) = utf8_tempdir();
        assert_eq!(PatchManifest::load(&dir).unwrap(), PatchManifest::default());
    }

    #[test]
    fn saved_manifest_loads_back() {
        let (_tmp, dir) = utf8_tempdir();
        let mut manifest = PatchManifest {
            version: Some("v0.9.0".into()),
            ..Default::default()
        };
        manifest.record_installed("dxgi.dll", "ab12".into());
        manifest.record_backup("amd_fidelityfx_dx12.dll");
        manifest.save(&dir).unwrap();

        let loaded = PatchManifest::load(&dir).unwrap();
        assert_eq!(loaded, manifest);
        assert!(loaded.is_installed("dxgi.dll"));
        assert!(!loaded.is_installed("amd_fidelityfx_dx12.dll"));
    }

    #[test]
    fn repeated_saves_are_byte_identical() {
        let (_tmp, dir) = utf8_tempdir();
        let mut manifest = PatchManifest::default();
        manifest.record_installed("libxess.dll", "01".into());
        manifest.record_installed("dxgi.dll", "02".into());
        manifest.save(&dir).unwrap();
        let first = fs::read(dir.join(MANIFEST_NAME)).unwrap();
        manifest.record_installed("dxgi.dll", "02".into());
        manifest.save(&dir).unwrap();
        assert_eq!(first, fs::read(dir.join(MANIFEST_NAME)).unwrap());
    }

    #[test]
    fn installed_copy_is_matched_by_content() {
        let (_tmp, dir) = utf8_tempdir();
        let path = dir.join("amd_fidelityfx_vk.dll");
        fs::write(&path, "bundle copy").unwrap();
        let mut manifest = PatchManifest::default();
        manifest.record_installed("amd_fidelityfx_vk.dll", fsops::file_digest(&path).unwrap());

        assert!(manifest
            .holds_installed_copy("amd_fidelityfx_vk.dll", &path)
            .unwrap());

        fs::write(&path, "game update").unwrap();
        assert!(!manifest
            .holds_installed_copy("amd_fidelityfx_vk.dll", &path)
            .unwrap());
        assert!(!manifest.holds_installed_copy("libxess.dll", &path).unwrap());
    }

    #[test]
    fn malformed_manifest_is_treated_as_empty() {
        let (_tmp, dir) = utf8_tempdir();
        fs::write(dir.join(MANIFEST_NAME), "{ not json").unwrap();
        assert_eq!(PatchManifest::load(&dir).unwrap(), PatchManifest::default());
    }
}
