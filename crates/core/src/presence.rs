//! Read-only state queries for the bundle and for game directories.

use camino::Utf8Path;
use serde::Serialize;

use crate::bundle::BundleStore;
use crate::layout::{
    backup_name, names_with, Role, BUNDLE_REQUIRED_FILES, CONFIG_NAME, LOADER_NAME, PLUGINS_DIR,
    PLUGIN_ADDON,
};
use crate::manifest::PatchManifest;

pub fn bundle_installed(store: &BundleStore) -> bool {
    let root = store.root();
    root.is_dir()
        && BUNDLE_REQUIRED_FILES
            .iter()
            .all(|name| root.join(name).exists())
        && root.join(PLUGINS_DIR).join(PLUGIN_ADDON).exists()
}

pub fn target_patched(dir: &Utf8Path) -> bool {
    dir.join(LOADER_NAME).exists()
        && dir.join(CONFIG_NAME).exists()
        && dir.join(PLUGINS_DIR).join(PLUGIN_ADDON).exists()
}

#[derive(Debug, Clone, Serialize)]
pub struct TargetStatus {
    pub patched: bool,
    /// Backup-eligible names with a preserved original.
    pub backups: Vec<String>,
    pub manifest: Option<PatchManifest>,
}

pub fn inspect_target(dir: &Utf8Path) -> TargetStatus {
    let backups = names_with(Role::BackupEligible)
        .filter(|name| dir.join(backup_name(name)).exists())
        .map(str::to_string)
        .collect();
    let manifest = PatchManifest::load(dir)
        .ok()
        .filter(|m| *m != PatchManifest::default());
    TargetStatus {
        patched: target_patched(dir),
        backups,
        manifest,
    }
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;
    use fs_err as fs;

    use super::*;

    fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        (tmp, path)
    }

    #[test]
    fn empty_bundle_is_not_installed() {
        let (_tmp, root) = utf8_tempdir();
        assert!(!bundle_installed(&BundleStore::new(root.join("fgmod"))));
        assert!(!bundle_installed(&BundleStore::new(&root)));
    }

    #[test]
    fn bundle_needs_plugin_addon() {
        let (_tmp, root) = utf8_tempdir();
        for name in BUNDLE_REQUIRED_FILES {
            fs::write(root.join(name), "x").unwrap();
        }
        let store = BundleStore::new(&root);
        assert!(!bundle_installed(&store));

        fs::create_dir_all(root.join(PLUGINS_DIR)).unwrap();
        fs::write(root.join(PLUGINS_DIR).join(PLUGIN_ADDON), "asi").unwrap();
        assert!(bundle_installed(&store));
    }

    #[test]
    fn target_marker_needs_all_three_files() {
        let (_tmp, dir) = utf8_tempdir();
        fs::write(dir.join(LOADER_NAME), "dll").unwrap();
        fs::write(dir.join(CONFIG_NAME), "ini").unwrap();
        assert!(!target_patched(&dir));

        fs::create_dir_all(dir.join(PLUGINS_DIR)).unwrap();
        fs::write(dir.join(PLUGINS_DIR).join(PLUGIN_ADDON), "asi").unwrap();
        assert!(target_patched(&dir));
    }

    #[test]
    fn inspect_lists_backups_without_mutating() {
        let (_tmp, dir) = utf8_tempdir();
        fs::write(dir.join("d3dcompiler_47.dll.b"), "orig").unwrap();

        let status = inspect_target(&dir);

        assert!(!status.patched);
        assert_eq!(status.backups, vec!["d3dcompiler_47.dll".to_string()]);
        assert!(status.manifest.is_none());
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 1);
    }
}
