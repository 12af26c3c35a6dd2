#![allow(dead_code)]

use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use fgmod_core::layout::{
    BUNDLE_REQUIRED_FILES, LOADER_NAME, PLUGINS_DIR, PLUGIN_ADDON, RENAMES_DIR, VERSION_FILE,
};
use fgmod_core::{BundleStore, ExtractOutput, Extractor, Result};
use fs_err as fs;
use walkdir::WalkDir;

pub fn utf8_tempdir() -> (tempfile::TempDir, Utf8PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
    (tmp, path)
}

pub fn bundle_bytes(name: &str) -> String {
    format!("bundle:{name}")
}

/// Lays out an installed bundle the way the installer leaves it.
pub fn fake_bundle(root: &Utf8Path) -> BundleStore {
    fs::create_dir_all(root.join(RENAMES_DIR)).unwrap();
    fs::create_dir_all(root.join(PLUGINS_DIR)).unwrap();
    for name in BUNDLE_REQUIRED_FILES {
        fs::write(root.join(name), bundle_bytes(name)).unwrap();
    }
    fs::write(root.join(RENAMES_DIR).join(LOADER_NAME), bundle_bytes("loader")).unwrap();
    fs::write(root.join(PLUGINS_DIR).join(PLUGIN_ADDON), bundle_bytes(PLUGIN_ADDON)).unwrap();
    fs::write(root.join(VERSION_FILE), "v0.9.0").unwrap();
    BundleStore::new(root)
}

/// Every file under `dir` keyed by relative path. Directories map to `None`.
pub fn snapshot(dir: &Utf8Path) -> BTreeMap<String, Option<Vec<u8>>> {
    WalkDir::new(dir)
        .min_depth(1)
        .into_iter()
        .map(|e| e.unwrap())
        .map(|e| {
            let rel = e
                .path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .to_string();
            let content = e.file_type().is_file().then(|| fs::read(e.path()).unwrap());
            (rel, content)
        })
        .collect()
}

pub fn read(path: &Utf8Path) -> String {
    fs::read_to_string(path).unwrap()
}

/// Stands in for `7z`: writes the files an OptiScaler archive contains.
pub struct FakeExtractor {
    pub files: Vec<(&'static str, &'static str)>,
}

impl FakeExtractor {
    pub fn optiscaler() -> Self {
        let mut files: Vec<(&'static str, &'static str)> = BUNDLE_REQUIRED_FILES
            .iter()
            .filter(|name| !matches!(**name, "nvngx.dll" | "fgmod" | "fgmod-uninstaller.sh"))
            .map(|name| (*name, "from-archive"))
            .collect();
        files.retain(|(name, _)| *name != "OptiScaler.ini");
        files.push(("OptiScaler.ini", "[FrameGen]\nFGType=auto\n[Plugins]\nPath=auto\n"));
        Self { files }
    }
}

impl Extractor for FakeExtractor {
    fn extract(&self, _archive: &Utf8Path, dest: &Utf8Path) -> Result<ExtractOutput> {
        for (name, content) in &self.files {
            fs::write(dest.join(name), content)?;
        }
        Ok(ExtractOutput::default())
    }
}

/// Populates a plugin directory with an archive, the extra binaries and scripts.
pub fn plugin_dir(root: &Utf8Path) -> Utf8PathBuf {
    let plugin = root.join("plugin");
    fs::create_dir_all(plugin.join("bin")).unwrap();
    fs::create_dir_all(plugin.join("assets")).unwrap();
    fs::write(plugin.join("bin/OptiScaler_0.9.0-pre4.7z"), "7z").unwrap();
    fs::write(plugin.join("bin/OptiScaler_BUNDLE_0.9.0.7z"), "7z").unwrap();
    fs::write(plugin.join("bin/nvngx.dll"), "streamline nvngx").unwrap();
    fs::write(plugin.join("bin/OptiPatcher_v0.30.asi"), "optipatcher").unwrap();
    fs::write(plugin.join("bin/amd_fidelityfx_upscaler_dx12.dll"), "static upscaler").unwrap();
    fs::write(plugin.join("assets/fgmod.sh"), "#!/bin/sh\n").unwrap();
    fs::write(plugin.join("assets/fgmod-uninstaller.sh"), "#!/bin/sh\n").unwrap();
    plugin
}
