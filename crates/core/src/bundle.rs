//! The canonical mod directory (`~/fgmod`) and how it is built and torn down.

use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{FgmodError, Result};
use crate::extract::Extractor;
use crate::fsops;
use crate::ini;
use crate::layout::{
    CONFIG_NAME, LAUNCHER_NAME, LOADER_RENAMES, PLUGINS_DIR, PLUGIN_ADDON, PRIMARY_LIBRARY,
    RENAMES_DIR, UNINSTALLER_NAME, VERSION_FILE,
};

/// Files the archive does not ship, copied from the plugin's `bin/`.
pub const ADDITIONAL_FILES: &[&str] = &["nvngx.dll", "OptiPatcher_v0.30.asi"];
/// Versioned source of [`PLUGIN_ADDON`].
pub const PLUGIN_ADDON_SOURCE: &str = "OptiPatcher_v0.30.asi";
pub const UPSCALER_LIBRARY: &str = "amd_fidelityfx_upscaler_dx12.dll";
pub const LAUNCHER_SOURCE: &str = "fgmod.sh";

/// The installed bundle root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleStore {
    root: Utf8PathBuf,
}

impl BundleStore {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Display-only version stamp written at install time.
    pub fn version(&self) -> Option<String> {
        fs::read_to_string(self.path(VERSION_FILE))
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Deletes the bundle wholesale. Returns false when there was nothing to remove.
    pub fn remove(&self) -> Result<bool> {
        if !self.root.exists() {
            info!(root = %self.root, "no bundle directory to remove");
            return Ok(false);
        }
        fs::remove_dir_all(&self.root)?;
        info!(root = %self.root, "removed bundle directory");
        Ok(true)
    }
}

/// Where the plugin keeps the archive (`bin/`) and helper scripts (`assets/`).
#[derive(Debug, Clone)]
pub struct BundleSource {
    pub bin_dir: Utf8PathBuf,
    pub assets_dir: Utf8PathBuf,
}

impl BundleSource {
    pub fn from_plugin_dir(plugin_dir: &Utf8Path) -> Self {
        Self {
            bin_dir: plugin_dir.join("bin"),
            assets_dir: plugin_dir.join("assets"),
        }
    }

    /// Finds the OptiScaler archive, skipping the `BUNDLE` repacks.
    pub fn find_archive(&self) -> Result<Utf8PathBuf> {
        if !self.bin_dir.is_dir() {
            return Err(FgmodError::ArchiveNotFound(self.bin_dir.clone()));
        }
        let mut candidates = Vec::new();
        for entry in fs::read_dir(&self.bin_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            if is_archive_candidate(&name) {
                candidates.push(name);
            }
        }
        candidates.sort();
        let Some(chosen) = candidates.pop() else {
            return Err(FgmodError::ArchiveNotFound(self.bin_dir.clone()));
        };
        if !candidates.is_empty() {
            warn!(?candidates, chosen = %chosen, "several OptiScaler archives found; using the last by name");
        }
        info!(archive = %chosen, "found OptiScaler archive");
        Ok(self.bin_dir.join(chosen))
    }

    /// Every file install copies besides the archive.
    fn required_files(&self) -> Vec<(String, Utf8PathBuf)> {
        let mut files: Vec<_> = ADDITIONAL_FILES
            .iter()
            .map(|name| (name.to_string(), self.bin_dir.join(name)))
            .collect();
        for name in [LAUNCHER_SOURCE, UNINSTALLER_NAME] {
            files.push((name.to_string(), self.assets_dir.join(name)));
        }
        files
    }
}

fn is_archive_candidate(name: &str) -> bool {
    name.ends_with(".7z")
        && (name.contains("OptiScaler") || name.contains("Optiscaler"))
        && !name.contains("BUNDLE")
}

/// `OptiScaler_0.7.9.7z` becomes `v0.7.9`; unrecognised names keep their stem.
pub fn version_from_archive(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".7z").unwrap_or(file_name);
    ["OptiScaler_", "Optiscaler_"]
        .iter()
        .find_map(|prefix| stem.split_once(prefix).map(|(_, rest)| format!("v{rest}")))
        .unwrap_or_else(|| stem.to_string())
}

#[derive(Debug, Clone, Copy)]
pub struct InstallOptions {
    /// Replace the archive's upscaler library with the standalone copy in `bin/`.
    pub upscaler_overwrite: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            upscaler_overwrite: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct InstallReport {
    pub version: String,
    pub archive: String,
    pub renamed_copies: usize,
    pub upscaler_overwritten: bool,
    pub ini_defaults_applied: bool,
}

pub struct BundleInstaller<'a, E: Extractor> {
    store: &'a BundleStore,
    source: &'a BundleSource,
    extractor: &'a E,
    options: InstallOptions,
}

impl<'a, E: Extractor> BundleInstaller<'a, E> {
    pub fn new(
        store: &'a BundleStore,
        source: &'a BundleSource,
        extractor: &'a E,
        options: InstallOptions,
    ) -> Self {
        Self {
            store,
            source,
            extractor,
            options,
        }
    }

    /// Rebuilds the bundle from scratch.
    pub fn install(&self) -> Result<InstallReport> {
        let archive = self.source.find_archive()?;
        for (name, path) in self.source.required_files() {
            if !path.exists() {
                warn!(file = %name, path = %path, "required source file missing");
                return Err(FgmodError::MissingSourceFile(name));
            }
        }

        let root = self.store.root();
        if root.exists() {
            info!(root = %root, "removing existing bundle directory");
            fs::remove_dir_all(root)?;
        }
        fs::create_dir_all(root)?;

        info!(archive = %archive, root = %root, "extracting OptiScaler archive");
        self.extractor.extract(&archive, root)?;

        for name in ADDITIONAL_FILES {
            fsops::copy_file(&self.source.bin_dir.join(name), &self.store.path(name))?;
            info!(file = name, "copied additional file");
        }

        let renamed_copies = self.create_renamed_copies()?;
        self.copy_scripts()?;
        self.build_plugins_dir()?;
        let upscaler_overwritten = self.overwrite_upscaler()?;

        let archive_name = archive.file_name().unwrap_or(archive.as_str());
        let version = version_from_archive(archive_name);
        fs::write(self.store.path(VERSION_FILE), &version)?;
        info!(version = %version, "wrote version stamp");

        let ini_defaults_applied = ini::apply_bundle_defaults(&self.store.path(CONFIG_NAME))?;

        info!(version = %version, root = %root, "bundle installed");
        Ok(InstallReport {
            version,
            archive: archive_name.to_string(),
            renamed_copies,
            upscaler_overwritten,
            ini_defaults_applied,
        })
    }

    fn create_renamed_copies(&self) -> Result<usize> {
        let primary = self.store.path(PRIMARY_LIBRARY);
        if !primary.exists() {
            return Err(FgmodError::MissingBundleFile(PRIMARY_LIBRARY.to_string()));
        }
        let renames = self.store.path(RENAMES_DIR);
        fs::create_dir_all(&renames)?;
        for name in LOADER_RENAMES {
            fsops::copy_file(&primary, &renames.join(name))?;
        }
        info!(count = LOADER_RENAMES.len(), dir = %renames, "created renamed loader copies");
        Ok(LOADER_RENAMES.len())
    }

    fn copy_scripts(&self) -> Result<()> {
        for (src, dest) in [
            (LAUNCHER_SOURCE, LAUNCHER_NAME),
            (UNINSTALLER_NAME, UNINSTALLER_NAME),
        ] {
            let dest = self.store.path(dest);
            fsops::copy_file(&self.source.assets_dir.join(src), &dest)?;
            fsops::set_executable(&dest)?;
            info!(script = %dest, "installed helper script");
        }
        Ok(())
    }

    fn build_plugins_dir(&self) -> Result<()> {
        let plugins = self.store.path(PLUGINS_DIR);
        fs::create_dir_all(&plugins)?;
        fsops::copy_file(
            &self.source.bin_dir.join(PLUGIN_ADDON_SOURCE),
            &plugins.join(PLUGIN_ADDON),
        )?;
        info!(dir = %plugins, "populated plugins directory");
        Ok(())
    }

    fn overwrite_upscaler(&self) -> Result<bool> {
        if !self.options.upscaler_overwrite {
            info!("skipping upscaler library overwrite");
            return Ok(false);
        }
        let src = self.source.bin_dir.join(UPSCALER_LIBRARY);
        if !src.exists() {
            warn!(file = UPSCALER_LIBRARY, "standalone upscaler not found; keeping bundled copy");
            return Ok(false);
        }
        fsops::copy_file(&src, &self.store.path(UPSCALER_LIBRARY))?;
        info!(file = UPSCALER_LIBRARY, "overwrote bundled upscaler library");
        Ok(true)
    }
}
