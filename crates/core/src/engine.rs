//! Applies the bundle to a game directory and reverses it.
//!
//! Both directions are sequences of check-then-act steps. A call that fails
//! halfway leaves the directory as the failing step found it; running the same
//! call again finishes the job without disturbing backups that already exist.

use camino::Utf8Path;
use fs_err as fs;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::bundle::BundleStore;
use crate::error::{FgmodError, Result};
use crate::fsops;
use crate::layout::{
    backup_name, names_with, names_with_any, Role, CONFIG_NAME, LOADER_NAME, MANIFEST_NAME,
    PLUGINS_DIR, PRIMARY_LIBRARY, RENAMES_DIR, UNINSTALLER_NAME,
};
use crate::manifest::PatchManifest;
use crate::target::TargetDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigAction {
    Copied,
    Preserved,
    MissingFromBundle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub removed_injectors: Vec<String>,
    pub backed_up: Vec<String>,
    pub removed_conflicting: Vec<String>,
    pub loader_source: String,
    pub config: ConfigAction,
    pub plugins_synced: usize,
    pub support_copied: Vec<String>,
    pub support_missing: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnpatchReport {
    pub removed: Vec<String>,
    pub legacy_removed: Vec<String>,
    pub plugins_removed: bool,
    pub restored: Vec<String>,
    pub uninstaller_removed: bool,
}

pub struct PatchEngine<'a> {
    bundle: &'a BundleStore,
}

impl<'a> PatchEngine<'a> {
    pub fn new(bundle: &'a BundleStore) -> Self {
        Self { bundle }
    }

    pub fn patch(&self, target: &TargetDir) -> Result<PatchReport> {
        if !self.bundle.exists() {
            return Err(FgmodError::BundleNotInstalled);
        }
        let primary = self.bundle.path(PRIMARY_LIBRARY);
        if !primary.exists() {
            return Err(FgmodError::MissingBundleFile(PRIMARY_LIBRARY.to_string()));
        }

        let dir = target.path();
        info!(target = %dir, "patch started");
        let mut manifest = PatchManifest::load(dir)?;

        let removed_injectors = remove_all(dir, names_with(Role::Injector))?;
        info!(removed = ?removed_injectors, "removed injector libraries");

        let backed_up = backup_originals(dir, &mut manifest)?;
        info!(backed_up = ?backed_up, "backed up original libraries");

        let removed_conflicting = remove_all(dir, names_with(Role::Conflicting))?;
        info!(removed = ?removed_conflicting, "removed conflicting legacy files");

        let renamed = self.bundle.path(RENAMES_DIR).join(LOADER_NAME);
        let loader_source = if renamed.exists() { renamed } else { primary };
        install_file(&loader_source, target, LOADER_NAME, &mut manifest)?;
        info!(from = %loader_source, to = %target.join(LOADER_NAME), "installed loader");

        let config = self.install_config(target, &mut manifest)?;

        let plugins_src = self.bundle.path(PLUGINS_DIR);
        let plugins_synced = if plugins_src.is_dir() {
            let copied = fsops::merge_copy_dir(&plugins_src, &target.join(PLUGINS_DIR))?;
            info!(files = copied, "synced plugins directory");
            copied
        } else {
            warn!(bundle = %self.bundle.root(), "plugins directory missing in bundle");
            0
        };

        let mut support_copied = Vec::new();
        let mut support_missing = Vec::new();
        for name in names_with(Role::Support) {
            let src = self.bundle.path(name);
            if src.exists() {
                install_file(&src, target, name, &mut manifest)?;
                support_copied.push(name.to_string());
            } else {
                support_missing.push(name.to_string());
            }
        }
        info!(copied = ?support_copied, "copied support files");
        if !support_missing.is_empty() {
            warn!(missing = ?support_missing, "support files missing from bundle");
        }

        manifest.version = self.bundle.version();
        manifest.save(dir)?;

        info!(target = %dir, "patch complete");
        Ok(PatchReport {
            removed_injectors,
            backed_up,
            removed_conflicting,
            loader_source: loader_source.to_string(),
            config,
            plugins_synced,
            support_copied,
            support_missing,
        })
    }

    /// Copies the bundled config only when the game has none, so user edits survive.
    fn install_config(
        &self,
        target: &TargetDir,
        manifest: &mut PatchManifest,
    ) -> Result<ConfigAction> {
        let dest = target.join(CONFIG_NAME);
        if dest.exists() {
            info!(path = %dest, "preserving existing config");
            return Ok(ConfigAction::Preserved);
        }
        let src = self.bundle.path(CONFIG_NAME);
        if !src.exists() {
            warn!(bundle = %self.bundle.root(), "no OptiScaler.ini in bundle to copy");
            return Ok(ConfigAction::MissingFromBundle);
        }
        install_file(&src, target, CONFIG_NAME, manifest)?;
        info!(path = %dest, "copied config");
        Ok(ConfigAction::Copied)
    }

    pub fn unpatch(&self, target: &TargetDir) -> Result<UnpatchReport> {
        let dir = target.path();
        info!(target = %dir, "unpatch started");
        let mut report = UnpatchReport {
            removed: remove_all(dir, names_with_any(&[Role::Injector, Role::Support]))?,
            ..Default::default()
        };
        info!(removed = ?report.removed, "removed injector and support files");

        report.legacy_removed = remove_all(dir, names_with(Role::Legacy))?;
        info!(removed = ?report.legacy_removed, "removed legacy artifacts");

        report.plugins_removed = fsops::remove_path(&target.join(PLUGINS_DIR))?;
        if report.plugins_removed {
            info!(path = %target.join(PLUGINS_DIR), "removed plugins directory");
        }

        for name in names_with(Role::BackupEligible) {
            let backup = target.join(&backup_name(name));
            if !backup.exists() {
                continue;
            }
            let original = target.join(name);
            fsops::remove_path(&original)?;
            fs::rename(&backup, &original)?;
            report.restored.push(name.to_string());
        }
        info!(restored = ?report.restored, "restored original libraries");

        report.uninstaller_removed = fsops::remove_path(&target.join(UNINSTALLER_NAME))?;
        fsops::remove_path(&target.join(MANIFEST_NAME))?;

        info!(target = %dir, "unpatch complete");
        Ok(report)
    }
}

fn remove_all<'n>(dir: &Utf8Path, names: impl Iterator<Item = &'n str>) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    for name in names {
        if fsops::remove_path(&dir.join(name))? {
            removed.push(name.to_string());
        }
    }
    Ok(removed)
}

/// Copies `src` to `name` in the target and records the written bytes.
fn install_file(
    src: &Utf8Path,
    target: &TargetDir,
    name: &str,
    manifest: &mut PatchManifest,
) -> Result<()> {
    let dest = target.join(name);
    fsops::copy_file(src, &dest)?;
    manifest.record_installed(name, fsops::file_digest(&dest)?);
    Ok(())
}

/// Moves game-shipped libraries aside. An existing backup is never replaced,
/// and a file is only treated as ours while it still matches what we wrote.
fn backup_originals(dir: &Utf8Path, manifest: &mut PatchManifest) -> Result<Vec<String>> {
    let mut backed_up = Vec::new();
    for name in names_with(Role::BackupEligible) {
        let original = dir.join(name);
        if !original.exists() {
            continue;
        }
        let backup = dir.join(backup_name(name));
        if backup.exists() {
            debug!(file = name, "backup already present");
            continue;
        }
        if manifest.holds_installed_copy(name, &original)? {
            debug!(file = name, "present file is the copy a previous patch installed");
            continue;
        }
        fs::rename(&original, &backup)?;
        manifest.record_backup(name);
        backed_up.push(name.to_string());
    }
    Ok(backed_up)
}
