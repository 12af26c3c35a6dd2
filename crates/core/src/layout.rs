//! File roles for the bundle and for patched game directories.
//!
//! Every filename the engine knows about appears once in [`RULES`] together
//! with the roles it plays. The engine only ever asks this table which names
//! to touch; it never hardcodes a filename in its copy/delete logic.

use serde::Serialize;

/// Installed into the game directory to make the game load OptiScaler.
pub const LOADER_NAME: &str = "dxgi.dll";
/// Primary library shipped in the archive; source of every loader rename.
pub const PRIMARY_LIBRARY: &str = "OptiScaler.dll";
pub const CONFIG_NAME: &str = "OptiScaler.ini";
pub const PLUGINS_DIR: &str = "plugins";
pub const PLUGIN_ADDON: &str = "OptiPatcher.asi";
pub const RENAMES_DIR: &str = "renames";
pub const LAUNCHER_NAME: &str = "fgmod";
pub const UNINSTALLER_NAME: &str = "fgmod-uninstaller.sh";
pub const VERSION_FILE: &str = "version.txt";
pub const MANIFEST_NAME: &str = ".fgmod-manifest.json";
pub const BACKUP_SUFFIX: &str = ".b";

/// Alternate entry points a game may probe for; each gets a copy of the
/// primary library under `renames/`.
pub const LOADER_RENAMES: &[&str] = &[
    "dxgi.dll",
    "winmm.dll",
    "dbghelp.dll",
    "version.dll",
    "wininet.dll",
    "winhttp.dll",
    "OptiScaler.asi",
];

/// Files that must exist under the bundle root for it to count as installed.
pub const BUNDLE_REQUIRED_FILES: &[&str] = &[
    "OptiScaler.dll",
    "OptiScaler.ini",
    "dlssg_to_fsr3_amd_is_better.dll",
    "fakenvapi.dll",
    "fakenvapi.ini",
    "nvngx.dll",
    "amd_fidelityfx_dx12.dll",
    "amd_fidelityfx_framegeneration_dx12.dll",
    "amd_fidelityfx_upscaler_dx12.dll",
    "amd_fidelityfx_vk.dll",
    "libxess.dll",
    "libxess_dx11.dll",
    "libxess_fg.dll",
    "libxell.dll",
    "fgmod",
    "fgmod-uninstaller.sh",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Loader-hijacking library; deleted outright, never backed up.
    Injector,
    /// May ship with the game itself; moved aside before patching.
    BackupEligible,
    /// Copied from the bundle on every patch.
    Support,
    /// Left behind by older mod versions; removed on unpatch.
    Legacy,
    /// Legacy artifact that breaks the current mod; also removed on patch.
    Conflicting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRule {
    pub name: &'static str,
    pub roles: &'static [Role],
}

impl FileRule {
    pub fn has(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

use Role::*;

pub static RULES: &[FileRule] = &[
    FileRule { name: "dxgi.dll", roles: &[Injector] },
    FileRule { name: "winmm.dll", roles: &[Injector] },
    FileRule { name: "nvngx.dll", roles: &[Injector, Support] },
    FileRule { name: "_nvngx.dll", roles: &[Injector, Legacy] },
    FileRule { name: "nvngx-wrapper.dll", roles: &[Injector, Legacy] },
    FileRule { name: "dlss-enabler.dll", roles: &[Injector, Legacy] },
    FileRule { name: "OptiScaler.dll", roles: &[Injector] },
    FileRule { name: "d3dcompiler_47.dll", roles: &[BackupEligible] },
    FileRule { name: "amd_fidelityfx_dx12.dll", roles: &[BackupEligible, Support] },
    FileRule { name: "amd_fidelityfx_framegeneration_dx12.dll", roles: &[BackupEligible, Support] },
    FileRule { name: "amd_fidelityfx_upscaler_dx12.dll", roles: &[BackupEligible, Support] },
    FileRule { name: "amd_fidelityfx_vk.dll", roles: &[BackupEligible, Support] },
    FileRule { name: "libxess.dll", roles: &[Support] },
    FileRule { name: "libxess_dx11.dll", roles: &[Support] },
    FileRule { name: "libxess_fg.dll", roles: &[Support] },
    FileRule { name: "libxell.dll", roles: &[Support] },
    FileRule { name: "dlssg_to_fsr3_amd_is_better.dll", roles: &[Support] },
    FileRule { name: "fakenvapi.dll", roles: &[Support] },
    FileRule { name: "fakenvapi.ini", roles: &[Support] },
    FileRule { name: "dlssg_to_fsr3.ini", roles: &[Legacy] },
    FileRule { name: "dlssg_to_fsr3.log", roles: &[Legacy] },
    FileRule { name: "nvapi64.dll", roles: &[Legacy, Conflicting] },
    FileRule { name: "nvapi64.dll.b", roles: &[Legacy, Conflicting] },
    FileRule { name: "fakenvapi.log", roles: &[Legacy] },
    FileRule { name: "dlss-enabler-upscaler.dll", roles: &[Legacy] },
    FileRule { name: "dlss-enabler.log", roles: &[Legacy] },
    FileRule { name: "dlssg_to_fsr3_amd_is_better-3.0.dll", roles: &[Legacy] },
    FileRule { name: "OptiScaler.asi", roles: &[Legacy] },
    FileRule { name: "OptiScaler.ini", roles: &[Legacy] },
    FileRule { name: "OptiScaler.log", roles: &[Legacy] },
];

/// Names carrying `role`, in table order.
pub fn names_with(role: Role) -> impl Iterator<Item = &'static str> {
    RULES.iter().filter(move |r| r.has(role)).map(|r| r.name)
}

/// Names carrying any of `roles`, each yielded once.
pub fn names_with_any(roles: &'static [Role]) -> impl Iterator<Item = &'static str> {
    RULES
        .iter()
        .filter(move |r| roles.iter().any(|role| r.has(*role)))
        .map(|r| r.name)
}

pub fn rule_for(name: &str) -> Option<&'static FileRule> {
    RULES.iter().find(|r| r.name == name)
}

pub fn backup_name(name: &str) -> String {
    format!("{name}{BACKUP_SUFFIX}")
}
