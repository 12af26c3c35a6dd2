use std::env;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fgmod_core::{expand_home, BundleSource, BundleStore, DEFAULT_EXTRACT_TIMEOUT};
use serde::Deserialize;

const CONFIG_FILE: &str = "fgmod.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PathsSection {
    home: Option<String>,
    bundle_dir: Option<String>,
    plugin_dir: Option<String>,
    steam_root: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstallSection {
    upscaler_overwrite: Option<bool>,
    extractor: Option<String>,
    extract_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    paths: Option<PathsSection>,
    install: Option<InstallSection>,
}

/// Values the environment supplies when the config file is silent.
#[derive(Debug, Clone, Default)]
pub struct EnvDefaults {
    pub home: Option<String>,
    pub plugin_dir: Option<String>,
}

impl EnvDefaults {
    pub fn from_env() -> Self {
        Self {
            home: env::var("HOME").ok(),
            plugin_dir: env::var("DECKY_PLUGIN_DIR").ok(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FgmodConfig {
    pub home: Utf8PathBuf,
    pub bundle_dir: Utf8PathBuf,
    pub plugin_dir: Utf8PathBuf,
    pub steam_root: Utf8PathBuf,
    pub upscaler_overwrite: bool,
    pub extractor: String,
    pub extract_timeout: Duration,
}

impl FgmodConfig {
    /// Loads `explicit` if given (it must exist), else the default config
    /// location if present, else built-in defaults.
    pub fn load(explicit: Option<&Utf8Path>) -> Result<Self> {
        let defaults = EnvDefaults::from_env();
        if let Some(path) = explicit {
            return Self::load_from_path(path, &defaults);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load_from_path(&path, &defaults),
            _ => Self::from_raw(RawConfig::default(), None, &defaults),
        }
    }

    pub fn load_from_path(path: &Utf8Path, defaults: &EnvDefaults) -> Result<Self> {
        let data = fs_err::read_to_string(path).with_context(|| format!("reading config {path}"))?;
        let config_dir = path.parent().unwrap_or_else(|| Utf8Path::new("."));
        Self::from_toml(&data, Some(config_dir), defaults)
            .with_context(|| format!("parsing {path}"))
    }

    pub fn from_toml(
        data: &str,
        config_dir: Option<&Utf8Path>,
        defaults: &EnvDefaults,
    ) -> Result<Self> {
        let raw: RawConfig = toml::from_str(data)?;
        Self::from_raw(raw, config_dir, defaults)
    }

    fn from_raw(
        raw: RawConfig,
        config_dir: Option<&Utf8Path>,
        defaults: &EnvDefaults,
    ) -> Result<Self> {
        let base = config_dir.unwrap_or_else(|| Utf8Path::new("."));
        let paths = raw.paths.unwrap_or_default();
        let install = raw.install.unwrap_or_default();

        let home = paths
            .home
            .or_else(|| defaults.home.clone())
            .filter(|h| !h.is_empty())
            .map(|h| resolve_path(base, Utf8PathBuf::from(h)))
            .ok_or_else(|| anyhow!("HOME is not set and paths.home is not configured"))?;
        let resolve = |value: Option<String>, fallback: Utf8PathBuf| match value {
            Some(v) => resolve_path(base, expand_home(&v, &home)),
            None => fallback,
        };

        let bundle_dir = resolve(paths.bundle_dir, home.join("fgmod"));
        let plugin_dir = resolve(
            paths.plugin_dir,
            defaults
                .plugin_dir
                .clone()
                .map(Utf8PathBuf::from)
                .unwrap_or_else(|| Utf8PathBuf::from(".")),
        );
        let steam_root = resolve(paths.steam_root, home.join(".steam").join("steam"));

        Ok(Self {
            bundle_dir,
            plugin_dir,
            steam_root,
            upscaler_overwrite: install.upscaler_overwrite.unwrap_or(true),
            extractor: install.extractor.unwrap_or_else(|| "7z".to_string()),
            extract_timeout: install
                .extract_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_EXTRACT_TIMEOUT),
            home,
        })
    }

    pub fn bundle(&self) -> BundleStore {
        BundleStore::new(&self.bundle_dir)
    }

    pub fn source(&self) -> BundleSource {
        BundleSource::from_plugin_dir(&self.plugin_dir)
    }
}

fn default_config_path() -> Option<Utf8PathBuf> {
    let base = env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|v| !v.is_empty())
        .map(Utf8PathBuf::from)
        .or_else(|| {
            env::var("HOME")
                .ok()
                .map(|h| Utf8PathBuf::from(h).join(".config"))
        })?;
    Some(base.join("fgmod").join(CONFIG_FILE))
}

fn resolve_path(base: &Utf8Path, candidate: Utf8PathBuf) -> Utf8PathBuf {
    if candidate.is_absolute() {
        candidate
    } else {
        base.join(candidate)
    }
}
