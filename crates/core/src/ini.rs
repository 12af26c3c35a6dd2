use camino::Utf8Path;
use fs_err as fs;
use regex::Regex;
use tracing::{info, warn};

use crate::error::Result;

/// Keys whose `auto` value is replaced in the bundled config.
pub const BUNDLE_DEFAULTS: &[(&str, &str)] = &[
    ("FGType", "nukems"),
    ("Fsr4Update", "true"),
    ("LoadAsiPlugins", "true"),
    ("Path", "plugins"),
];

/// Rewrites `Key=auto` lines for each `(key, value)` pair. Everything else,
/// including comments and line endings, is kept byte for byte.
pub fn replace_auto_values(content: &str, overrides: &[(&str, &str)]) -> String {
    let mut updated = content.to_string();
    for (key, value) in overrides {
        let pattern = format!(r"(?m)^([ \t]*){}[ \t]*=[ \t]*auto\b", regex::escape(key));
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(err) => {
                warn!(key = %key, error = %err, "skipping ini key with unusable pattern");
                continue;
            }
        };
        updated = re
            .replace_all(&updated, |caps: &regex::Captures| {
                format!("{}{key}={value}", &caps[1])
            })
            .into_owned();
    }
    updated
}

/// Applies [`BUNDLE_DEFAULTS`] to the ini at `path`. Returns false when the
/// file does not exist.
pub fn apply_bundle_defaults(path: &Utf8Path) -> Result<bool> {
    if !path.exists() {
        warn!(path = %path, "OptiScaler.ini not found; defaults not applied");
        return Ok(false);
    }
    let content = fs::read_to_string(path)?;
    let updated = replace_auto_values(&content, BUNDLE_DEFAULTS);
    if updated != content {
        fs::write(path, updated)?;
    }
    info!(
        path = %path,
        "set FGType=nukems, Fsr4Update=true, LoadAsiPlugins=true, Path=plugins"
    );
    Ok(true)
}
