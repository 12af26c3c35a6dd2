//! OptiScaler bundle management and game-directory patching.
//!
//! [`bundle`] builds the canonical mod directory from the plugin's archive,
//! [`engine`] overlays it onto a game directory and takes it off again, and
//! [`presence`] answers "is it there?" without touching anything.

pub mod bundle;
pub mod engine;
pub mod error;
pub mod extract;
pub mod fsops;
pub mod ini;
pub mod layout;
pub mod manifest;
pub mod presence;
pub mod target;

pub use bundle::{BundleInstaller, BundleSource, BundleStore, InstallOptions, InstallReport};
pub use engine::{ConfigAction, PatchEngine, PatchReport, UnpatchReport};
pub use error::{FgmodError, Result};
pub use extract::{ExtractOutput, Extractor, SevenZip, DEFAULT_EXTRACT_TIMEOUT};
pub use manifest::PatchManifest;
pub use presence::{bundle_installed, inspect_target, target_patched, TargetStatus};
pub use target::{expand_home, TargetDir};
