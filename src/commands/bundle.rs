use std::time::Duration;

use fgmod_core::{
    bundle_installed, BundleInstaller, FgmodError, InstallOptions, InstallReport, SevenZip,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};

use crate::config::FgmodConfig;
use crate::response::Response;

pub fn install(cfg: &FgmodConfig, skip_upscaler_overwrite: bool) -> Response {
    let options = InstallOptions {
        upscaler_overwrite: cfg.upscaler_overwrite && !skip_upscaler_overwrite,
    };
    let pb = progress_spinner("installing OptiScaler bundle");
    let result = run_install(cfg, options, &pb);
    pb.finish_and_clear();

    match result {
        Ok(report) => {
            info!(version = %report.version, bundle = %cfg.bundle_dir, "install complete");
            Response::success()
                .with_output(format!(
                    "Successfully installed OptiScaler {} with all necessary components! \
                     You can now replace DLSS with FSR Frame Gen!",
                    report.version
                ))
                .with_version(report.version.clone())
                .with_report(&report)
        }
        Err(err) => {
            error!(error = %err, "install failed");
            Response::error(format!("OptiScaler extraction failed: {err}"))
        }
    }
}

fn run_install(
    cfg: &FgmodConfig,
    options: InstallOptions,
    pb: &ProgressBar,
) -> Result<InstallReport, FgmodError> {
    let extractor = SevenZip::detect(&cfg.extractor, cfg.extract_timeout)?;
    pb.set_message(format!("extracting with {}", extractor.binary()));
    let store = cfg.bundle();
    let source = cfg.source();
    BundleInstaller::new(&store, &source, &extractor, options).install()
}

pub fn remove(cfg: &FgmodConfig) -> Response {
    match cfg.bundle().remove() {
        Ok(true) => Response::success().with_output("Successfully removed fgmod directory"),
        Ok(false) => Response::success().with_output("No fgmod directory found to remove"),
        Err(err) => {
            error!(error = %err, bundle = %cfg.bundle_dir, "bundle removal failed");
            Response::error(format!("Uninstall failed: {err}")).with_output(err.to_string())
        }
    }
}

pub fn check(cfg: &FgmodConfig) -> Response {
    let exists = bundle_installed(&cfg.bundle());
    info!(bundle = %cfg.bundle_dir, exists, "checked bundle");
    Response {
        exists: Some(exists),
        ..Response::default()
    }
}

fn progress_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message(label.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
