use fgmod_core::{expand_home, inspect_target, FgmodError, PatchEngine, TargetDir};
use tracing::{error, info};

use crate::config::FgmodConfig;
use crate::response::Response;

#[derive(Debug, Clone, Copy)]
enum Direction {
    Patch,
    Unpatch,
}

impl Direction {
    fn verb(self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Unpatch => "unpatch",
        }
    }

    fn gerund(self) -> &'static str {
        match self {
            Self::Patch => "patching",
            Self::Unpatch => "unpatching",
        }
    }
}

pub fn patch(cfg: &FgmodConfig, directory: &str) -> Response {
    let target = match resolve(cfg, directory, Direction::Patch) {
        Ok(target) => target,
        Err(response) => return response,
    };
    let bundle = cfg.bundle();
    match PatchEngine::new(&bundle).patch(&target) {
        Ok(report) => Response::success()
            .with_message(format!("OptiScaler files copied to {}", target.path()))
            .with_report(&report),
        Err(err) => failure(err, Direction::Patch),
    }
}

pub fn unpatch(cfg: &FgmodConfig, directory: &str) -> Response {
    let target = match resolve(cfg, directory, Direction::Unpatch) {
        Ok(target) => target,
        Err(response) => return response,
    };
    let bundle = cfg.bundle();
    match PatchEngine::new(&bundle).unpatch(&target) {
        Ok(report) => Response::success()
            .with_message(format!("OptiScaler files removed from {}", target.path()))
            .with_report(&report),
        Err(err) => failure(err, Direction::Unpatch),
    }
}

/// Read-only view of a game directory; needs no write access.
pub fn status(cfg: &FgmodConfig, directory: &str) -> Response {
    let dir = expand_home(directory, &cfg.home);
    if !dir.exists() {
        return Response::error(FgmodError::TargetMissing(dir).to_string());
    }
    if !dir.is_dir() {
        return Response::error(FgmodError::NotADirectory(dir).to_string());
    }
    let status = inspect_target(&dir);
    info!(target = %dir, patched = status.patched, "inspected target");
    Response {
        exists: Some(status.patched),
        backups: Some(status.backups.clone()),
        ..Response::success().with_report(&status)
    }
}

fn resolve(cfg: &FgmodConfig, directory: &str, direction: Direction) -> Result<TargetDir, Response> {
    TargetDir::resolve(directory, &cfg.home).map_err(|err| {
        error!(directory, error = %err, "{} validation failed", direction.verb());
        Response::error(err.to_string())
    })
}

fn failure(err: FgmodError, direction: Direction) -> Response {
    match err {
        FgmodError::BundleNotInstalled | FgmodError::MissingBundleFile(_) => {
            error!(error = %err, "bundle not usable for {}", direction.gerund());
            Response::error(err.to_string())
        }
        err if err.is_permission() => {
            error!(error = %err, "{} permission error", direction.verb());
            Response::error(format!(
                "Permission error while {}: {err}",
                direction.gerund()
            ))
        }
        err => {
            error!(error = ?err, "{} failed", direction.verb());
            Response::error(format!("Manual {} failed: {err}", direction.verb()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_errors_name_the_direction() {
        let err = FgmodError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let response = failure(err, Direction::Unpatch);
        assert_eq!(
            response.message.as_deref(),
            Some("Permission error while unpatching: denied")
        );
    }

    #[test]
    fn other_errors_are_manual_failures() {
        let err = FgmodError::from(std::io::Error::other("disk on fire"));
        let response = failure(err, Direction::Patch);
        assert_eq!(
            response.message.as_deref(),
            Some("Manual patch failed: disk on fire")
        );
    }

    #[test]
    fn missing_bundle_is_reported_verbatim() {
        let response = failure(FgmodError::BundleNotInstalled, Direction::Patch);
        assert!(response.is_error());
        assert_eq!(
            response.message.as_deref(),
            Some("OptiScaler bundle not installed. Run Install first.")
        );
    }
}
