use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{info, warn};
use which::which;

use crate::error::{FgmodError, Result};

pub const DEFAULT_EXTRACT_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Default)]
pub struct ExtractOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Unpacks an archive into a directory.
pub trait Extractor {
    fn extract(&self, archive: &Utf8Path, dest: &Utf8Path) -> Result<ExtractOutput>;
}

/// Drives an external `7z` binary.
#[derive(Debug, Clone)]
pub struct SevenZip {
    binary: Utf8PathBuf,
    timeout: Duration,
}

impl SevenZip {
    pub fn detect(program: &str, timeout: Duration) -> Result<Self> {
        match which(program) {
            Ok(path) => {
                let binary = Utf8PathBuf::from_path_buf(path)
                    .unwrap_or_else(|p| Utf8PathBuf::from(p.to_string_lossy().to_string()));
                Ok(Self { binary, timeout })
            }
            Err(_) => Err(FgmodError::ExtractorNotFound(program.to_string())),
        }
    }

    pub fn with_binary(binary: impl Into<Utf8PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &Utf8Path {
        &self.binary
    }

    fn args(archive: &Utf8Path, dest: &Utf8Path) -> Vec<String> {
        vec![
            "x".to_string(),
            "-y".to_string(),
            format!("-o{dest}"),
            archive.to_string(),
        ]
    }
}

impl Extractor for SevenZip {
    fn extract(&self, archive: &Utf8Path, dest: &Utf8Path) -> Result<ExtractOutput> {
        let args = Self::args(archive, dest);
        info!(binary = %self.binary, ?args, "running extraction command");

        let mut child = Command::new(&self.binary)
            .args(&args)
            // Host runtimes inject their own libraries; 7z must not pick them up.
            .env("LD_LIBRARY_PATH", "")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let waited = wait_with_deadline(&mut child, self.timeout);
        let output = ExtractOutput {
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        };
        let status = waited?;

        let Some(status) = status else {
            warn!(timeout_secs = self.timeout.as_secs(), "extraction timed out");
            return Err(FgmodError::ExtractTimeout(self.timeout.as_secs()));
        };
        info!(code = ?status.code(), stdout = %output.stdout, "extraction finished");
        if !output.stderr.is_empty() {
            info!(stderr = %output.stderr, "extraction stderr");
        }
        if !status.success() {
            return Err(FgmodError::Extract {
                status: status.code(),
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Waits for `child`, killing it once `timeout` elapses. `None` means killed.
fn wait_with_deadline(
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<std::process::ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(Some(status)),
            Ok(None) => {}
            Err(err) => {
                reap(child);
                return Err(err.into());
            }
        }
        if Instant::now() >= deadline {
            reap(child);
            return Ok(None);
        }
        thread::sleep(Duration::from_millis(25));
    }
}

/// Kills the child and waits for it, so its pipes close and the drain threads finish.
fn reap(child: &mut Child) {
    if let Err(err) = child.kill() {
        warn!(error = %err, "failed to kill extractor");
    }
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_follow_7z_extract_shape() {
        let args = SevenZip::args(
            Utf8Path::new("/plugin/bin/OptiScaler_0.9.0.7z"),
            Utf8Path::new("/home/deck/fgmod"),
        );
        assert_eq!(
            args,
            vec!["x", "-y", "-o/home/deck/fgmod", "/plugin/bin/OptiScaler_0.9.0.7z"]
        );
    }

    #[test]
    fn detect_reports_missing_binary() {
        let err = SevenZip::detect("definitely-not-a-7z-binary", DEFAULT_EXTRACT_TIMEOUT)
            .unwrap_err();
        assert!(matches!(err, FgmodError::ExtractorNotFound(_)));
    }

    #[cfg(unix)]
    fn script(dir: &Utf8Path, body: &str) -> Utf8PathBuf {
        let path = dir.join("fake-7z");
        fs_err::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        crate::fsops::set_executable(&path).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn failing_extractor_surfaces_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        let bin = script(&dir, "echo 'ERROR: Data Error' >&2\nexit 2");

        let err = SevenZip::with_binary(bin, Duration::from_secs(30))
            .extract(Utf8Path::new("a.7z"), &dir)
            .unwrap_err();

        match err {
            FgmodError::Extract { status, stderr } => {
                assert_eq!(status, Some(2));
                assert_eq!(stderr.trim(), "ERROR: Data Error");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn hung_extractor_is_killed() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();
        let bin = script(&dir, "exec sleep 30");

        let err = SevenZip::with_binary(bin, Duration::from_millis(200))
            .extract(Utf8Path::new("a.7z"), &dir)
            .unwrap_err();

        assert!(matches!(err, FgmodError::ExtractTimeout(_)));
    }

    #[cfg(unix)]
    #[test]
    fn reap_leaves_no_running_child() {
        let mut child = Command::new("sleep")
            .arg("30")
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();
        let stdout = drain(child.stdout.take());

        reap(&mut child);

        assert!(child.try_wait().unwrap().is_some());
        assert_eq!(stdout.join().unwrap(), "");
    }
}
