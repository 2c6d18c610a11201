//! Image transports.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{DeployError, Result};

/// How often a running transport process is checked for exit, timeout and
/// exit requests.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One image push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Directory the transport runs in; `file_name` is relative to it.
    pub working_dir: PathBuf,
    pub file_name: String,
    /// Device address.
    pub address: String,
    pub timeout: Duration,
}

/// What a finished transport reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutput {
    /// Whether the transport exited successfully.
    pub exit_ok: bool,
    /// Combined stdout and stderr.
    pub output: String,
}

/// Moves an image onto a device.
pub trait Transport: Send + Sync {
    /// Short name for log messages.
    fn name(&self) -> &str;

    /// Handshake before the first push.
    fn open(&self) -> Result<()> {
        Ok(())
    }

    /// Push one file. Blocks until the transport finishes, the timeout
    /// elapses (`TimedOut`) or `cancel` is set (`Cancelled`).
    fn push(&self, request: &TransferRequest, cancel: &AtomicBool) -> Result<TransferOutput>;

    /// Whether the device has finished erasing before the write. Transports
    /// that write without erasing are always done.
    fn is_erase_done(&self) -> bool {
        true
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn open(&self) -> Result<()> {
        (**self).open()
    }

    fn push(&self, request: &TransferRequest, cancel: &AtomicBool) -> Result<TransferOutput> {
        (**self).push(request, cancel)
    }

    fn is_erase_done(&self) -> bool {
        (**self).is_erase_done()
    }
}

/// Binary-mode TFTP put through the system `tftp` client.
#[derive(Debug, Clone)]
pub struct TftpTransport {
    program: String,
}

impl Default for TftpTransport {
    fn default() -> Self {
        Self {
            program: "tftp".into(),
        }
    }
}

impl TftpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different client executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments of `tftp -m binary <address> -c put <file>`.
    pub fn arguments(request: &TransferRequest) -> Vec<String> {
        vec![
            "-m".into(),
            "binary".into(),
            request.address.clone(),
            "-c".into(),
            "put".into(),
            request.file_name.clone(),
        ]
    }
}

impl Transport for TftpTransport {
    fn name(&self) -> &str {
        "tftp"
    }

    fn push(&self, request: &TransferRequest, cancel: &AtomicBool) -> Result<TransferOutput> {
        let args = Self::arguments(request);
        log::info!(
            "running {} {} in {}",
            self.program,
            args.join(" "),
            request.working_dir.display()
        );

        let handle = duct::cmd(self.program.as_str(), &args)
            .dir(&request.working_dir)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .start()
            .map_err(|source| DeployError::Launch {
                program: self.program.clone(),
                source,
            })?;

        // `None` when the timeout is too large to represent: wait without a deadline.
        let deadline = Instant::now().checked_add(request.timeout);
        loop {
            if let Some(output) = handle.try_wait()? {
                return Ok(TransferOutput {
                    exit_ok: output.status.success(),
                    output: String::from_utf8_lossy(&output.stdout).into_owned(),
                });
            }
            if cancel.load(Ordering::Acquire) {
                handle.kill()?;
                return Err(DeployError::Cancelled);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                handle.kill()?;
                return Err(DeployError::TimedOut {
                    secs: request.timeout.as_secs(),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dir: &std::path::Path, timeout: Duration) -> TransferRequest {
        TransferRequest {
            working_dir: dir.to_path_buf(),
            file_name: "kernel84.img".into(),
            address: "192.168.1.27".into(),
            timeout,
        }
    }

    #[test]
    fn tftp_arguments() {
        let req = request(std::path::Path::new("/build"), Duration::from_secs(60));
        assert_eq!(
            TftpTransport::arguments(&req).join(" "),
            "-m binary 192.168.1.27 -c put kernel84.img"
        );
    }

    #[test]
    fn missing_client_is_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let transport = TftpTransport::with_program("/nonexistent/tftp-client");
        let err = transport
            .push(&request(dir.path(), Duration::from_secs(1)), &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, DeployError::Launch { .. }));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Write an executable shell script standing in for the tftp client.
        fn fake_client(dir: &std::path::Path, body: &str) -> String {
            let path = dir.join("fake-tftp");
            std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path.to_string_lossy().into_owned()
        }

        #[test]
        fn captures_output_and_status() {
            let dir = tempfile::tempdir().unwrap();
            let client = fake_client(dir.path(), "echo \"put $6 to $3\"; echo oops >&2; exit 0");
            let out = TftpTransport::with_program(client)
                .push(&request(dir.path(), Duration::from_secs(10)), &AtomicBool::new(false))
                .unwrap();
            assert!(out.exit_ok);
            assert!(out.output.contains("put kernel84.img to 192.168.1.27"));
            assert!(out.output.contains("oops"));
        }

        #[test]
        fn nonzero_exit_reported() {
            let dir = tempfile::tempdir().unwrap();
            let client = fake_client(dir.path(), "exit 3");
            let out = TftpTransport::with_program(client)
                .push(&request(dir.path(), Duration::from_secs(10)), &AtomicBool::new(false))
                .unwrap();
            assert!(!out.exit_ok);
        }

        #[test]
        fn unbounded_timeout_waits_for_exit() {
            let dir = tempfile::tempdir().unwrap();
            let client = fake_client(dir.path(), "echo done; exit 0");
            let out = TftpTransport::with_program(client)
                .push(
                    &request(dir.path(), Duration::from_secs(u64::MAX)),
                    &AtomicBool::new(false),
                )
                .unwrap();
            assert!(out.exit_ok);
            assert!(out.output.contains("done"));
        }

        #[test]
        fn slow_client_times_out() {
            let dir = tempfile::tempdir().unwrap();
            let client = fake_client(dir.path(), "exec sleep 5");
            let started = Instant::now();
            let err = TftpTransport::with_program(client)
                .push(&request(dir.path(), Duration::from_millis(200)), &AtomicBool::new(false))
                .unwrap_err();
            assert!(matches!(err, DeployError::TimedOut { .. }));
            assert!(started.elapsed() < Duration::from_secs(4));
        }

        #[test]
        fn cancel_kills_client() {
            let dir = tempfile::tempdir().unwrap();
            let client = fake_client(dir.path(), "exec sleep 5");
            let err = TftpTransport::with_program(client)
                .push(&request(dir.path(), Duration::from_secs(10)), &AtomicBool::new(true))
                .unwrap_err();
            assert!(matches!(err, DeployError::Cancelled));
        }
    }
}
