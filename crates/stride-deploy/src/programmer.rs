//! Device programming state machine.
//!
//! `Idle → Loaded → Transferring → Succeeded | Failed`. A finished session
//! may be programmed again without reloading.

use std::path::{Path, PathBuf};
use std::time::Duration;

use stride_targets::PlatformConfig;

use crate::error::{DeployError, Result};
use crate::session::{ProgrammerState, ProgrammingSession, UNKNOWN_SIZE};
use crate::transport::{TransferRequest, Transport};

/// Token whose presence in transport output marks a failed transfer even when
/// the client exits successfully.
const ERROR_TOKEN: &str = "Error";

/// Programs images onto a device through a [`Transport`].
#[derive(Debug)]
pub struct DeviceProgrammer<T> {
    transport: T,
    address: String,
    image_name: String,
    timeout: Duration,
}

impl<T: Transport> DeviceProgrammer<T> {
    pub fn new(transport: T, address: impl Into<String>, image_name: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            address: address.into(),
            image_name: image_name.into(),
            timeout,
        }
    }

    /// Programmer using the device address, legacy image name and timeout of `config`.
    pub fn from_config(transport: T, config: &PlatformConfig) -> Self {
        Self::new(
            transport,
            config.device_address.clone(),
            config.legacy_image_name.clone(),
            Duration::from_secs(config.transfer_timeout_secs),
        )
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Record the image at `path` and its size.
    ///
    /// On failure the session is reset: no path and a size of [`UNKNOWN_SIZE`].
    pub fn load_binary_file(&self, session: &mut ProgrammingSession, path: &Path) -> Result<u64> {
        if session.state() == ProgrammerState::Transferring {
            return Err(DeployError::InvalidState {
                action: "load an image",
                state: ProgrammerState::Transferring,
            });
        }
        let meta = match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => {
                session.set_unloaded();
                return Err(DeployError::ImageIo {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a regular file"),
                });
            }
            Err(source) => {
                log::error!("unable to load image {}: {source}", path.display());
                session.set_unloaded();
                return Err(DeployError::ImageIo {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let size = meta.len();
        let recorded = i64::try_from(size).unwrap_or(UNKNOWN_SIZE);
        session.set_loaded(path.to_path_buf(), recorded);
        log::debug!("loaded image {} ({size} bytes)", path.display());
        Ok(size)
    }

    /// Transport handshake ahead of a transfer. Accepted in every state and
    /// leaves the session untouched.
    pub fn open_usb(&self, _session: &ProgrammingSession) -> Result<()> {
        self.transport.open()
    }

    /// Push the loaded image to the device, blocking until done.
    ///
    /// Progress is 0.0 while transferring and 1.0 only after a clean finish.
    pub fn program_device(&self, session: &mut ProgrammingSession) -> Result<()> {
        let working_dir = match (session.state(), session.binary_path()) {
            (ProgrammerState::Idle, _) | (_, None) => {
                return Err(DeployError::InvalidState {
                    action: "program",
                    state: session.state(),
                })
            }
            (ProgrammerState::Transferring, _) => {
                return Err(DeployError::InvalidState {
                    action: "program",
                    state: ProgrammerState::Transferring,
                })
            }
            (_, Some(path)) => image_folder(path),
        };

        session.set_progress(0.0);
        session.clear_exit_request();
        session.set_state(ProgrammerState::Transferring);

        let request = TransferRequest {
            working_dir,
            file_name: self.image_name.clone(),
            address: self.address.clone(),
            timeout: self.timeout,
        };
        match self.run_transfer(&request, session) {
            Ok(output) => {
                log::info!("{} transfer complete:\n{output}", self.transport.name());
                session.set_progress(1.0);
                session.set_state(ProgrammerState::Succeeded);
                Ok(())
            }
            Err(e) => {
                log::error!("programming failed: {e}");
                session.set_state(ProgrammerState::Failed);
                Err(e)
            }
        }
    }

    fn run_transfer(&self, request: &TransferRequest, session: &ProgrammingSession) -> Result<String> {
        if request.address.trim().is_empty() {
            return Err(DeployError::InvalidArgument {
                detail: "device address is empty".into(),
            });
        }
        let result = self.transport.push(request, session.cancel_flag())?;
        if !result.exit_ok {
            log::error!("{} output:\n{}", self.transport.name(), result.output);
            return Err(DeployError::Transfer {
                detail: format!("{} exited with failure", self.transport.name()),
            });
        }
        if let Some(line) = result.output.lines().find(|l| l.contains(ERROR_TOKEN)) {
            log::error!("{} output:\n{}", self.transport.name(), result.output);
            return Err(DeployError::Transfer {
                detail: line.trim().to_string(),
            });
        }
        Ok(result.output)
    }

    /// Whether the device's erase phase has finished.
    pub fn is_erase_done(&self) -> bool {
        self.transport.is_erase_done()
    }
}

fn image_folder(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
