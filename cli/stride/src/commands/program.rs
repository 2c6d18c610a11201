//! `stride program`: transfer a built image to the device.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use stride_platform::{Platform, ProgrammerState, ProgrammingSession};

use super::Project;

const STATUS_INTERVAL: Duration = Duration::from_millis(250);

pub fn run(project: &Project, image: Option<&Path>) -> Result<()> {
    let platform = project.platform()?;
    let image = match image {
        Some(path) => path.to_path_buf(),
        None => project.build_dir().join(&platform.config().programming_file),
    };
    program_with(platform.as_ref(), &image)
}

fn program_with(platform: &dyn Platform, image: &Path) -> Result<()> {
    let mut session = ProgrammingSession::new();
    let size = platform
        .load_binary_file(&mut session, image)
        .with_context(|| format!("loading {}", image.display()))?;
    platform.open_usb(&session)?;

    println!(
        "Programming {} ({size} bytes) to {} at {}",
        image.display(),
        platform.id(),
        platform.config().device_address
    );

    let monitor = session.monitor();
    let started = Instant::now();
    let result = thread::scope(|scope| {
        let worker = scope.spawn(|| platform.program_device(&mut session));
        while !worker.is_finished() {
            if monitor.state() == ProgrammerState::Transferring {
                log::debug!(
                    "transferring for {:.1} s, progress {:.0}%",
                    started.elapsed().as_secs_f32(),
                    monitor.progress() * 100.0
                );
            }
            thread::sleep(STATUS_INTERVAL);
        }
        worker.join()
    });

    match result {
        Ok(outcome) => outcome.with_context(|| format!("programming {}", image.display()))?,
        Err(_) => anyhow::bail!("programming thread panicked"),
    }
    println!(
        "Done in {:.1} s ({:.0}%).",
        started.elapsed().as_secs_f32(),
        platform.programming_progress(&session) * 100.0
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use stride_platform::{
        DeployError, HostOs, PlatformResources, Rpi4b, TransferOutput, TransferRequest, Transport,
    };

    struct ScriptedTransport {
        output: &'static str,
    }

    impl Transport for ScriptedTransport {
        fn name(&self) -> &str {
            "scripted"
        }

        fn push(&self, _request: &TransferRequest, _cancel: &AtomicBool) -> Result<TransferOutput, DeployError> {
            Ok(TransferOutput {
                exit_ok: true,
                output: self.output.to_string(),
            })
        }
    }

    fn platform(output: &'static str) -> Rpi4b {
        Rpi4b::new(HostOs::Linux, PlatformResources::empty())
            .unwrap()
            .with_transport(Box::new(ScriptedTransport { output }))
    }

    #[test]
    fn successful_programming() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("kernel84.img");
        std::fs::write(&image, vec![0u8; 512]).unwrap();
        program_with(&platform("Sent 512 bytes\n"), &image).unwrap();
    }

    #[test]
    fn error_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("kernel84.img");
        std::fs::write(&image, vec![0u8; 512]).unwrap();
        let err = program_with(&platform("Error code 1: File not found\n"), &image).unwrap_err();
        assert!(format!("{err:#}").contains("Error code 1"));
    }

    #[test]
    fn missing_image_fails_before_transfer() {
        let dir = tempfile::tempdir().unwrap();
        let err = program_with(&platform(""), &dir.path().join("missing.img")).unwrap_err();
        assert!(err.to_string().contains("loading"));
    }
}
