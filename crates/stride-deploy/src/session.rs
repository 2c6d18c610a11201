//! Per-attempt programming state.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;

/// `binary_size_bytes` value while no image is loaded.
pub const UNKNOWN_SIZE: i64 = -1;

/// Where a programming session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgrammerState {
    Idle,
    Loaded,
    Transferring,
    Succeeded,
    Failed,
}

impl ProgrammerState {
    fn to_u8(self) -> u8 {
        match self {
            ProgrammerState::Idle => 0,
            ProgrammerState::Loaded => 1,
            ProgrammerState::Transferring => 2,
            ProgrammerState::Succeeded => 3,
            ProgrammerState::Failed => 4,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ProgrammerState::Loaded,
            2 => ProgrammerState::Transferring,
            3 => ProgrammerState::Succeeded,
            4 => ProgrammerState::Failed,
            _ => ProgrammerState::Idle,
        }
    }
}

impl fmt::Display for ProgrammerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProgrammerState::Idle => "idle",
            ProgrammerState::Loaded => "loaded",
            ProgrammerState::Transferring => "transferring",
            ProgrammerState::Succeeded => "succeeded",
            ProgrammerState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// State other threads may observe or poke while a transfer runs.
#[derive(Debug)]
struct Shared {
    /// `f32` bits.
    progress: AtomicU32,
    cancel: AtomicBool,
    state: AtomicU8,
}

/// One programming attempt, owned by the caller.
///
/// The session is created empty, filled by `load_binary_file` and driven by
/// `program_device`. Progress, state and the exit request are shared with any
/// [`SessionMonitor`] handed out by [`monitor`](Self::monitor).
#[derive(Debug)]
pub struct ProgrammingSession {
    binary_path: Option<PathBuf>,
    binary_size_bytes: i64,
    shared: Arc<Shared>,
}

impl Default for ProgrammingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgrammingSession {
    pub fn new() -> Self {
        Self {
            binary_path: None,
            binary_size_bytes: UNKNOWN_SIZE,
            shared: Arc::new(Shared {
                progress: AtomicU32::new(0.0f32.to_bits()),
                cancel: AtomicBool::new(false),
                state: AtomicU8::new(ProgrammerState::Idle.to_u8()),
            }),
        }
    }

    pub fn binary_path(&self) -> Option<&Path> {
        self.binary_path.as_deref()
    }

    /// Image size in bytes, or [`UNKNOWN_SIZE`].
    pub fn binary_size_bytes(&self) -> i64 {
        self.binary_size_bytes
    }

    pub fn state(&self) -> ProgrammerState {
        ProgrammerState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Fraction in [0, 1].
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.shared.progress.load(Ordering::Acquire))
    }

    /// Ask a running transfer to stop at its next poll.
    pub fn request_exit(&self) {
        self.shared.cancel.store(true, Ordering::Release);
    }

    /// A handle for watching this session from another thread.
    pub fn monitor(&self) -> SessionMonitor {
        SessionMonitor {
            shared: Arc::clone(&self.shared),
        }
    }

    pub(crate) fn set_loaded(&mut self, path: PathBuf, size: i64) {
        self.binary_path = Some(path);
        self.binary_size_bytes = size;
        self.set_state(ProgrammerState::Loaded);
    }

    pub(crate) fn set_unloaded(&mut self) {
        self.binary_path = None;
        self.binary_size_bytes = UNKNOWN_SIZE;
        self.set_state(ProgrammerState::Idle);
    }

    pub(crate) fn set_state(&self, state: ProgrammerState) {
        self.shared.state.store(state.to_u8(), Ordering::Release);
    }

    pub(crate) fn set_progress(&self, progress: f32) {
        self.shared
            .progress
            .store(progress.clamp(0.0, 1.0).to_bits(), Ordering::Release);
    }

    pub(crate) fn cancel_flag(&self) -> &AtomicBool {
        &self.shared.cancel
    }

    pub(crate) fn clear_exit_request(&self) {
        self.shared.cancel.store(false, Ordering::Release);
    }
}

/// Cloneable read/cancel handle onto a [`ProgrammingSession`].
#[derive(Debug, Clone)]
pub struct SessionMonitor {
    shared: Arc<Shared>,
}

impl SessionMonitor {
    pub fn progress(&self) -> f32 {
        f32::from_bits(self.shared.progress.load(Ordering::Acquire))
    }

    pub fn state(&self) -> ProgrammerState {
        ProgrammerState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    pub fn request_exit(&self) {
        self.shared.cancel.store(true, Ordering::Release);
    }
}
