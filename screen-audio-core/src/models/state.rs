use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Capture worker state machine.
///
/// ```text
/// idle → initializing → running ⇄ paused
///              ↓           ↓        ↓
///           stopped ← stopping ←────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WorkerState {
    Idle = 0,
    Initializing = 1,
    Running = 2,
    Paused = 3,
    Stopping = 4,
    Stopped = 5,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Initializing,
            2 => Self::Running,
            3 => Self::Paused,
            4 => Self::Stopping,
            5 => Self::Stopped,
            _ => Self::Idle,
        }
    }
}

/// Per-session flags shared by the facade and the worker thread.
///
/// A fresh set is allocated for every `start()`, so a worker detached after
/// a shutdown timeout can never observe or disturb a later session.
#[derive(Debug)]
pub struct CaptureFlags {
    running: AtomicBool,
    paused: AtomicBool,
    stop_requested: AtomicBool,
    state: AtomicU8,
}

impl CaptureFlags {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
            state: AtomicU8::new(WorkerState::Idle as u8),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Returns the previous value.
    pub fn set_paused(&self, paused: bool) -> bool {
        self.paused.swap(paused, Ordering::SeqCst)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

impl Default for CaptureFlags {
    fn default() -> Self {
        Self::new()
    }
}
