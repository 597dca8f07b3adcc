//! # screen-audio-core
//!
//! Platform-agnostic audio capture engine for screen recording.
//!
//! Records a microphone, system audio (loopback), or both, converts every
//! native sample encoding to 16-bit PCM, mixes the two sources when both are
//! active, and delivers timestamped buffers to a `CaptureListener`.
//! Platform backends (WASAPI, ...) implement `AudioBackend` and plug into
//! the generic `NativeCaptureEngine`.
//!
//! ## Architecture
//!
//! ```text
//! screen-audio-core (this crate)
//! ├── traits/       ← AudioBackend, CaptureStream, CaptureListener, AudioCaptureEngine
//! ├── models/       ← AudioFormat, AudioDevice, CaptureError, EngineConfig
//! ├── processing/   ← format converter, StreamMixer, level metering
//! └── session/      ← NativeCaptureEngine, capture worker, timing, device queries
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types at crate root for convenience.
pub use models::config::EngineConfig;
pub use models::device::{AudioDevice, AudioSource, SourceKind};
pub use models::diagnostics::CaptureDiagnostics;
pub use models::error::CaptureError;
pub use models::format::{AudioFormat, NativeFormatInfo};
pub use models::state::WorkerState;
pub use processing::mixer::StreamMixer;
pub use session::engine::NativeCaptureEngine;
pub use session::timing::TimingController;
pub use traits::backend::{AudioBackend, BackendSession, CaptureStream, NativePacket};
pub use traits::engine::AudioCaptureEngine;
pub use traits::listener::{CaptureListener, NullListener};
