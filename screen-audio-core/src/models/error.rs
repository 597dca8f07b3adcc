use thiserror::Error;

use super::format::AudioFormat;

/// Errors raised inside the capture subsystem.
///
/// The engine facade never hands these across the thread boundary; they
/// surface as a `false` return from `start()` or as listener events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("no audio source configured")]
    NoSourceConfigured,

    #[error("capture already running")]
    AlreadyRunning,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("device lost")]
    DeviceLost,

    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    #[error("format mismatch: microphone {mic}, loopback {loopback}")]
    FormatMismatch { mic: AudioFormat, loopback: AudioFormat },

    #[error("unsupported native format: {0}")]
    UnsupportedFormat(String),

    #[error("timeout")]
    Timeout,

    #[error("native audio error: {0}")]
    Native(String),
}
