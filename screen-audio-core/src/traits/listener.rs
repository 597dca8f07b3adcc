/// Event sink for a capture engine.
///
/// All methods are called from the capture worker thread, never the thread
/// that called `start()`. Implementations should hand off to their own
/// thread if they do real work.
pub trait CaptureListener: Send + Sync {
    /// One produced (or mixed) block of 16-bit PCM and its capture time in
    /// milliseconds since the session started, paused spans excluded.
    fn on_audio_data(&self, data: &[u8], timestamp_ms: u64);

    /// Fatal error. The engine is no longer running when this returns.
    fn on_error(&self, message: &str);

    /// Non-fatal degradation, e.g. a source was dropped.
    fn on_warning(&self, message: &str);

    /// A device disappeared mid-capture. Capture does not recover on its own.
    fn on_device_lost(&self);

    /// Advisory peak level of the last emitted block, 0.0 to 1.0.
    fn on_level_changed(&self, _level: f32) {}
}

/// Listener that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullListener;

impl CaptureListener for NullListener {
    fn on_audio_data(&self, _data: &[u8], _timestamp_ms: u64) {}
    fn on_error(&self, _message: &str) {}
    fn on_warning(&self, _message: &str) {}
    fn on_device_lost(&self) {}
}
