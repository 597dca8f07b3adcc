use std::sync::Arc;

use crate::models::device::{AudioDevice, AudioSource};
use crate::models::format::AudioFormat;
use crate::traits::listener::CaptureListener;

/// Public contract of an audio capture engine.
///
/// Configure with `set_audio_source` / `set_device` while stopped, then
/// `start()`. A single engine can run any number of sessions back to back.
pub trait AudioCaptureEngine: Send {
    /// Backend name, e.g. "wasapi".
    fn backend_name(&self) -> &'static str;

    fn set_listener(&mut self, listener: Arc<dyn CaptureListener>);

    /// Ignored while running. Re-probes the format on success.
    fn set_audio_source(&mut self, source: AudioSource);

    fn audio_source(&self) -> AudioSource;

    /// Microphone device id, `None` for the platform default. Ignored while running.
    fn set_device(&mut self, device_id: Option<String>);

    fn device(&self) -> Option<&str>;

    /// Render endpoint used for loopback, `None` for the platform default.
    fn set_loopback_device(&mut self, device_id: Option<String>);

    /// Valid after configuration, authoritative once `start()` succeeds.
    fn audio_format(&self) -> AudioFormat;

    /// Launch capture. Blocks for at most the configured start timeout.
    fn start(&mut self) -> bool;

    /// Idempotent, bounded by the configured stop timeout.
    fn stop(&mut self);

    fn pause(&self);

    fn resume(&self);

    fn is_running(&self) -> bool;

    fn is_paused(&self) -> bool;

    fn available_input_devices(&self) -> Vec<AudioDevice>;

    fn available_loopback_devices(&self) -> Vec<AudioDevice>;

    fn default_input_device(&self) -> Option<String>;
}
