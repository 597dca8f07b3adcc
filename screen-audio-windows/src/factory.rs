//! Engine factory: hands out the native engine for the current platform.

use screen_audio_core::{AudioCaptureEngine, EngineConfig};

/// Whether this build has a native capture backend.
pub fn is_native_engine_available() -> bool {
    cfg!(target_os = "windows")
}

/// Create the native engine with default settings, or `None` on platforms
/// without a backend.
pub fn create_engine() -> Option<Box<dyn AudioCaptureEngine>> {
    create_engine_with_config(EngineConfig::default())
}

#[cfg(target_os = "windows")]
pub fn create_engine_with_config(config: EngineConfig) -> Option<Box<dyn AudioCaptureEngine>> {
    use screen_audio_core::NativeCaptureEngine;

    use crate::backend::WasapiBackend;

    log::debug!("Creating WASAPI capture engine");
    Some(Box::new(NativeCaptureEngine::with_config(WasapiBackend, config)))
}

#[cfg(not(target_os = "windows"))]
pub fn create_engine_with_config(_config: EngineConfig) -> Option<Box<dyn AudioCaptureEngine>> {
    log::info!("No native audio capture backend on this platform");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_matches_availability() {
        let engine = create_engine();
        assert_eq!(engine.is_some(), is_native_engine_available());
    }

    #[test]
    fn created_engine_starts_idle() {
        if let Some(engine) = create_engine() {
            assert_eq!(engine.backend_name(), "wasapi");
            assert!(!engine.is_running());
            assert!(!engine.is_paused());
        }
    }
}
