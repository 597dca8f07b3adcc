//! # screen-audio-windows
//!
//! Windows WASAPI backend for screen-audio.
//!
//! Provides:
//! - `WasapiBackend`: `AudioBackend` over shared-mode WASAPI, microphone
//!   via capture endpoints and system audio via loopback on render endpoints
//! - `DeviceEnumerator`: endpoint enumeration via the MMDevice API
//! - `factory`: `create_engine()`, which returns `None` off Windows
//!
//! ## Usage
//! ```ignore
//! use screen_audio_core::AudioSource;
//! use screen_audio_windows::create_engine;
//!
//! let mut engine = create_engine().expect("native backend");
//! engine.set_audio_source(AudioSource::Both);
//! if engine.start() {
//!     // buffers arrive on the listener
//!     engine.stop();
//! }
//! ```

#[cfg(target_os = "windows")]
mod com;
#[cfg(target_os = "windows")]
mod format;
#[cfg(target_os = "windows")]
mod stream;

#[cfg(target_os = "windows")]
pub mod backend;
#[cfg(target_os = "windows")]
pub mod device_enumerator;
pub mod factory;

#[cfg(target_os = "windows")]
pub use backend::WasapiBackend;
#[cfg(target_os = "windows")]
pub use device_enumerator::DeviceEnumerator;
pub use factory::{create_engine, create_engine_with_config, is_native_engine_available};
