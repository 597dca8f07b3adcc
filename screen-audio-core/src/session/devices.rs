//! Caller-thread device queries: enumeration and format probing.
//!
//! Both go through the backend's transient native session and never touch
//! the capture worker.

use crate::models::device::{normalize_default, AudioDevice, SourceKind};
use crate::models::error::CaptureError;
use crate::models::format::{AudioFormat, NativeFormatInfo};
use crate::traits::backend::AudioBackend;

/// Enumerate devices for a source class. Failures log and yield an empty list.
pub fn list_devices<B: AudioBackend + ?Sized>(backend: &B, kind: SourceKind) -> Vec<AudioDevice> {
    match backend.list_devices(kind) {
        Ok(devices) => normalize_default(devices),
        Err(e) => {
            log::warn!("Failed to enumerate {} devices via {}: {}", kind, backend.name(), e);
            Vec::new()
        }
    }
}

/// Probe a device's native format and derive the 16-bit output format.
pub fn probe_format<B: AudioBackend + ?Sized>(
    backend: &B,
    kind: SourceKind,
    device_id: Option<&str>,
) -> Result<(NativeFormatInfo, AudioFormat), CaptureError> {
    let native = backend.probe(kind, device_id)?;
    if native.channels == 0 || native.sample_rate == 0 {
        return Err(CaptureError::UnsupportedFormat(native.to_string()));
    }
    Ok((native, native.output_format()))
}
