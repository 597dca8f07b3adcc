use crate::models::device::{AudioDevice, SourceKind};
use crate::models::error::CaptureError;
use crate::models::format::NativeFormatInfo;

/// One block of native audio lent out by a `CaptureStream`.
///
/// `data` borrows the backend's buffer and is only valid inside the sink
/// callback. When `silent` is set the backend may hand out an empty slice;
/// consumers must synthesize silence from `frames` instead of reading it.
#[derive(Debug, Clone, Copy)]
pub struct NativePacket<'a> {
    pub data: &'a [u8],
    pub frames: u32,
    pub silent: bool,
}

/// Platform audio backend (WASAPI, Core Audio, ...).
///
/// `list_devices` and `probe` run on the caller's thread and must open and
/// close their own short-lived native session. Everything long-lived goes
/// through `open_session`, which is only called on the capture worker.
pub trait AudioBackend: Send + Sync + 'static {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Endpoints for a source class. Microphone lists capture endpoints,
    /// system audio lists render endpoints usable in loopback mode.
    fn list_devices(&self, kind: SourceKind) -> Result<Vec<AudioDevice>, CaptureError>;

    /// Native mix format of a device (`None` = platform default) without
    /// starting capture.
    fn probe(
        &self,
        kind: SourceKind,
        device_id: Option<&str>,
    ) -> Result<NativeFormatInfo, CaptureError>;

    /// Open the per-thread native context. Called on the worker thread; the
    /// returned session and every stream it opens stay on that thread.
    fn open_session(&self) -> Result<Box<dyn BackendSession>, CaptureError>;
}

/// Native context owned by the capture worker thread.
///
/// Dropping it releases the context; streams opened from it must be
/// dropped first.
pub trait BackendSession {
    fn open_stream(
        &mut self,
        kind: SourceKind,
        device_id: Option<&str>,
    ) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

/// An opened native capture client.
pub trait CaptureStream {
    fn format(&self) -> NativeFormatInfo;

    fn start(&mut self) -> Result<(), CaptureError>;

    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Pop at most one native packet, lend it to `sink`, then release it.
    ///
    /// Returns `Ok(false)` when nothing was pending. A vanished endpoint is
    /// reported as `CaptureError::DeviceLost`.
    fn read_packet(
        &mut self,
        sink: &mut dyn FnMut(NativePacket<'_>),
    ) -> Result<bool, CaptureError>;
}
