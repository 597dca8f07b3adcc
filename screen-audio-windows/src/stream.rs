//! WASAPI shared-mode capture stream.
//!
//! One type serves both sources: microphones open a capture endpoint,
//! system audio opens a render endpoint with `AUDCLNT_STREAMFLAGS_LOOPBACK`.

use windows::core::Error as WinError;
use windows::Win32::Media::Audio::{
    IAudioCaptureClient, IAudioClient, IMMDevice, AUDCLNT_BUFFERFLAGS_SILENT,
    AUDCLNT_E_DEVICE_INVALIDATED, AUDCLNT_SHAREMODE_SHARED, AUDCLNT_STREAMFLAGS_LOOPBACK,
    AUDCLNT_STREAMFLAGS_NOPERSIST,
};
use windows::Win32::System::Com::CLSCTX_ALL;

use screen_audio_core::{CaptureError, CaptureStream, NativeFormatInfo, NativePacket, SourceKind};

use crate::com::MixFormat;
use crate::format::{block_align, native_format};

/// Shared-mode buffer duration: 100ms in 100-nanosecond units.
const BUFFER_DURATION: i64 = 1_000_000;

pub struct WasapiStream {
    kind: SourceKind,
    audio_client: IAudioClient,
    capture_client: IAudioCaptureClient,
    format: NativeFormatInfo,
    block_align: usize,
    started: bool,
    // Freed after the clients above.
    _mix_format: MixFormat,
}

impl WasapiStream {
    /// Activate and initialize a capture client on `device`.
    ///
    /// Sequence:
    /// 1. Activate IAudioClient
    /// 2. GetMixFormat
    /// 3. Initialize in shared mode (loopback for system audio)
    /// 4. Get IAudioCaptureClient service
    pub fn open(device: &IMMDevice, kind: SourceKind) -> Result<Self, CaptureError> {
        unsafe {
            let audio_client: IAudioClient = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| native("Activate", e))?;

            let mix_format = MixFormat::from_raw(
                audio_client
                    .GetMixFormat()
                    .map_err(|e| native("GetMixFormat", e))?,
            );
            let format = native_format(mix_format.as_ptr());
            let block_align = block_align(mix_format.as_ptr());

            let mut flags = AUDCLNT_STREAMFLAGS_NOPERSIST;
            if kind == SourceKind::SystemAudio {
                flags |= AUDCLNT_STREAMFLAGS_LOOPBACK;
            }

            audio_client
                .Initialize(
                    AUDCLNT_SHAREMODE_SHARED,
                    flags,
                    BUFFER_DURATION,
                    0,
                    mix_format.as_ptr(),
                    None,
                )
                .map_err(|e| native("IAudioClient::Initialize", e))?;

            let capture_client: IAudioCaptureClient =
                audio_client.GetService().map_err(|e| native("GetService", e))?;

            log::debug!("WASAPI {} stream opened: {} (block align {})", kind, format, block_align);

            Ok(Self {
                kind,
                audio_client,
                capture_client,
                format,
                block_align,
                started: false,
                _mix_format: mix_format,
            })
        }
    }
}

impl CaptureStream for WasapiStream {
    fn format(&self) -> NativeFormatInfo {
        self.format
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        unsafe { self.audio_client.Start() }.map_err(|e| native("IAudioClient::Start", e))?;
        self.started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.started {
            return Ok(());
        }
        self.started = false;
        unsafe { self.audio_client.Stop() }.map_err(|e| native("IAudioClient::Stop", e))
    }

    fn read_packet(
        &mut self,
        sink: &mut dyn FnMut(NativePacket<'_>),
    ) -> Result<bool, CaptureError> {
        unsafe {
            let pending = self
                .capture_client
                .GetNextPacketSize()
                .map_err(|e| native("GetNextPacketSize", e))?;
            if pending == 0 {
                return Ok(false);
            }

            let mut buffer: *mut u8 = std::ptr::null_mut();
            let mut frames: u32 = 0;
            let mut flags: u32 = 0;
            self.capture_client
                .GetBuffer(&mut buffer, &mut frames, &mut flags, None, None)
                .map_err(|e| native("GetBuffer", e))?;

            let silent = flags & (AUDCLNT_BUFFERFLAGS_SILENT.0 as u32) != 0 || buffer.is_null();
            let data: &[u8] = if silent || frames == 0 {
                &[]
            } else {
                std::slice::from_raw_parts(buffer, frames as usize * self.block_align)
            };
            sink(NativePacket { data, frames, silent });

            self.capture_client
                .ReleaseBuffer(frames)
                .map_err(|e| native("ReleaseBuffer", e))?;
        }
        Ok(true)
    }
}

impl Drop for WasapiStream {
    fn drop(&mut self) {
        if self.started {
            if let Err(e) = self.stop() {
                log::warn!("Failed to stop WASAPI {} stream on drop: {}", self.kind, e);
            }
        }
    }
}

/// Map a WASAPI failure, singling out endpoint invalidation.
fn native(call: &str, e: WinError) -> CaptureError {
    if e.code() == AUDCLNT_E_DEVICE_INVALIDATED {
        CaptureError::DeviceLost
    } else {
        CaptureError::Native(format!("{} failed: {}", call, e))
    }
}
