//! WASAPI implementation of the capture backend traits.

use windows::core::PCWSTR;
use windows::Win32::Foundation::HANDLE;
use windows::Win32::Media::Audio::IAudioClient;
use windows::Win32::System::Com::CLSCTX_ALL;
use windows::Win32::System::Threading::{
    AvRevertMmThreadCharacteristics, AvSetMmThreadCharacteristicsW,
};

use screen_audio_core::{
    AudioBackend, AudioDevice, BackendSession, CaptureError, CaptureStream, NativeFormatInfo,
    SourceKind,
};

use crate::com::{ComGuard, MixFormat};
use crate::device_enumerator::DeviceEnumerator;
use crate::format::native_format;
use crate::stream::WasapiStream;

/// Windows Audio Session API backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct WasapiBackend;

impl AudioBackend for WasapiBackend {
    fn name(&self) -> &'static str {
        "wasapi"
    }

    fn list_devices(&self, kind: SourceKind) -> Result<Vec<AudioDevice>, CaptureError> {
        let _com = ComGuard::new()?;
        DeviceEnumerator::new()?.list_devices(kind)
    }

    fn probe(
        &self,
        kind: SourceKind,
        device_id: Option<&str>,
    ) -> Result<NativeFormatInfo, CaptureError> {
        let _com = ComGuard::new()?;
        let enumerator = DeviceEnumerator::new()?;
        let device = enumerator.device(kind, device_id)?;
        unsafe {
            let client: IAudioClient = device
                .Activate(CLSCTX_ALL, None)
                .map_err(|e| CaptureError::Native(format!("Activate failed: {}", e)))?;
            let mix_format = MixFormat::from_raw(
                client
                    .GetMixFormat()
                    .map_err(|e| CaptureError::Native(format!("GetMixFormat failed: {}", e)))?,
            );
            Ok(native_format(mix_format.as_ptr()))
        }
    }

    fn open_session(&self) -> Result<Box<dyn BackendSession>, CaptureError> {
        let com = ComGuard::new()?;
        let enumerator = DeviceEnumerator::new()?;
        let mmcss = register_mmcss();
        Ok(Box::new(WasapiSession {
            enumerator,
            mmcss,
            _com: com,
        }))
    }
}

/// Per-worker native context: COM apartment, device enumerator and the
/// MMCSS registration of the worker thread.
struct WasapiSession {
    enumerator: DeviceEnumerator,
    mmcss: Option<HANDLE>,
    // Uninitializes COM, so it goes last.
    _com: ComGuard,
}

impl BackendSession for WasapiSession {
    fn open_stream(
        &mut self,
        kind: SourceKind,
        device_id: Option<&str>,
    ) -> Result<Box<dyn CaptureStream>, CaptureError> {
        let device = self.enumerator.device(kind, device_id)?;
        let stream = WasapiStream::open(&device, kind)?;
        Ok(Box::new(stream))
    }
}

impl Drop for WasapiSession {
    fn drop(&mut self) {
        if let Some(handle) = self.mmcss.take() {
            if let Err(e) = unsafe { AvRevertMmThreadCharacteristics(handle) } {
                log::debug!("AvRevertMmThreadCharacteristics failed: {}", e);
            }
        }
    }
}

/// Register the calling thread with MMCSS for real-time priority.
fn register_mmcss() -> Option<HANDLE> {
    let mut task_index: u32 = 0;
    let task_name: Vec<u16> = "Pro Audio\0".encode_utf16().collect();
    match unsafe { AvSetMmThreadCharacteristicsW(PCWSTR(task_name.as_ptr()), &mut task_index) } {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::warn!("MMCSS registration failed, capturing at normal priority: {}", e);
            None
        }
    }
}
