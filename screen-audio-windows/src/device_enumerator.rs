//! Windows audio device enumeration via the MMDevice API.
//!
//! Wraps `IMMDeviceEnumerator` to list capture (microphone) and render
//! (loopback) endpoints with friendly names and the default flag.

use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Devices::FunctionDiscovery::PKEY_Device_FriendlyName;
use windows::Win32::Media::Audio::{
    eCapture, eConsole, eRender, EDataFlow, IMMDevice, IMMDeviceEnumerator, MMDeviceEnumerator,
    DEVICE_STATE_ACTIVE,
};
use windows::Win32::System::Com::{CoCreateInstance, CoTaskMemFree, CLSCTX_ALL, STGM_READ};
use windows::Win32::System::Variant::VT_LPWSTR;

use screen_audio_core::{AudioDevice, CaptureError, SourceKind};

/// Audio device enumerator using the Windows MMDevice API.
pub struct DeviceEnumerator {
    enumerator: IMMDeviceEnumerator,
}

impl DeviceEnumerator {
    /// Create a new device enumerator.
    ///
    /// Requires COM to be initialized on the calling thread.
    pub fn new() -> Result<Self, CaptureError> {
        unsafe {
            let enumerator: IMMDeviceEnumerator =
                CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL).map_err(|e| {
                    CaptureError::Native(format!("failed to create enumerator: {}", e))
                })?;
            Ok(Self { enumerator })
        }
    }

    /// Active endpoints for a source class. System audio lists render
    /// endpoints, which are captured in loopback mode.
    pub fn list_devices(&self, kind: SourceKind) -> Result<Vec<AudioDevice>, CaptureError> {
        let flow = data_flow(kind);
        unsafe {
            let collection = self
                .enumerator
                .EnumAudioEndpoints(flow, DEVICE_STATE_ACTIVE)
                .map_err(|e| CaptureError::Native(format!("EnumAudioEndpoints failed: {}", e)))?;

            let count = collection
                .GetCount()
                .map_err(|e| CaptureError::Native(format!("GetCount failed: {}", e)))?;

            let default_id = self.default_device_id(kind).ok();

            let mut devices = Vec::with_capacity(count as usize);
            for i in 0..count {
                let Ok(device) = collection.Item(i) else {
                    continue;
                };
                let Some(id) = device_id(&device) else {
                    continue;
                };
                let name = friendly_name(&device).unwrap_or_else(|| format!("Device {}", i));
                let is_default = default_id.as_deref() == Some(id.as_str());
                devices.push(AudioDevice { id, name, is_default });
            }
            Ok(devices)
        }
    }

    /// Id of the console-role default endpoint for a source class.
    pub fn default_device_id(&self, kind: SourceKind) -> Result<String, CaptureError> {
        let device = unsafe {
            self.enumerator
                .GetDefaultAudioEndpoint(data_flow(kind), eConsole)
                .map_err(|_| CaptureError::DeviceNotAvailable)?
        };
        device_id(&device).ok_or(CaptureError::DeviceNotAvailable)
    }

    /// Resolve a device by opaque id, or the default endpoint for `None`.
    pub fn device(&self, kind: SourceKind, id: Option<&str>) -> Result<IMMDevice, CaptureError> {
        unsafe {
            match id {
                Some(id) => {
                    let wide: Vec<u16> = id.encode_utf16().chain(std::iter::once(0)).collect();
                    self.enumerator
                        .GetDevice(PCWSTR(wide.as_ptr()))
                        .map_err(|_| CaptureError::DeviceNotAvailable)
                }
                None => self
                    .enumerator
                    .GetDefaultAudioEndpoint(data_flow(kind), eConsole)
                    .map_err(|_| CaptureError::DeviceNotAvailable),
            }
        }
    }
}

fn data_flow(kind: SourceKind) -> EDataFlow {
    match kind {
        SourceKind::Microphone => eCapture,
        SourceKind::SystemAudio => eRender,
    }
}

fn device_id(device: &IMMDevice) -> Option<String> {
    unsafe {
        let raw: PWSTR = device.GetId().ok()?;
        let id = raw.to_string().ok();
        CoTaskMemFree(Some(raw.0 as *const _));
        id
    }
}

/// Read the PKEY_Device_FriendlyName property from a device.
fn friendly_name(device: &IMMDevice) -> Option<String> {
    unsafe {
        let store = device.OpenPropertyStore(STGM_READ).ok()?;
        let value = store.GetValue(&PKEY_Device_FriendlyName).ok()?;

        let inner = &value.as_raw().Anonymous.Anonymous;
        if inner.vt != VT_LPWSTR.0 {
            return None;
        }
        let pwsz = inner.Anonymous.pwszVal;
        if pwsz.is_null() {
            return None;
        }
        PCWSTR(pwsz).to_string().ok()
    }
}
