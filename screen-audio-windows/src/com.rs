//! COM apartment and task-memory helpers.

use std::marker::PhantomData;

use windows::Win32::Foundation::RPC_E_CHANGED_MODE;
use windows::Win32::Media::Audio::WAVEFORMATEX;
use windows::Win32::System::Com::{
    CoInitializeEx, CoTaskMemFree, CoUninitialize, COINIT_MULTITHREADED,
};

use screen_audio_core::CaptureError;

/// RAII guard for COM initialization on the current thread.
///
/// Not `Send`: it must be dropped on the thread that created it.
pub struct ComGuard {
    initialized: bool,
    _thread_bound: PhantomData<*const ()>,
}

impl ComGuard {
    pub fn new() -> Result<Self, CaptureError> {
        let hr = unsafe { CoInitializeEx(None, COINIT_MULTITHREADED) };
        if hr.is_ok() {
            // S_OK and S_FALSE both need a matching CoUninitialize.
            Ok(Self {
                initialized: true,
                _thread_bound: PhantomData,
            })
        } else if hr == RPC_E_CHANGED_MODE {
            // The host already put this thread in an STA; WASAPI works there too.
            log::debug!("COM already initialized as STA on this thread");
            Ok(Self {
                initialized: false,
                _thread_bound: PhantomData,
            })
        } else {
            Err(CaptureError::Native(format!("CoInitializeEx failed: {:?}", hr)))
        }
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        if self.initialized {
            unsafe {
                CoUninitialize();
            }
        }
    }
}

/// Owned `WAVEFORMATEX` returned by `IAudioClient::GetMixFormat`.
pub struct MixFormat(*mut WAVEFORMATEX);

impl MixFormat {
    /// Takes ownership of a CoTaskMem-allocated format.
    ///
    /// # Safety
    /// `ptr` must come from `GetMixFormat` and not be freed elsewhere.
    pub unsafe fn from_raw(ptr: *mut WAVEFORMATEX) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(&self) -> *const WAVEFORMATEX {
        self.0
    }
}

impl Drop for MixFormat {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                CoTaskMemFree(Some(self.0 as *const _));
            }
        }
    }
}
