//! `WAVEFORMATEX` parsing.

use windows::Win32::Media::Audio::{WAVEFORMATEX, WAVEFORMATEXTENSIBLE};
use windows::Win32::Media::KernelStreaming::WAVE_FORMAT_EXTENSIBLE;
use windows::Win32::Media::Multimedia::{KSDATAFORMAT_SUBTYPE_IEEE_FLOAT, WAVE_FORMAT_IEEE_FLOAT};

use screen_audio_core::NativeFormatInfo;

/// Describe a mix format as the converter sees it.
///
/// Uses the container width (`wBitsPerSample`), so 24-in-32 streams are
/// treated as 32-bit, which decodes correctly since the valid bits are
/// left-justified.
///
/// # Safety
/// `format` must point to a valid `WAVEFORMATEX`, extended to
/// `WAVEFORMATEXTENSIBLE` when its tag says so.
pub unsafe fn native_format(format: *const WAVEFORMATEX) -> NativeFormatInfo {
    let fmt = std::ptr::read_unaligned(format);
    let tag = u32::from(fmt.wFormatTag);

    let is_float = if tag == WAVE_FORMAT_EXTENSIBLE {
        let ext = format as *const WAVEFORMATEXTENSIBLE;
        let sub_format = std::ptr::read_unaligned(std::ptr::addr_of!((*ext).SubFormat));
        sub_format == KSDATAFORMAT_SUBTYPE_IEEE_FLOAT
    } else {
        tag == WAVE_FORMAT_IEEE_FLOAT
    };

    NativeFormatInfo {
        is_float,
        bits_per_sample: fmt.wBitsPerSample,
        channels: fmt.nChannels,
        sample_rate: fmt.nSamplesPerSec,
    }
}

/// Bytes per frame as the device reports it.
///
/// # Safety
/// `format` must point to a valid `WAVEFORMATEX`.
pub unsafe fn block_align(format: *const WAVEFORMATEX) -> usize {
    usize::from(std::ptr::read_unaligned(format).nBlockAlign)
}
