//! Native sample decoding into uniform 16-bit PCM.
//!
//! Pure functions over byte slices. Output is always little-endian `i16`
//! interleaved, `frames * channels * 2` bytes long, whatever the input.

use crate::models::format::NativeFormatInfo;
use crate::traits::backend::NativePacket;

/// Zeroed 16-bit PCM for `frames` frames of `channels` channels.
pub fn silence(frames: usize, channels: u16) -> Vec<u8> {
    vec![0u8; frames * usize::from(channels) * 2]
}

/// Convert a packet lent out by a capture stream.
///
/// Packets flagged silent never have their data read.
pub fn convert_packet(packet: &NativePacket<'_>, format: &NativeFormatInfo) -> Vec<u8> {
    let frames = packet.frames as usize;
    if packet.silent {
        return silence(frames, format.channels);
    }
    convert(packet.data, frames, format)
}

/// Convert `frames` frames of native audio to 16-bit PCM.
///
/// Supported encodings: 32-bit float, 32/24/16-bit signed int (see
/// `NativeFormatInfo::is_convertible`). Anything else yields silence of the
/// same length; the caller reports it once per stream. If `native` holds
/// fewer bytes than `frames` implies, the missing tail is silence.
pub fn convert(native: &[u8], frames: usize, format: &NativeFormatInfo) -> Vec<u8> {
    let sample_count = frames * usize::from(format.channels);
    let decode: fn(&[u8]) -> i16 = match (format.is_float, format.bits_per_sample) {
        (true, 32) => float32_to_i16,
        (false, 32) => int32_to_i16,
        (false, 24) => int24_to_i16,
        (false, 16) => int16_to_i16,
        _ => return silence(frames, format.channels),
    };

    let width = format.bytes_per_sample();
    let mut out = Vec::with_capacity(sample_count * 2);
    for raw in native.chunks_exact(width).take(sample_count) {
        out.extend_from_slice(&decode(raw).to_le_bytes());
    }
    out.resize(sample_count * 2, 0);
    out
}

/// Float in [-1.0, 1.0] to i16.
///
/// Positive values scale by 32767 and negative ones by 32768 so both ends
/// of the float range land on the ends of the i16 range. Truncates.
pub fn float_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    let clamped = sample.clamp(-1.0, 1.0);
    if clamped < 0.0 {
        (clamped * 32768.0) as i16
    } else {
        (clamped * i16::MAX as f32) as i16
    }
}

fn float32_to_i16(raw: &[u8]) -> i16 {
    float_to_i16(f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

fn int32_to_i16(raw: &[u8]) -> i16 {
    (i32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]) >> 16) as i16
}

// The three bytes go into the top of an i32 so the sign bit lands in bit 31
// and the shift matches the 32-bit path.
fn int24_to_i16(raw: &[u8]) -> i16 {
    (i32::from_le_bytes([0, raw[0], raw[1], raw[2]]) >> 16) as i16
}

fn int16_to_i16(raw: &[u8]) -> i16 {
    i16::from_le_bytes([raw[0], raw[1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(pcm: &[u8]) -> Vec<i16> {
        pcm.chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    fn float_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn float_full_scale_and_halves() {
        let format = NativeFormatInfo::float32(48000, 1);
        let pcm = convert(&float_bytes(&[1.0, -1.0, 0.5, -0.5]), 4, &format);
        assert_eq!(samples(&pcm), vec![32767, -32768, 16383, -16384]);
    }

    #[test]
    fn float_clamps_out_of_range() {
        let format = NativeFormatInfo::float32(48000, 2);
        let pcm = convert(&float_bytes(&[2.5, -7.0]), 1, &format);
        assert_eq!(samples(&pcm), vec![32767, -32768]);
    }

    #[test]
    fn float_nan_is_zero() {
        assert_eq!(float_to_i16(f32::NAN), 0);
    }

    #[test]
    fn int32_drops_low_word() {
        let format = NativeFormatInfo::int(32, 48000, 1);
        let raw: Vec<u8> = [0x7FFF_0000u32, 0x8000_0000, 0x0001_FFFF]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let pcm = convert(&raw, 3, &format);
        assert_eq!(samples(&pcm), vec![32767, -32768, 1]);
    }

    #[test]
    fn int24_sign_extends() {
        let format = NativeFormatInfo::int(24, 48000, 1);
        // 0x7FFFFF, 0x800000 (most negative), 0xFFFFFF (-1), 0x000100
        let raw = [
            0xFF, 0xFF, 0x7F, //
            0x00, 0x00, 0x80, //
            0xFF, 0xFF, 0xFF, //
            0x00, 0x01, 0x00,
        ];
        let pcm = convert(&raw, 4, &format);
        assert_eq!(samples(&pcm), vec![32767, -32768, -1, 1]);
    }

    #[test]
    fn int16_passes_through() {
        let format = NativeFormatInfo::int(16, 44100, 2);
        let raw: Vec<u8> = [1i16, -2, i16::MAX, i16::MIN]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        assert_eq!(convert(&raw, 2, &format), raw);
    }

    #[test]
    fn unsupported_format_yields_silence() {
        let format = NativeFormatInfo::int(8, 8000, 2);
        let pcm = convert(&[0x7F; 6], 3, &format);
        assert_eq!(pcm, vec![0u8; 12]);

        let float64 = NativeFormatInfo {
            is_float: true,
            bits_per_sample: 64,
            channels: 1,
            sample_rate: 48000,
        };
        assert_eq!(convert(&[0xAB; 16], 2, &float64), vec![0u8; 4]);
    }

    #[test]
    fn short_input_is_padded() {
        let format = NativeFormatInfo::int(16, 48000, 1);
        let pcm = convert(&[0x10, 0x00], 3, &format);
        assert_eq!(samples(&pcm), vec![16, 0, 0]);
    }

    #[test]
    fn silent_packet_skips_data() {
        let format = NativeFormatInfo::float32(48000, 2);
        // Garbage data that would decode to non-zero if it were read.
        let garbage = [0x7Fu8; 3];
        let packet = NativePacket {
            data: &garbage,
            frames: 480,
            silent: true,
        };
        let pcm = convert_packet(&packet, &format);
        assert_eq!(pcm.len(), 480 * 2 * 2);
        assert!(pcm.iter().all(|&b| b == 0));
    }
}
