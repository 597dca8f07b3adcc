//! Peak metering over 16-bit PCM blocks, normalized to 0.0–1.0.

/// Peak absolute level of a block.
pub fn peak_level(pcm: &[u8]) -> f32 {
    let peak = pcm
        .chunks_exact(2)
        .map(|b| i32::from(i16::from_le_bytes([b[0], b[1]])).unsigned_abs())
        .max()
        .unwrap_or(0);
    (peak as f32 / 32768.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn pcm(values: &[i16]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn silence_is_zero() {
        assert_eq!(peak_level(&pcm(&[0, 0, 0])), 0.0);
        assert_eq!(peak_level(&[]), 0.0);
    }

    #[test]
    fn peak_uses_absolute_value() {
        assert_relative_eq!(peak_level(&pcm(&[100, -16384, 200])), 0.5);
        assert_relative_eq!(peak_level(&pcm(&[i16::MIN])), 1.0);
    }
}
