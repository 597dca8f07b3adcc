use serde::{Deserialize, Serialize};

/// Sample layout delivered to the consumer.
///
/// Every format the engine exposes is signed 16-bit interleaved PCM,
/// whatever the device produces natively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    pub const OUTPUT_BITS_PER_SAMPLE: u16 = 16;

    /// A 16-bit PCM format at the given rate and channel count.
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample: Self::OUTPUT_BITS_PER_SAMPLE,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * usize::from(self.channels)
    }

    pub fn bytes_per_second(&self) -> usize {
        self.bytes_per_frame() * self.sample_rate as usize
    }

    /// True when two streams can be summed sample for sample.
    pub fn is_mix_compatible(&self, other: &AudioFormat) -> bool {
        self.sample_rate == other.sample_rate && self.channels == other.channels
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self::pcm16(48000, 2)
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {}-bit",
            self.sample_rate, self.channels, self.bits_per_sample
        )
    }
}

/// What a device actually produces before conversion.
///
/// Never handed to the consumer; the converter uses it to pick a decode path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeFormatInfo {
    pub is_float: bool,
    pub bits_per_sample: u16,
    pub channels: u16,
    pub sample_rate: u32,
}

impl NativeFormatInfo {
    pub fn float32(sample_rate: u32, channels: u16) -> Self {
        Self {
            is_float: true,
            bits_per_sample: 32,
            channels,
            sample_rate,
        }
    }

    pub fn int(bits_per_sample: u16, sample_rate: u32, channels: u16) -> Self {
        Self {
            is_float: false,
            bits_per_sample,
            channels,
            sample_rate,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample / 8)
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.bytes_per_sample() * usize::from(self.channels)
    }

    /// Whether the converter has a decode path for this encoding.
    pub fn is_convertible(&self) -> bool {
        matches!(
            (self.is_float, self.bits_per_sample),
            (true, 32) | (false, 32) | (false, 24) | (false, 16)
        )
    }

    /// The consumer-visible format this native stream converts into.
    pub fn output_format(&self) -> AudioFormat {
        AudioFormat::pcm16(self.sample_rate, self.channels)
    }
}

impl std::fmt::Display for NativeFormatInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {}-bit {}",
            self.sample_rate,
            self.channels,
            self.bits_per_sample,
            if self.is_float { "float" } else { "int" }
        )
    }
}
