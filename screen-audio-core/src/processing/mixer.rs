use crate::models::format::AudioFormat;

/// Sample-aligned mixer for a microphone and a loopback PCM stream.
///
/// Both inputs are 16-bit PCM in the same output format. Each side queues
/// into its own pending buffer; `drain` sums the common frame-aligned prefix
/// and leaves the remainder queued for the next round. If one side stalls,
/// `drain_overflow` passes the other through once it queues more than the
/// pending limit.
///
/// ```text
/// [mic pcm] ──→ pending_mic ──────┐
///                                  ├→ clamp(mic + loopback) → mixed block
/// [loopback pcm] → pending_loopback┘
/// ```
#[derive(Debug, Clone)]
pub struct StreamMixer {
    bytes_per_frame: usize,
    bytes_per_second: usize,
    max_pending: usize,
    pending_mic: Vec<u8>,
    pending_loopback: Vec<u8>,
}

impl StreamMixer {
    pub fn new(format: AudioFormat) -> Self {
        Self {
            bytes_per_frame: format.bytes_per_frame().max(2),
            bytes_per_second: format.bytes_per_second(),
            max_pending: usize::MAX,
            pending_mic: Vec::new(),
            pending_loopback: Vec::new(),
        }
    }

    /// Limit how much audio one side may queue while the other is empty.
    pub fn with_max_pending_ms(mut self, ms: u64) -> Self {
        let bytes = self.bytes_per_second.saturating_mul(ms as usize) / 1000;
        self.max_pending = (bytes / self.bytes_per_frame).max(1) * self.bytes_per_frame;
        self
    }

    pub fn push_mic(&mut self, pcm: &[u8]) {
        self.pending_mic.extend_from_slice(pcm);
    }

    pub fn push_loopback(&mut self, pcm: &[u8]) {
        self.pending_loopback.extend_from_slice(pcm);
    }

    pub fn pending_mic_len(&self) -> usize {
        self.pending_mic.len()
    }

    pub fn pending_loopback_len(&self) -> usize {
        self.pending_loopback.len()
    }

    /// Mix and remove the largest frame-aligned region both sides hold.
    ///
    /// Returns `None` until both sides have at least one full frame.
    pub fn drain(&mut self) -> Option<Vec<u8>> {
        let common = self.pending_mic.len().min(self.pending_loopback.len());
        let mix_bytes = common / self.bytes_per_frame * self.bytes_per_frame;
        if mix_bytes == 0 {
            return None;
        }

        let mixed = mix_pcm16(&self.pending_mic[..mix_bytes], &self.pending_loopback[..mix_bytes]);
        self.pending_mic.drain(..mix_bytes);
        self.pending_loopback.drain(..mix_bytes);
        Some(mixed)
    }

    /// Release audio queued past the pending limit on one side while the
    /// other holds less than a frame. The released block is mixed against
    /// silence, so it passes through unchanged.
    pub fn drain_overflow(&mut self) -> Option<Vec<u8>> {
        let bpf = self.bytes_per_frame;
        let (mic, loopback) = (self.pending_mic.len(), self.pending_loopback.len());
        let lone = if loopback < bpf && mic > self.max_pending {
            &mut self.pending_mic
        } else if mic < bpf && loopback > self.max_pending {
            &mut self.pending_loopback
        } else {
            return None;
        };

        let excess = (lone.len() - self.max_pending).div_ceil(bpf) * bpf;
        let take = excess.min(lone.len() / bpf * bpf);
        if take == 0 {
            return None;
        }
        Some(lone.drain(..take).collect())
    }

    /// Drop everything queued on both sides.
    pub fn clear(&mut self) {
        self.pending_mic.clear();
        self.pending_loopback.clear();
    }
}

/// Sum two little-endian i16 buffers sample by sample, clamping to the i16 range.
///
/// Mixes the common prefix; the output is as long as the shorter input
/// rounded down to whole samples.
pub fn mix_pcm16(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    for (x, y) in a.chunks_exact(2).zip(b.chunks_exact(2)) {
        let x = i16::from_le_bytes([x[0], x[1]]);
        let y = i16::from_le_bytes([y[0], y[1]]);
        out.extend_from_slice(&mix_sample(x, y).to_le_bytes());
    }
    out
}

/// Linear sum of two samples, clamped.
pub fn mix_sample(a: i16, b: i16) -> i16 {
    a.saturating_add(b)
}
