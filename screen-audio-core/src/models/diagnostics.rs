use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of per-session capture counters, for debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub packets_read: u64,
    pub packets_discarded: u64,
    pub silent_packets: u64,
    pub buffers_emitted: u64,
    pub bytes_emitted: u64,
}

/// Live counters written by the worker thread.
#[derive(Debug, Default)]
pub struct DiagnosticsCounters {
    packets_read: AtomicU64,
    packets_discarded: AtomicU64,
    silent_packets: AtomicU64,
    buffers_emitted: AtomicU64,
    bytes_emitted: AtomicU64,
}

impl DiagnosticsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_packet(&self, silent: bool, discarded: bool) {
        self.packets_read.fetch_add(1, Ordering::Relaxed);
        if silent {
            self.silent_packets.fetch_add(1, Ordering::Relaxed);
        }
        if discarded {
            self.packets_discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_emit(&self, bytes: usize) {
        self.buffers_emitted.fetch_add(1, Ordering::Relaxed);
        self.bytes_emitted.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CaptureDiagnostics {
        CaptureDiagnostics {
            packets_read: self.packets_read.load(Ordering::Relaxed),
            packets_discarded: self.packets_discarded.load(Ordering::Relaxed),
            silent_packets: self.silent_packets.load(Ordering::Relaxed),
            buffers_emitted: self.buffers_emitted.load(Ordering::Relaxed),
            bytes_emitted: self.bytes_emitted.load(Ordering::Relaxed),
        }
    }
}
