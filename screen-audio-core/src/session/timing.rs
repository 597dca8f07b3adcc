use std::time::{Duration, Instant};

use parking_lot::Mutex;

#[derive(Debug)]
struct TimingState {
    start_time: Option<Instant>,
    paused_duration: Duration,
    pause_start_time: Option<Instant>,
    last_timestamp_ms: Option<u64>,
}

impl TimingState {
    fn new() -> Self {
        Self {
            start_time: None,
            paused_duration: Duration::ZERO,
            pause_start_time: None,
            last_timestamp_ms: None,
        }
    }

    fn elapsed_at(&self, now: Instant) -> Duration {
        let Some(start) = self.start_time else {
            return Duration::ZERO;
        };
        now.saturating_duration_since(start)
            .saturating_sub(self.paused_duration)
    }
}

/// Capture-time clock that excludes paused spans.
///
/// Shared between the caller thread (pause/resume) and the worker thread
/// (stamping buffers). This mutex is the only lock in the capture path; keep
/// critical sections to a few field updates.
#[derive(Debug)]
pub struct TimingController {
    state: Mutex<TimingState>,
}

impl TimingController {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TimingState::new()),
        }
    }

    /// Start a new timeline at `now`, forgetting all previous pauses.
    pub fn reset(&self) {
        self.reset_at(Instant::now());
    }

    pub fn reset_at(&self, now: Instant) {
        let mut s = self.state.lock();
        *s = TimingState::new();
        s.start_time = Some(now);
    }

    pub fn mark_pause_start(&self) {
        self.mark_pause_start_at(Instant::now());
    }

    /// No-op if already paused.
    pub fn mark_pause_start_at(&self, now: Instant) {
        let mut s = self.state.lock();
        if s.pause_start_time.is_none() {
            s.pause_start_time = Some(now);
        }
    }

    pub fn mark_resume_and_accumulate(&self) {
        self.mark_resume_and_accumulate_at(Instant::now());
    }

    /// Fold the current pause into the accumulated paused duration.
    /// No-op if not paused.
    pub fn mark_resume_and_accumulate_at(&self, now: Instant) {
        let mut s = self.state.lock();
        if let Some(pause_start) = s.pause_start_time.take() {
            s.paused_duration += now.saturating_duration_since(pause_start);
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().pause_start_time.is_some()
    }

    pub fn paused_duration(&self) -> Duration {
        self.state.lock().paused_duration
    }

    /// Milliseconds since start, accumulated pauses excluded.
    pub fn timestamp_now(&self) -> u64 {
        self.timestamp_at(Instant::now())
    }

    pub fn timestamp_at(&self, now: Instant) -> u64 {
        self.state.lock().elapsed_at(now).as_millis() as u64
    }

    /// Like `timestamp_now`, but strictly greater than the previous call's
    /// result within the same timeline.
    pub fn next_buffer_timestamp(&self) -> u64 {
        self.next_buffer_timestamp_at(Instant::now())
    }

    pub fn next_buffer_timestamp_at(&self, now: Instant) -> u64 {
        let mut s = self.state.lock();
        let raw = s.elapsed_at(now).as_millis() as u64;
        let stamped = match s.last_timestamp_ms {
            Some(last) if raw <= last => last + 1,
            _ => raw,
        };
        s.last_timestamp_ms = Some(stamped);
        stamped
    }
}

impl Default for TimingController {
    fn default() -> Self {
        Self::new()
    }
}
