//! Scripted backend and recording listener for engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::device::{AudioDevice, SourceKind};
use crate::models::error::CaptureError;
use crate::models::format::NativeFormatInfo;
use crate::traits::backend::{AudioBackend, BackendSession, CaptureStream, NativePacket};
use crate::traits::listener::CaptureListener;

#[derive(Debug, Clone)]
pub struct ScriptedPacket {
    pub data: Vec<u8>,
    pub frames: u32,
    pub silent: bool,
}

impl ScriptedPacket {
    pub fn pcm16(samples: &[i16], channels: u16) -> Self {
        Self {
            data: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
            frames: (samples.len() / usize::from(channels)) as u32,
            silent: false,
        }
    }

    pub fn float32(samples: &[f32], channels: u16) -> Self {
        Self {
            data: samples.iter().flat_map(|s| s.to_le_bytes()).collect(),
            frames: (samples.len() / usize::from(channels)) as u32,
            silent: false,
        }
    }

    /// Flagged silent with no readable data behind it.
    pub fn silent(frames: u32) -> Self {
        Self {
            data: Vec::new(),
            frames,
            silent: true,
        }
    }
}

/// How one source kind behaves.
#[derive(Debug, Clone)]
pub struct StreamScript {
    pub format: NativeFormatInfo,
    pub packets: Vec<ScriptedPacket>,
    /// Repeat this packet forever once `packets` runs out, one per `pace`.
    pub endless: Option<ScriptedPacket>,
    pub pace: Duration,
    pub fail_open: bool,
    /// Report the device lost after this many packets.
    pub lose_after: Option<usize>,
}

impl StreamScript {
    pub fn new(format: NativeFormatInfo) -> Self {
        Self {
            format,
            packets: Vec::new(),
            endless: None,
            pace: Duration::ZERO,
            fail_open: false,
            lose_after: None,
        }
    }

    pub fn packets(mut self, packets: Vec<ScriptedPacket>) -> Self {
        self.packets = packets;
        self
    }

    pub fn endless(mut self, packet: ScriptedPacket, pace: Duration) -> Self {
        self.endless = Some(packet);
        self.pace = pace;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn lose_after(mut self, packets: usize) -> Self {
        self.lose_after = Some(packets);
        self
    }
}

/// What the backend observed, shared with the test.
#[derive(Debug, Default)]
pub struct BackendLog {
    pub sessions_opened: AtomicUsize,
    pub sessions_closed: AtomicUsize,
    pub streams_opened: AtomicUsize,
    pub streams_closed: AtomicUsize,
    pub threads: Mutex<Vec<(&'static str, ThreadId)>>,
    pub opened_devices: Mutex<Vec<(SourceKind, Option<String>)>>,
}

impl BackendLog {
    fn record(&self, event: &'static str) {
        self.threads.lock().push((event, thread::current().id()));
    }

    pub fn thread_of(&self, event: &str) -> Vec<ThreadId> {
        self.threads
            .lock()
            .iter()
            .filter(|(e, _)| *e == event)
            .map(|(_, id)| *id)
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    pub devices: HashMap<SourceKind, Vec<AudioDevice>>,
    pub scripts: HashMap<SourceKind, StreamScript>,
    pub fail_session: bool,
    pub session_delay: Duration,
    pub hang_on_stop: Duration,
    pub log: Arc<BackendLog>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(mut self, kind: SourceKind, script: StreamScript) -> Self {
        self.scripts.insert(kind, script);
        self
    }

    pub fn with_devices(mut self, kind: SourceKind, devices: Vec<AudioDevice>) -> Self {
        self.devices.insert(kind, devices);
        self
    }
}

impl AudioBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn list_devices(&self, kind: SourceKind) -> Result<Vec<AudioDevice>, CaptureError> {
        Ok(self.devices.get(&kind).cloned().unwrap_or_default())
    }

    fn probe(
        &self,
        kind: SourceKind,
        _device_id: Option<&str>,
    ) -> Result<NativeFormatInfo, CaptureError> {
        self.scripts
            .get(&kind)
            .map(|s| s.format)
            .ok_or(CaptureError::DeviceNotAvailable)
    }

    fn open_session(&self) -> Result<Box<dyn BackendSession>, CaptureError> {
        if !self.session_delay.is_zero() {
            thread::sleep(self.session_delay);
        }
        if self.fail_session {
            return Err(CaptureError::Native("session refused".into()));
        }
        self.log.sessions_opened.fetch_add(1, Ordering::SeqCst);
        self.log.record("session_open");
        Ok(Box::new(ScriptedSession {
            scripts: self.scripts.clone(),
            hang_on_stop: self.hang_on_stop,
            log: Arc::clone(&self.log),
        }))
    }
}

struct ScriptedSession {
    scripts: HashMap<SourceKind, StreamScript>,
    hang_on_stop: Duration,
    log: Arc<BackendLog>,
}

impl BackendSession for ScriptedSession {
    fn open_stream(
        &mut self,
        kind: SourceKind,
        device_id: Option<&str>,
    ) -> Result<Box<dyn CaptureStream>, CaptureError> {
        let script = self.scripts.get(&kind).ok_or(CaptureError::DeviceNotAvailable)?;
        if script.fail_open {
            return Err(CaptureError::DeviceNotAvailable);
        }
        self.log.streams_opened.fetch_add(1, Ordering::SeqCst);
        self.log.opened_devices.lock().push((kind, device_id.map(str::to_string)));
        self.log.record("stream_open");
        Ok(Box::new(ScriptedStream {
            script: script.clone(),
            queue: script.packets.iter().cloned().collect(),
            delivered: 0,
            next_due: Instant::now(),
            hang_on_stop: self.hang_on_stop,
            log: Arc::clone(&self.log),
        }))
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.log.sessions_closed.fetch_add(1, Ordering::SeqCst);
        self.log.record("session_close");
    }
}

struct ScriptedStream {
    script: StreamScript,
    queue: VecDeque<ScriptedPacket>,
    delivered: usize,
    next_due: Instant,
    hang_on_stop: Duration,
    log: Arc<BackendLog>,
}

impl CaptureStream for ScriptedStream {
    fn format(&self) -> NativeFormatInfo {
        self.script.format
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.hang_on_stop.is_zero() {
            thread::sleep(self.hang_on_stop);
        }
        Ok(())
    }

    fn read_packet(
        &mut self,
        sink: &mut dyn FnMut(NativePacket<'_>),
    ) -> Result<bool, CaptureError> {
        if self.script.lose_after.is_some_and(|n| self.delivered >= n) {
            return Err(CaptureError::DeviceLost);
        }

        let packet = match self.queue.pop_front() {
            Some(packet) => packet,
            None => match &self.script.endless {
                Some(packet) if Instant::now() >= self.next_due => {
                    self.next_due = Instant::now() + self.script.pace;
                    packet.clone()
                }
                _ => return Ok(false),
            },
        };

        self.delivered += 1;
        sink(NativePacket {
            data: &packet.data,
            frames: packet.frames,
            silent: packet.silent,
        });
        Ok(true)
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.log.streams_closed.fetch_add(1, Ordering::SeqCst);
        self.log.record("stream_close");
    }
}

/// Listener that keeps every event for later inspection.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub buffers: Mutex<Vec<(Vec<u8>, u64)>>,
    pub errors: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<String>>,
    pub levels: Mutex<Vec<f32>>,
    pub device_lost: AtomicUsize,
}

impl RecordingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn buffer_count(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn samples(&self) -> Vec<i16> {
        self.buffers
            .lock()
            .iter()
            .flat_map(|(data, _)| {
                data.chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Poll `condition` until it holds or `timeout` passes.
    pub fn wait_until(&self, timeout: Duration, condition: impl Fn(&Self) -> bool) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if condition(self) {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        condition(self)
    }
}

impl CaptureListener for RecordingListener {
    fn on_audio_data(&self, data: &[u8], timestamp_ms: u64) {
        self.buffers.lock().push((data.to_vec(), timestamp_ms));
    }

    fn on_error(&self, message: &str) {
        self.errors.lock().push(message.to_string());
    }

    fn on_warning(&self, message: &str) {
        self.warnings.lock().push(message.to_string());
    }

    fn on_device_lost(&self) {
        self.device_lost.fetch_add(1, Ordering::SeqCst);
    }

    fn on_level_changed(&self, level: f32) {
        self.levels.lock().push(level);
    }
}
