use std::sync::Arc;
use std::thread;

use crate::models::config::EngineConfig;
use crate::models::device::{default_device_id, AudioDevice, AudioSource, SourceKind};
use crate::models::diagnostics::{CaptureDiagnostics, DiagnosticsCounters};
use crate::models::error::CaptureError;
use crate::models::format::AudioFormat;
use crate::models::state::{CaptureFlags, WorkerState};
use crate::session::devices;
use crate::session::signal::Completion;
use crate::session::timing::TimingController;
use crate::session::worker::{self, WorkerContext};
use crate::traits::backend::AudioBackend;
use crate::traits::engine::AudioCaptureEngine;
use crate::traits::listener::{CaptureListener, NullListener};

struct WorkerHandle {
    session_id: String,
    join: thread::JoinHandle<()>,
    exited: Arc<Completion<()>>,
}

/// Capture engine facade over a native backend.
///
/// Generic over the platform via `AudioBackend`. Owns configuration and the
/// lifecycle of one capture worker at a time:
/// ```text
/// configure → start() ─spawn→ [worker: init → loop → release] ─exit→ stop()
///                ↑ waits for init result        ↑ pause()/resume() flip flags
/// ```
pub struct NativeCaptureEngine<B: AudioBackend> {
    backend: Arc<B>,
    config: EngineConfig,
    listener: Arc<dyn CaptureListener>,
    source: AudioSource,
    device_id: Option<String>,
    loopback_device_id: Option<String>,
    format: AudioFormat,
    flags: Arc<CaptureFlags>,
    timing: Arc<TimingController>,
    counters: Arc<DiagnosticsCounters>,
    worker: Option<WorkerHandle>,
    session_id: Option<String>,
}

impl<B: AudioBackend> NativeCaptureEngine<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, EngineConfig::default())
    }

    pub fn with_config(backend: B, config: EngineConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            config,
            listener: Arc::new(NullListener),
            source: AudioSource::None,
            device_id: None,
            loopback_device_id: None,
            format: AudioFormat::default(),
            flags: Arc::new(CaptureFlags::new()),
            timing: Arc::new(TimingController::new()),
            counters: Arc::new(DiagnosticsCounters::new()),
            worker: None,
            session_id: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Worker state of the current (or last) session.
    pub fn worker_state(&self) -> WorkerState {
        self.flags.state()
    }

    /// Id of the current (or last) session, for correlating logs.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.counters.snapshot()
    }

    /// Milliseconds of captured time so far, pauses excluded.
    pub fn elapsed_ms(&self) -> u64 {
        if self.flags.is_running() {
            self.timing.timestamp_now()
        } else {
            0
        }
    }

    fn configurable(&self, what: &str) -> bool {
        if self.flags.is_running() {
            log::warn!("Ignoring {} change while audio capture is running", what);
            return false;
        }
        true
    }

    /// Best-effort probe so `audio_format()` is meaningful before `start()`.
    fn refresh_format(&mut self) {
        let (kind, device_id) = if self.source.includes_microphone() {
            (SourceKind::Microphone, self.device_id.as_deref())
        } else if self.source.includes_system_audio() {
            (SourceKind::SystemAudio, self.loopback_device_id.as_deref())
        } else {
            return;
        };

        match devices::probe_format(&*self.backend, kind, device_id) {
            Ok((native, format)) => {
                log::debug!("Probed {} format: native {}, output {}", kind, native, format);
                self.format = format;
            }
            Err(e) => log::debug!(
                "Format probe for {} failed, keeping {}: {}",
                kind,
                self.format,
                e
            ),
        }
    }
}

impl<B: AudioBackend> AudioCaptureEngine for NativeCaptureEngine<B> {
    fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    fn set_listener(&mut self, listener: Arc<dyn CaptureListener>) {
        self.listener = listener;
    }

    fn set_audio_source(&mut self, source: AudioSource) {
        if !self.configurable("audio source") {
            return;
        }
        self.source = source;
        self.refresh_format();
    }

    fn audio_source(&self) -> AudioSource {
        self.source
    }

    fn set_device(&mut self, device_id: Option<String>) {
        if !self.configurable("device") {
            return;
        }
        self.device_id = device_id;
        self.refresh_format();
    }

    fn device(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    fn set_loopback_device(&mut self, device_id: Option<String>) {
        if !self.configurable("loopback device") {
            return;
        }
        self.loopback_device_id = device_id;
        self.refresh_format();
    }

    fn audio_format(&self) -> AudioFormat {
        self.format
    }

    fn start(&mut self) -> bool {
        if self.flags.is_running() {
            log::warn!("Cannot start audio capture: {}", CaptureError::AlreadyRunning);
            return false;
        }
        // A previous session may have ended on its own (error, device loss).
        self.stop();

        if self.source == AudioSource::None {
            log::warn!("Cannot start audio capture: {}", CaptureError::NoSourceConfigured);
            return false;
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        let flags = Arc::new(CaptureFlags::new());
        let init = Arc::new(Completion::new());
        let exited = Arc::new(Completion::new());
        self.counters = Arc::new(DiagnosticsCounters::new());
        self.timing = Arc::new(TimingController::new());

        let ctx = WorkerContext {
            session_id: session_id.clone(),
            source: self.source,
            mic_device: self.device_id.clone(),
            loopback_device: self.loopback_device_id.clone(),
            config: self.config.clone(),
            flags: Arc::clone(&flags),
            timing: Arc::clone(&self.timing),
            counters: Arc::clone(&self.counters),
            listener: Arc::clone(&self.listener),
            init: Arc::clone(&init),
            exited: Arc::clone(&exited),
        };

        let join = match worker::spawn(Arc::clone(&self.backend), ctx) {
            Ok(join) => join,
            Err(e) => {
                log::error!("[{}] Failed to spawn audio capture worker: {}", session_id, e);
                return false;
            }
        };

        self.flags = flags;
        self.session_id = Some(session_id.clone());
        self.worker = Some(WorkerHandle {
            session_id: session_id.clone(),
            join,
            exited,
        });

        match init.wait_timeout(self.config.start_timeout()) {
            Some(Ok(format)) => {
                self.format = format;
                log::info!("[{}] Audio capture started: {:?}, {}", session_id, self.source, format);
                true
            }
            Some(Err(e)) => {
                log::warn!("[{}] Audio capture failed to start: {}", session_id, e);
                self.stop();
                false
            }
            None => {
                log::error!(
                    "[{}] Audio capture worker did not initialize within {:?}",
                    session_id,
                    self.config.start_timeout()
                );
                self.stop();
                false
            }
        }
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        self.flags.request_stop();

        if worker.exited.wait_timeout(self.config.stop_timeout()).is_some() {
            if worker.join.join().is_err() {
                log::error!("[{}] Audio capture worker panicked", worker.session_id);
            }
            log::info!("[{}] Audio capture stopped", worker.session_id);
        } else {
            // The worker is stuck inside a native call. Detach it: its flags
            // keep stop requested, so it cannot deliver into a later session.
            log::error!(
                "[{}] Audio capture worker did not exit within {:?}; \
                 detaching it, native resources may leak",
                worker.session_id,
                self.config.stop_timeout()
            );
            drop(worker.join);
        }

        self.flags.set_running(false);
        self.flags.set_paused(false);
    }

    fn pause(&self) {
        if !self.flags.is_running() {
            return;
        }
        if !self.flags.set_paused(true) {
            self.timing.mark_pause_start();
            log::debug!("Audio capture paused");
        }
    }

    fn resume(&self) {
        if !self.flags.is_running() {
            return;
        }
        if self.flags.set_paused(false) {
            self.timing.mark_resume_and_accumulate();
            log::debug!("Audio capture resumed");
        }
    }

    fn is_running(&self) -> bool {
        self.flags.is_running()
    }

    fn is_paused(&self) -> bool {
        self.flags.is_paused()
    }

    fn available_input_devices(&self) -> Vec<AudioDevice> {
        devices::list_devices(&*self.backend, SourceKind::Microphone)
    }

    fn available_loopback_devices(&self) -> Vec<AudioDevice> {
        devices::list_devices(&*self.backend, SourceKind::SystemAudio)
    }

    fn default_input_device(&self) -> Option<String> {
        default_device_id(&self.available_input_devices())
    }
}

impl<B: AudioBackend> Drop for NativeCaptureEngine<B> {
    fn drop(&mut self) {
        self.stop();
    }
}
