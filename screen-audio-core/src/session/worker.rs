//! The capture worker thread.
//!
//! Owns every native handle for one session. Handles are opened, used and
//! released on this thread only:
//!
//! ```text
//! open_session → open_stream(s) → start
//!     → [poll → convert → mix → emit]* → stop → drop
//! ```

use std::sync::Arc;
use std::thread;

use crate::models::config::EngineConfig;
use crate::models::device::{AudioSource, SourceKind};
use crate::models::diagnostics::DiagnosticsCounters;
use crate::models::error::CaptureError;
use crate::models::format::{AudioFormat, NativeFormatInfo};
use crate::models::state::{CaptureFlags, WorkerState};
use crate::processing::converter;
use crate::processing::levels;
use crate::processing::mixer::StreamMixer;
use crate::session::signal::Completion;
use crate::session::timing::TimingController;
use crate::traits::backend::{AudioBackend, BackendSession, CaptureStream, NativePacket};
use crate::traits::listener::CaptureListener;

/// Upper bound on packets drained from one stream per loop iteration, so a
/// flooding device cannot starve the stop check or the other stream.
const MAX_PACKETS_PER_POLL: usize = 64;

/// Result of the init handshake: the negotiated output format, or why
/// initialization failed.
pub type InitResult = Result<AudioFormat, CaptureError>;

/// Everything the worker needs, moved onto its thread at spawn.
pub struct WorkerContext {
    pub session_id: String,
    pub source: AudioSource,
    pub mic_device: Option<String>,
    pub loopback_device: Option<String>,
    pub config: EngineConfig,
    pub flags: Arc<CaptureFlags>,
    pub timing: Arc<TimingController>,
    pub counters: Arc<DiagnosticsCounters>,
    pub listener: Arc<dyn CaptureListener>,
    pub init: Arc<Completion<InitResult>>,
    pub exited: Arc<Completion<()>>,
}

/// Spawn the worker for `ctx` on a named thread.
pub fn spawn<B: AudioBackend>(
    backend: Arc<B>,
    ctx: WorkerContext,
) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("audio-capture-worker".into())
        .spawn(move || run(&*backend, ctx))
}

/// Worker thread body. Returns when the session ends for any reason.
pub fn run<B: AudioBackend + ?Sized>(backend: &B, ctx: WorkerContext) {
    let _exit = ExitGuard {
        flags: &ctx.flags,
        init: &ctx.init,
        exited: &ctx.exited,
    };

    ctx.flags.set_state(WorkerState::Initializing);
    log::debug!(
        "[{}] Initializing {:?} capture via {}",
        ctx.session_id,
        ctx.source,
        backend.name()
    );

    let mut resources = match initialize(backend, &ctx) {
        Ok(resources) => resources,
        Err(e) => {
            log::error!("[{}] Audio capture initialization failed: {}", ctx.session_id, e);
            ctx.listener.on_error(&e.to_string());
            ctx.init.complete(Err(e));
            return;
        }
    };

    if ctx.flags.stop_requested() {
        log::debug!("[{}] Stop requested during initialization", ctx.session_id);
        ctx.init.complete(Err(CaptureError::Timeout));
        resources.stop_streams(&ctx.session_id);
        return;
    }

    ctx.timing.reset();
    ctx.flags.set_running(true);
    ctx.flags.set_state(WorkerState::Running);
    ctx.init.complete(Ok(resources.output));
    log::info!("[{}] Audio capture running ({})", ctx.session_id, resources.output);

    let outcome = capture_loop(&mut resources, &ctx);

    ctx.flags.set_state(WorkerState::Stopping);
    resources.stop_streams(&ctx.session_id);
    drop(resources);
    ctx.flags.set_running(false);

    match outcome {
        Ok(()) => log::debug!("[{}] Capture loop exited", ctx.session_id),
        Err(CaptureError::DeviceLost) => {
            log::warn!("[{}] Audio device lost during capture", ctx.session_id);
            ctx.listener.on_device_lost();
        }
        Err(e) => {
            log::error!("[{}] Audio capture failed: {}", ctx.session_id, e);
            ctx.listener.on_error(&e.to_string());
        }
    }
}

/// Runs on every exit path, including unwinding out of a listener.
struct ExitGuard<'a> {
    flags: &'a CaptureFlags,
    init: &'a Completion<InitResult>,
    exited: &'a Completion<()>,
}

impl Drop for ExitGuard<'_> {
    fn drop(&mut self) {
        self.flags.set_running(false);
        self.flags.set_state(WorkerState::Stopped);
        self.init.complete(Err(CaptureError::InitializationFailed(
            "capture worker exited before initialization finished".into(),
        )));
        self.exited.complete(());
    }
}

struct ActiveStream {
    kind: SourceKind,
    stream: Box<dyn CaptureStream>,
    native: NativeFormatInfo,
    output: AudioFormat,
}

/// Native handles for one session.
///
/// Field order is drop order: streams are released before the session
/// context that created them.
struct WorkerResources {
    mic: Option<ActiveStream>,
    loopback: Option<ActiveStream>,
    mixer: Option<StreamMixer>,
    output: AudioFormat,
    _session: Box<dyn BackendSession>,
}

impl WorkerResources {
    fn stop_streams(&mut self, session_id: &str) {
        for active in [self.mic.as_mut(), self.loopback.as_mut()].into_iter().flatten() {
            if let Err(e) = active.stream.stop() {
                log::warn!("[{}] Failed to stop {} stream: {}", session_id, active.kind, e);
            }
        }
    }
}

fn initialize<B: AudioBackend + ?Sized>(
    backend: &B,
    ctx: &WorkerContext,
) -> Result<WorkerResources, CaptureError> {
    let mut session = backend
        .open_session()
        .map_err(|e| {
            CaptureError::InitializationFailed(format!("failed to open native session: {}", e))
        })?;

    let mut mic = None;
    let mut loopback = None;
    let mut failures = Vec::new();

    for kind in ctx.source.kinds() {
        let device_id = match kind {
            SourceKind::Microphone => ctx.mic_device.as_deref(),
            SourceKind::SystemAudio => ctx.loopback_device.as_deref(),
        };
        match open_stream(&mut *session, kind, device_id) {
            Ok(active) => {
                log::debug!("[{}] Opened {} stream: {}", ctx.session_id, kind, active.native);
                match kind {
                    SourceKind::Microphone => mic = Some(active),
                    SourceKind::SystemAudio => loopback = Some(active),
                }
            }
            Err(e) => {
                log::warn!("[{}] Failed to open {} stream: {}", ctx.session_id, kind, e);
                failures.push(format!("{}: {}", kind, e));
            }
        }
    }

    if mic.is_none() && loopback.is_none() {
        return Err(CaptureError::InitializationFailed(if failures.is_empty() {
            "no audio source configured".into()
        } else {
            failures.join("; ")
        }));
    }

    for active in [mic.as_ref(), loopback.as_ref()].into_iter().flatten() {
        if !active.native.is_convertible() {
            warn(
                ctx,
                &format!(
                    "unsupported native format {} on {}, recording silence",
                    active.native, active.kind
                ),
            );
        }
    }

    if !failures.is_empty() {
        warn(
            ctx,
            &format!("continuing with partial capture, failed to open {}", failures.join("; ")),
        );
    }

    let mismatch = match (&mic, &loopback) {
        (Some(m), Some(l)) if !m.output.is_mix_compatible(&l.output) => {
            Some(CaptureError::FormatMismatch {
                mic: m.output,
                loopback: l.output,
            })
        }
        _ => None,
    };
    if let Some(mismatch) = mismatch {
        warn(ctx, &format!("{}; dropping system audio, recording microphone only", mismatch));
        if let Some(mut dropped) = loopback.take() {
            let _ = dropped.stream.stop();
        }
    }

    let output = mic
        .as_ref()
        .or(loopback.as_ref())
        .map(|active| active.output)
        .ok_or(CaptureError::DeviceNotAvailable)?;
    let mixer = (mic.is_some() && loopback.is_some())
        .then(|| StreamMixer::new(output).with_max_pending_ms(ctx.config.max_pending_ms));

    Ok(WorkerResources {
        mic,
        loopback,
        mixer,
        output,
        _session: session,
    })
}

fn open_stream(
    session: &mut dyn BackendSession,
    kind: SourceKind,
    device_id: Option<&str>,
) -> Result<ActiveStream, CaptureError> {
    let mut stream = session.open_stream(kind, device_id)?;
    let native = stream.format();
    if native.channels == 0 || native.sample_rate == 0 {
        return Err(CaptureError::UnsupportedFormat(native.to_string()));
    }
    stream.start()?;
    Ok(ActiveStream {
        kind,
        stream,
        native,
        output: native.output_format(),
    })
}

enum Pulled {
    Nothing,
    Discarded,
    Pcm(Vec<u8>),
}

/// Pop one packet from `active`. While paused the packet is released
/// without being converted.
fn pull(
    active: &mut ActiveStream,
    paused: bool,
    counters: &DiagnosticsCounters,
) -> Result<Pulled, CaptureError> {
    let native = active.native;
    let mut pcm = None;
    let got = active.stream.read_packet(&mut |packet: NativePacket<'_>| {
        counters.record_packet(packet.silent, paused);
        if !paused {
            pcm = Some(converter::convert_packet(&packet, &native));
        }
    })?;

    Ok(match (got, pcm) {
        (false, _) => Pulled::Nothing,
        (true, Some(pcm)) => Pulled::Pcm(pcm),
        (true, None) => Pulled::Discarded,
    })
}

fn capture_loop(res: &mut WorkerResources, ctx: &WorkerContext) -> Result<(), CaptureError> {
    let mut was_paused = false;
    let mut stall_reported = false;

    loop {
        if ctx.flags.stop_requested() {
            return Ok(());
        }

        let paused = ctx.flags.is_paused();
        if paused != was_paused {
            if paused {
                ctx.flags.set_state(WorkerState::Paused);
                if let Some(mixer) = res.mixer.as_mut() {
                    mixer.clear();
                }
                log::debug!("[{}] Capture paused, discarding native buffers", ctx.session_id);
            } else {
                ctx.flags.set_state(WorkerState::Running);
                log::debug!("[{}] Capture resumed", ctx.session_id);
            }
            was_paused = paused;
        }

        let mut got_data = false;
        for active in [res.mic.as_mut(), res.loopback.as_mut()].into_iter().flatten() {
            for _ in 0..MAX_PACKETS_PER_POLL {
                if ctx.flags.stop_requested() {
                    return Ok(());
                }
                let pcm = match pull(active, paused, &ctx.counters)? {
                    Pulled::Nothing => break,
                    Pulled::Discarded => {
                        got_data = true;
                        continue;
                    }
                    Pulled::Pcm(pcm) => pcm,
                };
                got_data = true;

                match res.mixer.as_mut() {
                    Some(mixer) => {
                        match active.kind {
                            SourceKind::Microphone => mixer.push_mic(&pcm),
                            SourceKind::SystemAudio => mixer.push_loopback(&pcm),
                        }
                        while let Some(mixed) = mixer.drain() {
                            emit(ctx, &mixed);
                        }
                        if let Some(lone) = mixer.drain_overflow() {
                            if !stall_reported {
                                let message = format!(
                                    "only {} is delivering audio, passing it through unmixed",
                                    active.kind
                                );
                                warn(ctx, &message);
                                stall_reported = true;
                            }
                            emit(ctx, &lone);
                        }
                    }
                    None => emit(ctx, &pcm),
                }
            }
        }

        if paused {
            thread::sleep(ctx.config.paused_poll());
        } else if !got_data {
            thread::sleep(ctx.config.idle_poll());
        }
    }
}

fn emit(ctx: &WorkerContext, pcm: &[u8]) {
    if pcm.is_empty() || ctx.flags.stop_requested() {
        return;
    }
    let timestamp_ms = ctx.timing.next_buffer_timestamp();
    ctx.counters.record_emit(pcm.len());
    ctx.listener.on_audio_data(pcm, timestamp_ms);
    if ctx.config.emit_levels {
        ctx.listener.on_level_changed(levels::peak_level(pcm));
    }
}

fn warn(ctx: &WorkerContext, message: &str) {
    log::warn!("[{}] {}", ctx.session_id, message);
    ctx.listener.on_warning(message);
}
