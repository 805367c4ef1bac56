//! Recording controller
//!
//! Owns the frame buffer and drives the capture lifecycle: key bindings,
//! fixed-cadence capture on host ticks, and export when recording stops.

use super::clock::CaptureClock;
use super::input::{self, KeyCommand, KeyInput};
use super::state::{RecordingSession, RecordingState, StopOutcome};
use crate::capture::{CaptureError, Frame, FrameSource, Resolution};
use crate::config::RecordingSettings;
use crate::export::{ExportError, ExportProgress, ExportReport, VideoExporter};
use crate::utils::error::{RecorderError, RecorderResult};
use parking_lot::RwLock;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Events emitted during recording
#[derive(Debug, Clone)]
pub enum RecordingEvent {
    /// Recording started
    Started { session_id: Uuid },
    /// Recording stopped; export follows
    Stopped { session_id: Uuid, frame_count: usize },
    /// A capture slot produced no frame
    CaptureSkipped { session_id: Uuid, reason: String },
    /// Export progress update
    ExportProgress(ExportProgress),
    /// Video written
    ExportComplete(ExportReport),
    /// Export failed
    ExportFailed { session_id: Uuid, message: String },
    /// Frames kept from a failed export were thrown away
    FramesDiscarded { session_id: Uuid, frame_count: usize },
}

/// What happened during one host tick
#[derive(Debug, Default)]
#[must_use]
pub struct TickReport {
    /// Frames appended to the buffer this tick
    pub captured: u32,
    /// A recording started this tick
    pub started: bool,
    /// Result of a stop (key binding) or of a background export finishing
    pub export: Option<RecorderResult<StopOutcome>>,
}

/// What a background export hands back. Frames come back only when they
/// still need a home.
enum ExportMessage {
    Finished(Result<Option<ExportReport>, ExportError>, Vec<Frame>),
    Panicked(String, Vec<Frame>),
}

/// An export running on the blocking pool
struct BackgroundExport {
    session: RecordingSession,
    frame_count: usize,
    receiver: Receiver<ExportMessage>,
    task: JoinHandle<()>,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// State machine around one frame buffer
pub struct RecordingController {
    settings: RecordingSettings,
    source: Box<dyn FrameSource>,
    exporter: VideoExporter,

    /// Current recording state, shared read-only with UI surfaces
    state: Arc<RwLock<RecordingState>>,

    /// Captured frames of the current (or failed) session
    frames: Vec<Frame>,

    clock: CaptureClock,

    /// Session being recorded
    session: Option<RecordingSession>,

    /// Session whose export failed; its frames are still in `frames`
    retained: Option<RecordingSession>,

    background: Option<BackgroundExport>,

    /// Runtime for background exports; without one, stop blocks
    runtime: Option<Handle>,

    event_tx: broadcast::Sender<RecordingEvent>,
}

impl RecordingController {
    /// Create an idle controller
    pub fn new(
        settings: RecordingSettings,
        source: Box<dyn FrameSource>,
        exporter: VideoExporter,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        let clock = CaptureClock::new(settings.capture_fps());
        Self {
            settings,
            source,
            exporter,
            state: Arc::new(RwLock::new(RecordingState::Idle)),
            frames: Vec::new(),
            clock,
            session: None,
            retained: None,
            background: None,
            runtime: None,
            event_tx,
        }
    }

    /// Export on `runtime`'s blocking pool when a stop key is pressed
    pub fn with_runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Replace the settings; only while idle
    pub fn configure(&mut self, settings: RecordingSettings) -> RecorderResult<()> {
        let state = self.state();
        if state != RecordingState::Idle {
            return Err(RecorderError::Busy(state));
        }
        self.clock = CaptureClock::new(settings.capture_fps());
        self.settings = settings;
        Ok(())
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    /// Get the current recording state
    pub fn state(&self) -> RecordingState {
        *self.state.read()
    }

    /// Shared, read-only view of the state for other threads
    pub fn status_handle(&self) -> Arc<RwLock<RecordingState>> {
        self.state.clone()
    }

    /// Subscribe to recording events
    pub fn subscribe(&self) -> broadcast::Receiver<RecordingEvent> {
        self.event_tx.subscribe()
    }

    /// Frames currently buffered (including frames retained after a failed export)
    pub fn buffered_frames(&self) -> usize {
        self.frames.len()
    }

    /// Session being recorded, if any
    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    /// Length of the buffered footage at the capture cadence
    pub fn recording_duration(&self) -> Duration {
        self.clock.interval() * self.frames.len() as u32
    }

    /// Host-side frame source
    pub fn source_mut(&mut self) -> &mut dyn FrameSource {
        self.source.as_mut()
    }

    fn set_state(&self, state: RecordingState) {
        *self.state.write() = state;
    }

    fn emit(&self, event: RecordingEvent) {
        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }

    /// Begin a new recording. Returns false if nothing changed.
    pub fn start_recording(&mut self) -> bool {
        match self.state() {
            RecordingState::Recording => return false,
            RecordingState::Exporting => {
                tracing::warn!("Cannot start recording while the previous one is exporting");
                return false;
            }
            RecordingState::Idle => {}
        }

        self.discard_retained_frames();
        self.frames.clear();
        self.clock.reset();

        let session = RecordingSession::new();
        tracing::info!("Recording started, session {}", session.id);
        self.emit(RecordingEvent::Started {
            session_id: session.id,
        });
        self.session = Some(session);
        self.set_state(RecordingState::Recording);
        true
    }

    /// End the session, leaving the buffer in place for export
    fn end_session(&mut self) -> Option<RecordingSession> {
        if self.state() != RecordingState::Recording {
            tracing::debug!("Stop requested while {:?}, ignoring", self.state());
            return None;
        }

        let session = self.session.take().unwrap_or_default();
        tracing::info!(
            "Recording stopped, session {}: {} captured, {} skipped, {} rejected, {} throttled",
            session.id,
            session.captured,
            session.skipped,
            session.rejected,
            session.throttled
        );
        self.emit(RecordingEvent::Stopped {
            session_id: session.id,
            frame_count: self.frames.len(),
        });
        Some(session)
    }

    /// Stop recording and export the buffer on this thread.
    ///
    /// Blocks until the video is written. On failure the frames stay buffered
    /// for [`retry_export`](Self::retry_export).
    pub fn stop_recording(&mut self) -> RecorderResult<StopOutcome> {
        let Some(session) = self.end_session() else {
            return Ok(StopOutcome::NotRecording);
        };
        self.set_state(RecordingState::Idle);
        self.export_blocking(session)
    }

    /// Stop recording and export on the configured runtime.
    ///
    /// The controller stays in [`RecordingState::Exporting`] until the
    /// export finishes; see [`poll_export`](Self::poll_export).
    pub fn stop_recording_in_background(&mut self) -> RecorderResult<StopOutcome> {
        let Some(runtime) = self.runtime.clone() else {
            return Err(RecorderError::NoRuntime);
        };
        let Some(session) = self.end_session() else {
            return Ok(StopOutcome::NotRecording);
        };

        if self.frames.is_empty() {
            self.set_state(RecordingState::Idle);
            return Ok(StopOutcome::Empty);
        }

        let frames = std::mem::take(&mut self.frames);
        let exporter = self.exporter.clone();
        let settings = self.settings.clone();
        let event_tx = self.event_tx.clone();
        let session_id = session.id;
        let frame_count = frames.len();
        let (done_tx, done_rx) = mpsc::channel();

        self.set_state(RecordingState::Exporting);
        tracing::info!("Exporting {} frames in the background", frame_count);

        let task = runtime.spawn_blocking(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                exporter.export(session_id, &frames, &settings, |progress| {
                    let _ = event_tx.send(RecordingEvent::ExportProgress(progress));
                })
            }));
            let message = match outcome {
                Ok(Ok(report)) => ExportMessage::Finished(Ok(report), Vec::new()),
                Ok(Err(e)) => ExportMessage::Finished(Err(e), frames),
                Err(payload) => ExportMessage::Panicked(panic_message(payload.as_ref()), frames),
            };
            let _ = done_tx.send(message);
        });

        self.background = Some(BackgroundExport {
            session,
            frame_count,
            receiver: done_rx,
            task,
        });
        Ok(StopOutcome::ExportStarted)
    }

    /// Check whether a background export has finished
    pub fn poll_export(&mut self) -> Option<RecorderResult<StopOutcome>> {
        let message = match self.background.as_ref()?.receiver.try_recv() {
            Ok(message) => Ok(message),
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(()),
        };
        Some(self.complete_background(message))
    }

    /// Block until a background export finishes
    pub fn wait_for_export(&mut self) -> Option<RecorderResult<StopOutcome>> {
        let message = self.background.as_ref()?.receiver.recv().map_err(|_| ());
        Some(self.complete_background(message))
    }

    fn complete_background(
        &mut self,
        message: Result<ExportMessage, ()>,
    ) -> RecorderResult<StopOutcome> {
        let Some(background) = self.background.take() else {
            return Ok(StopOutcome::NotRecording);
        };
        self.set_state(RecordingState::Idle);

        let session_id = background.session.id;
        let (message, frames) = match message {
            Ok(ExportMessage::Finished(result, frames)) => {
                return self.finish_export(background.session, frames, result);
            }
            Ok(ExportMessage::Panicked(reason, frames)) => {
                (format!("export panicked: {}", reason), Some(frames))
            }
            Err(()) if background.task.is_finished() => (
                format!(
                    "export task was cancelled by its runtime, {} frames lost",
                    background.frame_count
                ),
                None,
            ),
            Err(()) => (
                format!(
                    "export task ended without reporting, {} frames lost",
                    background.frame_count
                ),
                None,
            ),
        };

        tracing::error!("Session {}: {}", session_id, message);
        self.emit(RecordingEvent::ExportFailed {
            session_id,
            message: message.clone(),
        });
        if let Some(frames) = frames {
            tracing::error!("Keeping {} frames of session {}", frames.len(), session_id);
            self.frames = frames;
            self.retained = Some(background.session);
        }
        Err(RecorderError::TaskFailed(message))
    }

    /// Try again to export frames kept from a failed export
    pub fn retry_export(&mut self) -> RecorderResult<StopOutcome> {
        let state = self.state();
        if state != RecordingState::Idle {
            return Err(RecorderError::Busy(state));
        }
        match self.retained.take() {
            Some(session) => self.export_blocking(session),
            None => Ok(StopOutcome::NotRecording),
        }
    }

    /// Drop frames kept from a failed export. Returns how many were dropped.
    pub fn discard_retained_frames(&mut self) -> usize {
        let Some(session) = self.retained.take() else {
            return 0;
        };
        let dropped = self.frames.len();
        self.frames.clear();
        tracing::warn!(
            "Discarded {} frames of session {} that failed to export",
            dropped,
            session.id
        );
        self.emit(RecordingEvent::FramesDiscarded {
            session_id: session.id,
            frame_count: dropped,
        });
        dropped
    }

    fn export_blocking(&mut self, session: RecordingSession) -> RecorderResult<StopOutcome> {
        let frames = std::mem::take(&mut self.frames);
        let event_tx = self.event_tx.clone();
        let result = self.exporter.export(session.id, &frames, &self.settings, |progress| {
            let _ = event_tx.send(RecordingEvent::ExportProgress(progress));
        });
        self.finish_export(session, frames, result)
    }

    fn finish_export(
        &mut self,
        session: RecordingSession,
        frames: Vec<Frame>,
        result: Result<Option<ExportReport>, ExportError>,
    ) -> RecorderResult<StopOutcome> {
        match result {
            Ok(None) => Ok(StopOutcome::Empty),
            Ok(Some(report)) => {
                self.emit(RecordingEvent::ExportComplete(report.clone()));
                Ok(StopOutcome::Exported(report))
            }
            Err(source) => {
                let retained_frames = frames.len();
                self.emit(RecordingEvent::ExportFailed {
                    session_id: session.id,
                    message: source.to_string(),
                });
                tracing::error!(
                    "Keeping {} frames of session {} after failed export",
                    retained_frames,
                    session.id
                );
                self.frames = frames;
                self.retained = Some(session);
                Err(RecorderError::Export {
                    source,
                    retained_frames,
                })
            }
        }
    }

    /// Advance by one host update.
    ///
    /// Handles start/stop bindings, then takes every capture that came due
    /// during `delta`. A stop from a key binding exports in the background
    /// when a runtime is configured and blocks otherwise.
    pub fn tick<I>(&mut self, delta: Duration, input: &I) -> TickReport
    where
        I: KeyInput + ?Sized,
    {
        let mut report = TickReport {
            export: self.poll_export(),
            ..Default::default()
        };

        let commands = input::commands(
            input,
            self.settings.start_capture_key.as_ref(),
            self.settings.stop_capture_key.as_ref(),
        );
        for command in commands {
            let stop = match command {
                KeyCommand::Start => false,
                KeyCommand::Stop => true,
                KeyCommand::Toggle => self.state() == RecordingState::Recording,
            };
            if stop {
                let stopped = if self.runtime.is_some() {
                    self.stop_recording_in_background()
                } else {
                    self.stop_recording()
                };
                // Keep a background result that arrived this tick
                if report.export.is_none() || !matches!(stopped, Ok(StopOutcome::NotRecording)) {
                    report.export = Some(stopped);
                }
            } else {
                report.started |= self.start_recording();
            }
        }

        if self.state() == RecordingState::Recording {
            report.captured = self.advance(delta);
        }

        report
    }

    /// Same as [`tick`](Self::tick) with the delta in seconds
    pub fn tick_secs<I>(&mut self, delta_seconds: f32, input: &I) -> TickReport
    where
        I: KeyInput + ?Sized,
    {
        let delta = Duration::try_from_secs_f32(delta_seconds).unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid tick delta {}", delta_seconds);
            Duration::ZERO
        });
        self.tick(delta, input)
    }

    /// Run the capture clock and capture every due slot
    fn advance(&mut self, delta: Duration) -> u32 {
        let due = self.clock.advance(delta);
        let allowed = match self.settings.max_captures_per_tick {
            Some(limit) => due.min(limit as u64),
            None => due,
        };

        if due > allowed {
            tracing::warn!("Dropping {} late capture slots", due - allowed);
            if let Some(session) = self.session.as_mut() {
                session.throttled += due - allowed;
            }
        }

        let mut captured = 0;
        for _ in 0..allowed {
            if self.capture_frame() {
                captured += 1;
            }
        }
        captured
    }

    /// Pull one frame from the source into the buffer
    fn capture_frame(&mut self) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };

        let captured = self.source.capture().and_then(|frame| {
            if frame.width() == 0 || frame.height() == 0 {
                Err(CaptureError::Empty)
            } else {
                Ok(frame)
            }
        });
        let frame = match captured {
            Ok(frame) => frame,
            Err(e) => {
                session.skipped += 1;
                let session_id = session.id;
                tracing::warn!("Capture skipped: {}", e);
                self.emit(RecordingEvent::CaptureSkipped {
                    session_id,
                    reason: e.to_string(),
                });
                return false;
            }
        };

        let resolution = Resolution::of(&frame);
        let expected = *session.resolution.get_or_insert(resolution);
        if resolution != expected {
            session.rejected += 1;
            let session_id = session.id;
            tracing::warn!("Rejected {} frame, recording is {}", resolution, expected);
            self.emit(RecordingEvent::CaptureSkipped {
                session_id,
                reason: format!("frame is {}, recording is {}", resolution, expected),
            });
            return false;
        }

        session.captured += 1;
        tracing::debug!("Captured frame {} ({})", session.captured, resolution);
        self.frames.push(frame);
        true
    }

    /// Finish any in-flight work: waits for a background export, then stops
    /// and exports an active recording on this thread.
    pub fn shutdown(&mut self) -> RecorderResult<StopOutcome> {
        if let Some(result) = self.wait_for_export() {
            result?;
        }
        self.stop_recording()
    }
}

impl Drop for RecordingController {
    fn drop(&mut self) {
        if self.state() != RecordingState::Idle || self.background.is_some() {
            tracing::info!("Recorder torn down while {:?}, flushing", self.state());
            if let Err(e) = self.shutdown() {
                tracing::error!("Failed to flush recording on teardown: {}", e);
            }
        }

        if self.retained.is_some() {
            let dropped = self.discard_retained_frames();
            tracing::error!("Recorder torn down with {} unexported frames, they are lost", dropped);
        }
    }
}
