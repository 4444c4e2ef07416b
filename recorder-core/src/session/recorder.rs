use std::collections::VecDeque;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use log::{debug, error, warn};
use parking_lot::Mutex;

use crate::models::artifact::{EncodedArtifact, RAW_MIME_TYPE};
use crate::models::config::RecorderConfig;
use crate::models::error::RecorderError;
use crate::models::export::{ArtifactCallback, BufferCallback, ExportData};
use crate::models::state::RecorderState;
use crate::session::notification::Notification;
use crate::session::worker::{self, Command, Reply};
use crate::traits::capture_source::{CaptureSource, ChunkCallback};
use crate::traits::recorder_delegate::RecorderDelegate;

/// Completion handle for an export that yields an encoded artifact.
pub type ArtifactNotification = Notification<Result<EncodedArtifact, RecorderError>>;

/// Requests waiting on a worker reply, oldest first per kind.
#[derive(Default)]
struct PendingRequests {
    buffer: VecDeque<BufferCallback>,
    wav: VecDeque<ArtifactCallback>,
    raw: VecDeque<ArtifactNotification>,
}

/// Controller bookkeeping, shared by the capture callback, the public API
/// and the reply thread. Held only for O(1) work; callbacks never run
/// under it.
struct ControllerState {
    state: RecorderState,
    capture_count: u64,
    has_data: Notification<()>,
    /// Raw export waiting to ride on the next captured period.
    armed_raw: Option<ArtifactNotification>,
    pending: PendingRequests,
    commands: Option<Sender<Command>>,
}

impl ControllerState {
    fn new(commands: Sender<Command>) -> Self {
        Self {
            state: RecorderState::Idle,
            capture_count: 0,
            has_data: Notification::new(),
            armed_raw: None,
            pending: PendingRequests::default(),
            commands: Some(commands),
        }
    }

    fn send(&self, command: Command) -> Result<(), RecorderError> {
        let commands = self.commands.as_ref().ok_or(RecorderError::WorkerUnavailable)?;
        commands.send(command).map_err(|_| RecorderError::WorkerUnavailable)
    }

    /// Send a standalone raw export and queue its notification.
    fn dispatch_raw(&mut self, notification: ArtifactNotification) {
        let command = Command::ExportRaw {
            mime_type: RAW_MIME_TYPE.into(),
        };
        match self.send(command) {
            Ok(()) => self.pending.raw.push_back(notification),
            Err(e) => {
                notification.fulfill(Err(e));
            }
        }
    }
}

struct Shared {
    config: RecorderConfig,
    sample_rate: u32,
    controller: Mutex<ControllerState>,
    delegate: Mutex<Option<Arc<dyn RecorderDelegate>>>,
}

impl Shared {
    fn delegate(&self) -> Option<Arc<dyn RecorderDelegate>> {
        self.delegate.lock().clone()
    }

    fn notify_state(&self, state: RecorderState) {
        if let Some(delegate) = self.delegate() {
            delegate.on_state_changed(state);
        }
    }

    fn report_error(&self, error: &RecorderError) {
        if let Some(delegate) = self.delegate() {
            delegate.on_error(error);
        }
    }

    fn report<T>(&self, result: &Result<T, RecorderError>) {
        if let Err(e) = result {
            self.report_error(e);
        }
    }

    /// Capture-thread entry point: forward one period to the worker.
    fn on_capture(&self, chunks: Vec<Vec<f32>>) {
        let first_period = {
            let mut controller = self.controller.lock();
            if !controller.state.is_recording() {
                return;
            }
            let first = controller.capture_count == 0;
            controller.capture_count += 1;

            let armed = controller.armed_raw.take();
            let command = Command::Ingest {
                chunks,
                export_raw_as: armed.as_ref().map(|_| RAW_MIME_TYPE.to_string()),
            };
            match controller.send(command) {
                Ok(()) => {
                    if let Some(notification) = armed {
                        controller.pending.raw.push_back(notification);
                    }
                }
                Err(e) => {
                    warn!("Dropping captured period: {}", e);
                    if let Some(notification) = armed {
                        notification.fulfill(Err(e));
                    }
                }
            }

            first.then(|| controller.has_data.clone())
        };

        if let Some(has_data) = first_period {
            has_data.fulfill(());
        }
    }

    /// Answer every outstanding request with `WorkerUnavailable`.
    ///
    /// Runs once the reply channel closes. If the command sender is still
    /// held the worker died under a live recorder; it is released so later
    /// requests fail immediately instead of queueing.
    fn abandon_pending(&self) {
        let (armed, pending) = {
            let mut controller = self.controller.lock();
            if controller.commands.take().is_some() {
                error!("Recorder worker exited unexpectedly");
            }
            (controller.armed_raw.take(), std::mem::take(&mut controller.pending))
        };

        let abandoned = pending.buffer.len() + pending.wav.len() + pending.raw.len() + usize::from(armed.is_some());
        if abandoned > 0 {
            warn!("Abandoning {} export request(s) without a worker reply", abandoned);
        }
        if let Some(notification) = armed {
            notification.fulfill(Err(RecorderError::WorkerUnavailable));
        }
        for callback in pending.buffer {
            callback(Err(RecorderError::WorkerUnavailable));
        }
        for callback in pending.wav {
            callback(Err(RecorderError::WorkerUnavailable));
        }
        for notification in pending.raw {
            notification.fulfill(Err(RecorderError::WorkerUnavailable));
        }
    }

    /// Reply-thread entry point: hand a worker reply to its requester.
    fn dispatch(&self, reply: Reply) {
        let kind = reply.kind();
        match reply {
            Reply::Buffer(result) => {
                self.report(&result);
                let callback = self.controller.lock().pending.buffer.pop_front();
                match callback {
                    Some(callback) => callback(result),
                    None => warn!("Buffer reply arrived with no pending request"),
                }
            }
            Reply::Wav(result) => {
                self.report(&result);
                let callback = self.controller.lock().pending.wav.pop_front();
                match callback {
                    Some(callback) => callback(result),
                    None => warn!("WAV reply arrived with no pending request"),
                }
            }
            Reply::Raw(result) => {
                self.report(&result);
                let notification = self.controller.lock().pending.raw.pop_front();
                match notification {
                    Some(notification) => {
                        notification.fulfill(result);
                    }
                    None => warn!("Raw reply arrived with no pending request"),
                }
            }
            Reply::Fault(e) => self.report_error(&e),
        }

        if let (Some(kind), Some(delegate)) = (kind, self.delegate()) {
            delegate.on_export_finished(kind);
        }
    }
}

/// Recording controller.
///
/// Owns a capture source and a worker thread. Captured periods cross to the
/// worker over a channel, so the capture callback never merges or encodes.
/// Exports are asynchronous: requests are queued and answered, per kind, in
/// the order they were made.
///
/// ```text
/// [CaptureSource] ──periods──→ [Recorder] ──Command──→ [worker: Accumulator + codec]
///                                  ↑                              │
///                                  └──────────Reply───────────────┘
/// ```
pub struct Recorder<S: CaptureSource> {
    source: S,
    shared: Arc<Shared>,
    worker_handle: Option<thread::JoinHandle<()>>,
    reply_handle: Option<thread::JoinHandle<()>>,
}

impl<S: CaptureSource> Recorder<S> {
    /// Spawn the worker, initialize it for `source`'s sample rate, and start
    /// the source. Recording itself begins with [`start`](Self::start).
    pub fn new(source: S, config: RecorderConfig) -> Result<Self, RecorderError> {
        config.validate()?;
        let sample_rate = source.sample_rate();
        config.validate_sample_rate(sample_rate)?;

        let (command_tx, command_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel::<Reply>();
        let worker_handle = worker::spawn(command_rx, reply_tx)?;

        command_tx
            .send(Command::Initialize {
                sample_rate,
                num_channels: config.num_channels,
                output_format: config.output_format,
            })
            .map_err(|_| RecorderError::WorkerUnavailable)?;

        let shared = Arc::new(Shared {
            config,
            sample_rate,
            controller: Mutex::new(ControllerState::new(command_tx)),
            delegate: Mutex::new(None),
        });

        let dispatcher = Arc::clone(&shared);
        let reply_handle = thread::Builder::new()
            .name("recorder-replies".into())
            .spawn(move || {
                for reply in reply_rx {
                    dispatcher.dispatch(reply);
                }
                dispatcher.abandon_pending();
                debug!("Recorder reply thread stopped");
            })
            .map_err(|e| {
                warn!("Failed to spawn recorder reply thread: {}", e);
                RecorderError::WorkerUnavailable
            })?;

        let mut recorder = Self {
            source,
            shared,
            worker_handle: Some(worker_handle),
            reply_handle: Some(reply_handle),
        };

        let capture = Arc::clone(&recorder.shared);
        let callback: ChunkCallback = Arc::new(move |chunks: Vec<Vec<f32>>| capture.on_capture(chunks));
        recorder.source.start(callback)?;

        debug!(
            "Recorder ready: {} Hz, {} channel(s), period {}",
            sample_rate, recorder.shared.config.num_channels, recorder.shared.config.buffer_len
        );
        Ok(recorder)
    }

    pub fn set_delegate(&self, delegate: Arc<dyn RecorderDelegate>) {
        *self.shared.delegate.lock() = Some(delegate);
    }

    pub fn config(&self) -> &RecorderConfig {
        &self.shared.config
    }

    pub fn sample_rate(&self) -> u32 {
        self.shared.sample_rate
    }

    pub fn state(&self) -> RecorderState {
        self.shared.controller.lock().state
    }

    pub fn is_recording(&self) -> bool {
        self.state().is_recording()
    }

    /// Periods forwarded since the last `start`.
    pub fn capture_count(&self) -> u64 {
        self.shared.controller.lock().capture_count
    }

    /// Begin forwarding captured periods.
    ///
    /// The returned notification fulfills when the first period arrives.
    /// While already recording this changes nothing and returns the
    /// in-flight notification; buffered audio is never discarded.
    pub fn start(&self) -> Notification<()> {
        let has_data = {
            let mut controller = self.shared.controller.lock();
            if controller.state.is_recording() {
                return controller.has_data.clone();
            }
            controller.has_data = Notification::new();
            controller.capture_count = 0;
            controller.state = RecorderState::Recording;
            controller.has_data.clone()
        };

        debug!("Recording started");
        self.shared.notify_state(RecorderState::Recording);
        has_data
    }

    /// Stop forwarding periods. A raw export still waiting for a period is
    /// sent immediately instead.
    pub fn stop(&self) {
        let was_recording = {
            let mut controller = self.shared.controller.lock();
            if let Some(armed) = controller.armed_raw.take() {
                controller.dispatch_raw(armed);
            }
            let was_recording = controller.state.is_recording();
            controller.state = RecorderState::Idle;
            was_recording
        };

        if was_recording {
            debug!("Recording stopped");
            self.shared.notify_state(RecorderState::Idle);
        }
    }

    /// Ask for a snapshot of every channel's samples.
    ///
    /// Falls back to the configured default callback; with neither, fails
    /// with [`RecorderError::CallbackNotSet`] before anything is sent.
    pub fn request_buffer(&self, callback: Option<BufferCallback>) -> Result<(), RecorderError> {
        let callback: BufferCallback = match callback {
            Some(callback) => callback,
            None => {
                let default = self.shared.config.callback.clone().ok_or(RecorderError::CallbackNotSet)?;
                Box::new(move |result: Result<Vec<Vec<f32>>, RecorderError>| {
                    default(result.map(ExportData::Buffers))
                })
            }
        };

        let mut controller = self.shared.controller.lock();
        controller.send(Command::ExportBuffer)?;
        controller.pending.buffer.push_back(callback);
        Ok(())
    }

    /// Ask for a WAV file of everything recorded so far.
    ///
    /// `mime_type` defaults to the configured one. Callback resolution works
    /// as in [`request_buffer`](Self::request_buffer).
    pub fn request_wav(&self, callback: Option<ArtifactCallback>, mime_type: Option<&str>) -> Result<(), RecorderError> {
        let callback: ArtifactCallback = match callback {
            Some(callback) => callback,
            None => {
                let default = self.shared.config.callback.clone().ok_or(RecorderError::CallbackNotSet)?;
                Box::new(move |result: Result<EncodedArtifact, RecorderError>| {
                    default(result.map(ExportData::Artifact))
                })
            }
        };
        let mime_type = mime_type.unwrap_or(&self.shared.config.mime_type).to_string();

        let mut controller = self.shared.controller.lock();
        controller.send(Command::ExportWav { mime_type })?;
        controller.pending.wav.push_back(callback);
        Ok(())
    }

    /// Ask for a headerless PCM export in the configured output format.
    ///
    /// While recording, the export rides on the next captured period (or on
    /// `stop`, whichever comes first), so it includes that period. While
    /// idle it is sent right away. Repeated requests before the next period
    /// share one export.
    pub fn request_raw_export(&self) -> ArtifactNotification {
        let mut controller = self.shared.controller.lock();
        if let Some(armed) = &controller.armed_raw {
            return armed.clone();
        }

        let notification = Notification::new();
        if controller.state.is_recording() {
            controller.armed_raw = Some(notification.clone());
        } else {
            controller.dispatch_raw(notification.clone());
        }
        notification
    }

    /// Discard everything buffered. Recording state is unchanged.
    pub fn clear(&self) -> Result<(), RecorderError> {
        self.shared.controller.lock().send(Command::Reset)
    }

    /// [`request_buffer`](Self::request_buffer) and wait for the reply.
    ///
    /// Must not be called from an export callback: those run on the thread
    /// that delivers the reply.
    pub fn export_buffer_blocking(&self) -> Result<Vec<Vec<f32>>, RecorderError> {
        let done = Notification::new();
        let reply = done.clone();
        self.request_buffer(Some(Box::new(move |result: Result<Vec<Vec<f32>>, RecorderError>| {
            reply.fulfill(result);
        })))?;
        done.wait()
    }

    /// [`request_wav`](Self::request_wav) and wait for the reply.
    ///
    /// Same threading caveat as [`export_buffer_blocking`](Self::export_buffer_blocking).
    pub fn export_wav_blocking(&self, mime_type: Option<&str>) -> Result<EncodedArtifact, RecorderError> {
        let done: ArtifactNotification = Notification::new();
        let reply = done.clone();
        self.request_wav(
            Some(Box::new(move |result: Result<EncodedArtifact, RecorderError>| {
                reply.fulfill(result);
            })),
            mime_type,
        )?;
        done.wait()
    }
}

impl<S: CaptureSource> Drop for Recorder<S> {
    fn drop(&mut self) {
        if let Err(e) = self.source.stop() {
            warn!("Failed to stop capture source: {}", e);
        }

        {
            let mut controller = self.shared.controller.lock();
            controller.commands.take();
            controller.state = RecorderState::Idle;
        }

        let current = thread::current().id();
        for handle in [self.worker_handle.take(), self.reply_handle.take()].into_iter().flatten() {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("Recorder thread panicked");
            }
        }

        // Normally already done by the reply thread on its way out.
        self.shared.abandon_pending();
        debug!("Recorder shut down");
    }
}
