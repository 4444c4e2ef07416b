//! Execution boundary between the capture callback and encode work.
//!
//! The capture side only sends [`Command`]s; all sample storage lives in a
//! [`RecordingSession`] owned by the worker thread. Commands are handled
//! strictly in arrival order and each export command yields exactly one
//! [`Reply`].

use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use log::{debug, error, info, warn};

use crate::models::artifact::{ArtifactKind, EncodedArtifact};
use crate::models::config::OutputFormat;
use crate::models::error::RecorderError;
use crate::models::export::ExportKind;
use crate::processing::accumulator::Accumulator;
use crate::processing::codec;

/// Work sent to the recorder worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start a fresh session. Replaces any previous one.
    Initialize {
        sample_rate: u32,
        num_channels: u16,
        output_format: OutputFormat,
    },
    /// Append one period. With `export_raw_as`, also encode and reply with a
    /// raw export of everything accumulated so far, this period included.
    Ingest {
        chunks: Vec<Vec<f32>>,
        export_raw_as: Option<String>,
    },
    ExportBuffer,
    ExportWav {
        mime_type: String,
    },
    ExportRaw {
        mime_type: String,
    },
    Reset,
}

/// Result sent back from the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Buffer(Result<Vec<Vec<f32>>, RecorderError>),
    Wav(Result<EncodedArtifact, RecorderError>),
    Raw(Result<EncodedArtifact, RecorderError>),
    /// A command that owes no reply failed.
    Fault(RecorderError),
}

impl Reply {
    pub fn kind(&self) -> Option<ExportKind> {
        match self {
            Self::Buffer(_) => Some(ExportKind::Buffer),
            Self::Wav(_) => Some(ExportKind::Wav),
            Self::Raw(_) => Some(ExportKind::Raw),
            Self::Fault(_) => None,
        }
    }
}

/// Accumulated audio plus the format it will be encoded in.
#[derive(Debug)]
pub struct RecordingSession {
    sample_rate: u32,
    num_channels: u16,
    output_format: OutputFormat,
    accumulator: Accumulator,
}

impl RecordingSession {
    pub fn new(sample_rate: u32, num_channels: u16, output_format: OutputFormat) -> Self {
        Self {
            sample_rate,
            num_channels,
            output_format,
            accumulator: Accumulator::new(num_channels as usize),
        }
    }

    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    pub fn ingest(&mut self, chunks: Vec<Vec<f32>>) -> Result<(), RecorderError> {
        self.accumulator.ingest(chunks)
    }

    pub fn reset(&mut self) {
        self.accumulator.reset();
    }

    pub fn export_buffer(&self) -> Result<Vec<Vec<f32>>, RecorderError> {
        self.accumulator.snapshot()
    }

    pub fn export_wav(&self, mime_type: &str) -> Result<EncodedArtifact, RecorderError> {
        let interleaved = self.accumulator.interleaved()?;
        let bytes = codec::encode_wav(&interleaved, self.sample_rate, self.num_channels)?;
        Ok(EncodedArtifact::new(
            bytes,
            mime_type,
            ArtifactKind::Wav,
            self.sample_rate,
            self.num_channels,
        ))
    }

    pub fn export_raw(&self, mime_type: &str) -> Result<EncodedArtifact, RecorderError> {
        let interleaved = self.accumulator.interleaved()?;
        let bytes = codec::encode_raw(&interleaved, self.output_format);
        Ok(EncodedArtifact::new(
            bytes,
            mime_type,
            ArtifactKind::raw(self.output_format),
            self.sample_rate,
            self.num_channels,
        ))
    }
}

/// Worker-side state: the current session, if initialized.
#[derive(Debug, Default)]
pub struct WorkerState {
    session: Option<RecordingSession>,
}

impl WorkerState {
    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    /// Apply one command and return the replies it owes, in order.
    pub fn handle(&mut self, command: Command) -> Vec<Reply> {
        match command {
            Command::Initialize {
                sample_rate,
                num_channels,
                output_format,
            } => {
                debug!(
                    "Initializing session: {} Hz, {} channel(s), {:?} raw output",
                    sample_rate, num_channels, output_format
                );
                self.session = Some(RecordingSession::new(sample_rate, num_channels, output_format));
                Vec::new()
            }
            Command::Ingest { chunks, export_raw_as } => {
                let mut replies = Vec::new();
                let Some(session) = self.session.as_mut() else {
                    warn!("Dropping captured period: session not initialized");
                    if export_raw_as.is_some() {
                        replies.push(Reply::Raw(Err(RecorderError::NotInitialized)));
                    }
                    return replies;
                };
                if let Err(e) = session.ingest(chunks) {
                    error!("Failed to ingest captured period: {}", e);
                    replies.push(Reply::Fault(e));
                }
                if let Some(mime_type) = export_raw_as {
                    replies.push(Reply::Raw(log_export(ExportKind::Raw, session.export_raw(&mime_type))));
                }
                replies
            }
            Command::ExportBuffer => {
                let result = self
                    .session
                    .as_ref()
                    .ok_or(RecorderError::NotInitialized)
                    .and_then(RecordingSession::export_buffer);
                if let Err(ref e) = result {
                    error!("Buffer export failed: {}", e);
                }
                vec![Reply::Buffer(result)]
            }
            Command::ExportWav { mime_type } => {
                let result = self
                    .session
                    .as_ref()
                    .ok_or(RecorderError::NotInitialized)
                    .and_then(|session| session.export_wav(&mime_type));
                vec![Reply::Wav(log_export(ExportKind::Wav, result))]
            }
            Command::ExportRaw { mime_type } => {
                let result = self
                    .session
                    .as_ref()
                    .ok_or(RecorderError::NotInitialized)
                    .and_then(|session| session.export_raw(&mime_type));
                vec![Reply::Raw(log_export(ExportKind::Raw, result))]
            }
            Command::Reset => {
                match self.session.as_mut() {
                    Some(session) => {
                        debug!("Clearing {} buffered samples per channel", session.accumulator().len());
                        session.reset();
                    }
                    None => warn!("Ignoring reset: session not initialized"),
                }
                Vec::new()
            }
        }
    }
}

fn log_export(
    kind: ExportKind,
    result: Result<EncodedArtifact, RecorderError>,
) -> Result<EncodedArtifact, RecorderError> {
    match &result {
        Ok(artifact) => info!(
            "{:?} export ready: {} bytes, {} frames ({})",
            kind,
            artifact.len(),
            artifact.frame_count(),
            artifact.mime_type()
        ),
        Err(e) => error!("{:?} export failed: {}", kind, e),
    }
    result
}

/// Spawn the worker thread.
///
/// The thread runs until every sender for `commands` is dropped or the
/// reply receiver goes away.
pub fn spawn(commands: Receiver<Command>, replies: Sender<Reply>) -> Result<thread::JoinHandle<()>, RecorderError> {
    thread::Builder::new()
        .name("recorder-worker".into())
        .spawn(move || run(commands, replies))
        .map_err(|e| {
            error!("Failed to spawn recorder worker: {}", e);
            RecorderError::WorkerUnavailable
        })
}

fn run(commands: Receiver<Command>, replies: Sender<Reply>) {
    debug!("Recorder worker started");
    let mut state = WorkerState::default();
    for command in commands {
        for reply in state.handle(command) {
            if replies.send(reply).is_err() {
                debug!("Reply channel closed, stopping recorder worker");
                return;
            }
        }
    }
    debug!("Recorder worker stopped");
}
