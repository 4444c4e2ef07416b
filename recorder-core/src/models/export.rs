use std::sync::Arc;

use super::artifact::EncodedArtifact;
use super::error::RecorderError;

/// The kind of export a request or worker reply refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportKind {
    /// Per-channel float buffers, unencoded.
    Buffer,
    /// Headered 16-bit WAV file.
    Wav,
    /// Bare interleaved PCM stream in the configured output format.
    Raw,
}

/// Payload handed to an export requester.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportData {
    Buffers(Vec<Vec<f32>>),
    Artifact(EncodedArtifact),
}

impl ExportData {
    pub fn into_buffers(self) -> Option<Vec<Vec<f32>>> {
        match self {
            Self::Buffers(buffers) => Some(buffers),
            Self::Artifact(_) => None,
        }
    }

    pub fn into_artifact(self) -> Option<EncodedArtifact> {
        match self {
            Self::Artifact(artifact) => Some(artifact),
            Self::Buffers(_) => None,
        }
    }
}

pub type ExportResult = Result<ExportData, RecorderError>;

/// One-shot fulfillment target for a buffer snapshot request.
///
/// Invoked on the recorder's reply thread. Keep work short or hand it off.
pub type BufferCallback = Box<dyn FnOnce(Result<Vec<Vec<f32>>, RecorderError>) + Send + 'static>;

/// One-shot fulfillment target for a WAV export request.
pub type ArtifactCallback = Box<dyn FnOnce(Result<EncodedArtifact, RecorderError>) + Send + 'static>;

/// Fallback fulfillment target used when a request supplies no callback.
/// Receives both buffer snapshots and WAV artifacts.
pub type DefaultExportCallback = Arc<dyn Fn(ExportResult) + Send + Sync + 'static>;
