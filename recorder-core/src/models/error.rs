use thiserror::Error;

/// Errors raised by the recorder, its worker, and the codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("callback not set")]
    CallbackNotSet,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("buffered chunks hold {actual} samples, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("channel lengths differ: left has {left} samples, right has {right}")]
    ChannelLengthMismatch { left: usize, right: usize },

    #[error("expected {expected} channel chunks, got {actual}")]
    ChannelCountMismatch { expected: usize, actual: usize },

    #[error("worker has not been initialized")]
    NotInitialized,

    #[error("invalid wav data: {0}")]
    InvalidWav(String),

    #[error("worker thread is no longer running")]
    WorkerUnavailable,

    #[error("serialization failed: {0}")]
    SerializationFailed(String),
}

impl RecorderError {
    /// Whether this error means the capture side broke its chunk contract.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            Self::LengthMismatch { .. } | Self::ChannelLengthMismatch { .. } | Self::ChannelCountMismatch { .. }
        )
    }
}
