use std::sync::Arc;

use crate::models::error::RecorderError;

/// Callback invoked once per capture period.
///
/// Receives exactly one chunk per channel, all of equal length. Ownership of
/// the chunks moves to the recorder.
pub type ChunkCallback = Arc<dyn Fn(Vec<Vec<f32>>) + Send + Sync + 'static>;

/// A live audio input that delivers fixed-size sample chunks.
///
/// The recorder starts the source once, at construction, and stops it when
/// dropped. Periods delivered while the recorder is idle are discarded.
pub trait CaptureSource: Send + Sync {
    /// Sample rate of the delivered audio, in Hz.
    fn sample_rate(&self) -> u32;

    /// Start delivering periods to `callback`.
    ///
    /// The callback runs on the audio thread and returns without blocking on
    /// any encode work.
    fn start(&mut self, callback: ChunkCallback) -> Result<(), RecorderError>;

    /// Stop delivering periods and release the callback.
    fn stop(&mut self) -> Result<(), RecorderError>;
}
