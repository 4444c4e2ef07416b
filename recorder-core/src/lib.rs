//! # recorder-core
//!
//! Audio recording core: accumulates captured sample periods per channel and
//! encodes them on demand as channel buffers, 16-bit WAV files, or headerless
//! PCM streams.
//!
//! Capture backends implement [`CaptureSource`] and plug into the generic
//! [`Recorder`], which forwards periods to a worker thread so the audio
//! callback never does encode work.
//!
//! ## Architecture
//!
//! ```text
//! recorder-core (this crate)
//! ├── traits/       ← CaptureSource, RecorderDelegate
//! ├── models/       ← RecorderError, RecorderState, RecorderConfig, EncodedArtifact, exports
//! ├── processing/   ← Accumulator, PCM/WAV codec, WAV header generation
//! ├── session/      ← Recorder (controller), worker thread, Notification
//! └── capture/      ← ManualSource (push-driven source)
//! ```

pub mod capture;
pub mod models;
pub mod processing;
pub mod session;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use capture::manual_source::ManualSource;
pub use models::artifact::{ArtifactKind, ArtifactMetadata, EncodedArtifact, RAW_MIME_TYPE};
pub use models::config::{OutputFormat, RecorderConfig};
pub use models::error::RecorderError;
pub use models::export::{ArtifactCallback, BufferCallback, DefaultExportCallback, ExportData, ExportKind, ExportResult};
pub use models::state::RecorderState;
pub use processing::accumulator::Accumulator;
pub use session::notification::Notification;
pub use session::recorder::{ArtifactNotification, Recorder};
pub use session::worker::{Command, Reply};
pub use traits::capture_source::{CaptureSource, ChunkCallback};
pub use traits::recorder_delegate::RecorderDelegate;
