use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::RecorderError;
use super::export::DefaultExportCallback;

/// Upper bound on channels a single recorder handles.
pub const MAX_CHANNELS: u16 = 32;

/// Highest capture sample rate accepted, in Hz.
pub const MAX_SAMPLE_RATE: u32 = 768_000;

/// Sample encoding used for raw exports.
///
/// WAV exports are always 16-bit PCM regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Little-endian signed 16-bit integers.
    #[default]
    S16,
    /// Native-endian 64-bit floats.
    F64,
}

impl OutputFormat {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            Self::S16 => 2,
            Self::F64 => 8,
        }
    }
}

/// Configuration for a recorder.
///
/// Deserializes from the camelCase option names (`bufferLen`, `numChannels`,
/// `mimeType`, `outputFormat`); missing keys fall back to the defaults.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecorderConfig {
    /// Samples per channel per capture period (default: 4096).
    pub buffer_len: usize,

    /// Number of recorded channels (default: 2).
    pub num_channels: u16,

    /// MIME type attached to WAV exports (default: `audio/wav`).
    pub mime_type: String,

    /// Codec for raw exports (default: s16).
    pub output_format: OutputFormat,

    /// Used by `request_buffer`/`request_wav` when the call passes no callback.
    #[serde(skip)]
    pub callback: Option<DefaultExportCallback>,
}

impl RecorderConfig {
    /// Parse a (possibly partial) JSON options object over the defaults.
    pub fn from_json(json: &str) -> Result<Self, RecorderError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RecorderError::ConfigurationFailed(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, RecorderError> {
        serde_json::to_string_pretty(self).map_err(|e| RecorderError::SerializationFailed(e.to_string()))
    }

    pub fn with_callback(mut self, callback: DefaultExportCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.buffer_len == 0 {
            return Err(RecorderError::ConfigurationFailed("buffer length must be positive".into()));
        }
        if self.num_channels == 0 || self.num_channels > MAX_CHANNELS {
            return Err(RecorderError::ConfigurationFailed(format!(
                "unsupported channel count: {}",
                self.num_channels
            )));
        }
        if self.mime_type.trim().is_empty() {
            return Err(RecorderError::ConfigurationFailed("mime type must not be empty".into()));
        }
        Ok(())
    }

    /// Check a capture source's rate. At [`MAX_SAMPLE_RATE`] the WAV byte
    /// rate still fits in 32 bits for [`MAX_CHANNELS`].
    pub fn validate_sample_rate(&self, sample_rate: u32) -> Result<(), RecorderError> {
        if sample_rate == 0 || sample_rate > MAX_SAMPLE_RATE {
            return Err(RecorderError::ConfigurationFailed(format!(
                "unsupported sample rate: {} Hz (1..={} Hz)",
                sample_rate, MAX_SAMPLE_RATE
            )));
        }
        Ok(())
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            buffer_len: 4096,
            num_channels: 2,
            mime_type: "audio/wav".into(),
            output_format: OutputFormat::S16,
            callback: None,
        }
    }
}

impl fmt::Debug for RecorderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecorderConfig")
            .field("buffer_len", &self.buffer_len)
            .field("num_channels", &self.num_channels)
            .field("mime_type", &self.mime_type)
            .field("output_format", &self.output_format)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}
