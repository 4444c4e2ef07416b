use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::config::OutputFormat;
use super::error::RecorderError;
use crate::processing::wav_format::WAV_HEADER_SIZE;

/// MIME type attached to every raw export.
pub const RAW_MIME_TYPE: &str = "application/octet-stream";

/// Byte layout of an encoded artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// 44-byte RIFF header followed by 16-bit PCM.
    Wav,
    /// Headerless little-endian 16-bit PCM.
    RawPcm16,
    /// Headerless native-endian 64-bit float.
    RawFloat64,
}

impl ArtifactKind {
    pub fn raw(format: OutputFormat) -> Self {
        match format {
            OutputFormat::S16 => Self::RawPcm16,
            OutputFormat::F64 => Self::RawFloat64,
        }
    }

    pub fn header_len(&self) -> usize {
        match self {
            Self::Wav => WAV_HEADER_SIZE,
            Self::RawPcm16 | Self::RawFloat64 => 0,
        }
    }

    /// Sample encoding of the payload. WAV payloads are always 16-bit.
    pub fn sample_format(&self) -> OutputFormat {
        match self {
            Self::Wav | Self::RawPcm16 => OutputFormat::S16,
            Self::RawFloat64 => OutputFormat::F64,
        }
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.sample_format().bytes_per_sample()
    }
}

/// An immutable encoded byte buffer tagged with a MIME type.
///
/// Cloning shares the underlying bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedArtifact {
    bytes: Arc<[u8]>,
    mime_type: String,
    kind: ArtifactKind,
    sample_rate: u32,
    channels: u16,
}

impl EncodedArtifact {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, kind: ArtifactKind, sample_rate: u32, channels: u16) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
            kind,
            sample_rate,
            channels,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of sample frames carried in the payload.
    ///
    /// Raw exports of more than two channels only carry the first channel.
    pub fn frame_count(&self) -> usize {
        let payload = self.bytes.len().saturating_sub(self.kind.header_len());
        let samples = payload / self.kind.bytes_per_sample();
        match self.channels {
            2 => samples / 2,
            _ => samples,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count() as f64 / self.sample_rate as f64
    }

    /// Lowercase hex SHA-256 digest of the bytes.
    pub fn checksum(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        hex_encode(&digest)
    }

    pub fn metadata(&self) -> ArtifactMetadata {
        ArtifactMetadata {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            mime_type: self.mime_type.clone(),
            kind: self.kind,
            sample_rate: self.sample_rate,
            channels: self.channels,
            frame_count: self.frame_count() as u64,
            duration_secs: self.duration_secs(),
            byte_len: self.bytes.len() as u64,
            checksum: self.checksum(),
        }
    }
}

/// Descriptive record for an exported artifact, serializable to JSON for
/// whatever persists or uploads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    /// Serialized as RFC 3339.
    pub created_at: DateTime<Utc>,
    pub mime_type: String,
    pub kind: ArtifactKind,
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_count: u64,
    pub duration_secs: f64,
    pub byte_len: u64,
    pub checksum: String,
}

impl ArtifactMetadata {
    pub fn to_json(&self) -> Result<String, RecorderError> {
        serde_json::to_string_pretty(self).map_err(|e| RecorderError::SerializationFailed(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, RecorderError> {
        serde_json::from_str(json).map_err(|e| RecorderError::SerializationFailed(e.to_string()))
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
