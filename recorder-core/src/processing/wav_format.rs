//! WAV container utilities.
//!
//! Generates the canonical 44-byte RIFF/WAVE PCM header and parses one back.

use crate::models::error::RecorderError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Bit depth of every WAV export.
pub const WAV_BIT_DEPTH: u16 = 16;

/// Fields of a canonical PCM WAV header, in file order.
///
/// ```text
/// 0   "RIFF"  chunk_size (= 36 + data_size)  "WAVE"
/// 12  "fmt "  16  format_code  channels  sample_rate  byte_rate  block_align  bit_depth
/// 36  "data"  data_size
/// ```
/// All integers little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    pub chunk_size: u32,
    pub format_code: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bit_depth: u16,
    pub data_size: u32,
}

impl WavHeader {
    /// Header for `data_size` bytes of integer PCM at `bit_depth` bits.
    ///
    /// Fails with [`RecorderError::InvalidWav`] when a derived field does not
    /// fit its on-disk width.
    pub fn new(sample_rate: u32, bit_depth: u16, channels: u16, data_size: u32) -> Result<Self, RecorderError> {
        if bit_depth == 0 || bit_depth % 8 != 0 {
            return Err(RecorderError::InvalidWav(format!("unsupported bit depth {}", bit_depth)));
        }
        let block_align = channels
            .checked_mul(bit_depth / 8)
            .ok_or_else(|| RecorderError::InvalidWav(format!("block align overflows for {} channels", channels)))?;
        let byte_rate = sample_rate.checked_mul(block_align as u32).ok_or_else(|| {
            RecorderError::InvalidWav(format!("byte rate overflows at {} Hz x {} bytes", sample_rate, block_align))
        })?;
        let chunk_size = data_size
            .checked_add(36)
            .ok_or_else(|| RecorderError::InvalidWav(format!("{} data bytes exceed the riff limit", data_size)))?;

        Ok(Self {
            chunk_size,
            format_code: 1,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bit_depth,
            data_size,
        })
    }

    pub fn to_bytes(&self) -> [u8; WAV_HEADER_SIZE] {
        let mut out = [0u8; WAV_HEADER_SIZE];
        let fields: [&[u8]; 13] = [
            b"RIFF",
            &self.chunk_size.to_le_bytes(),
            b"WAVE",
            b"fmt ",
            &16u32.to_le_bytes(),
            &self.format_code.to_le_bytes(),
            &self.channels.to_le_bytes(),
            &self.sample_rate.to_le_bytes(),
            &self.byte_rate.to_le_bytes(),
            &self.block_align.to_le_bytes(),
            &self.bit_depth.to_le_bytes(),
            b"data",
            &self.data_size.to_le_bytes(),
        ];
        let mut offset = 0;
        for field in fields {
            out[offset..offset + field.len()].copy_from_slice(field);
            offset += field.len();
        }
        out
    }

    /// Total file length the header describes.
    pub fn file_len(&self) -> usize {
        WAV_HEADER_SIZE + self.data_size as usize
    }
}

/// Header bytes for a PCM WAV file carrying `data_size` payload bytes.
pub fn generate_wav_header(
    sample_rate: u32,
    bit_depth: u16,
    channels: u16,
    data_size: u32,
) -> Result<[u8; WAV_HEADER_SIZE], RecorderError> {
    WavHeader::new(sample_rate, bit_depth, channels, data_size).map(|header| header.to_bytes())
}

/// Parse the 44-byte header at the start of `bytes`.
///
/// Only the canonical layout written by [`WavHeader::to_bytes`] is accepted.
pub fn parse_wav_header(bytes: &[u8]) -> Result<WavHeader, RecorderError> {
    if bytes.len() < WAV_HEADER_SIZE {
        return Err(RecorderError::InvalidWav(format!(
            "need {} header bytes, got {}",
            WAV_HEADER_SIZE,
            bytes.len()
        )));
    }
    for (offset, tag) in [(0, b"RIFF"), (8, b"WAVE"), (12, b"fmt "), (36, b"data")] {
        if &bytes[offset..offset + 4] != tag {
            return Err(RecorderError::InvalidWav(format!(
                "missing {:?} tag at offset {}",
                String::from_utf8_lossy(tag),
                offset
            )));
        }
    }
    if read_u32(bytes, 16) != 16 {
        return Err(RecorderError::InvalidWav("unexpected fmt chunk size".into()));
    }

    Ok(WavHeader {
        chunk_size: read_u32(bytes, 4),
        format_code: read_u16(bytes, 20),
        channels: read_u16(bytes, 22),
        sample_rate: read_u32(bytes, 24),
        byte_rate: read_u32(bytes, 28),
        block_align: read_u16(bytes, 32),
        bit_depth: read_u16(bytes, 34),
        data_size: read_u32(bytes, 40),
    })
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_44khz_matches_reference_bytes() {
        // 10 stereo frames: 40 payload bytes
        let expected: [u8; 44] = [
            b'R', b'I', b'F', b'F', 76, 0, 0, 0, b'W', b'A', b'V', b'E', //
            b'f', b'm', b't', b' ', 16, 0, 0, 0, 1, 0, 2, 0, //
            0x44, 0xAC, 0, 0, // 44100
            0x10, 0xB1, 0x02, 0, // 176400
            4, 0, 16, 0, //
            b'd', b'a', b't', b'a', 40, 0, 0, 0,
        ];
        assert_eq!(generate_wav_header(44100, 16, 2, 40).unwrap(), expected);
    }

    #[test]
    fn mono_derived_fields() {
        let header = WavHeader::new(8000, 16, 1, 24).unwrap();
        assert_eq!(header.chunk_size, 60);
        assert_eq!(header.byte_rate, 16000);
        assert_eq!(header.block_align, 2);
        assert_eq!(header.file_len(), 68);
    }

    #[test]
    fn parse_inverts_to_bytes() {
        let header = WavHeader::new(48000, 16, 2, 1920).unwrap();
        assert_eq!(parse_wav_header(&header.to_bytes()).unwrap(), header);
    }

    #[test]
    fn parse_ignores_trailing_payload() {
        let mut file = generate_wav_header(8000, 16, 1, 4).unwrap().to_vec();
        file.extend_from_slice(&[1, 2, 3, 4]);
        assert_eq!(parse_wav_header(&file).unwrap().data_size, 4);
    }

    #[test]
    fn parse_rejects_short_input() {
        let err = parse_wav_header(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, RecorderError::InvalidWav(_)));
    }

    #[test]
    fn parse_rejects_wrong_form_type() {
        let mut header = generate_wav_header(8000, 16, 1, 0).unwrap();
        header[8..12].copy_from_slice(b"AVI ");
        assert!(matches!(parse_wav_header(&header), Err(RecorderError::InvalidWav(_))));
    }

    #[test]
    fn parse_rejects_extended_fmt_chunk() {
        let mut header = generate_wav_header(8000, 16, 1, 0).unwrap();
        header[16..20].copy_from_slice(&18u32.to_le_bytes());
        assert!(parse_wav_header(&header).is_err());
    }

    #[test]
    fn byte_rate_overflow_is_rejected() {
        let err = WavHeader::new(2_000_000_000, 16, 2, 0).unwrap_err();
        assert!(matches!(err, RecorderError::InvalidWav(_)));
        // 67 MHz is fine in mono but not across 32 channels.
        assert!(WavHeader::new(67_200_000, 16, 1, 0).is_ok());
        assert!(generate_wav_header(67_200_000, 16, 32, 0).is_err());
    }

    #[test]
    fn chunk_size_overflow_is_rejected() {
        assert!(WavHeader::new(8000, 16, 1, u32::MAX - 35).is_err());
        assert_eq!(WavHeader::new(8000, 16, 1, u32::MAX - 36).unwrap().chunk_size, u32::MAX);
    }

    #[test]
    fn non_byte_bit_depth_is_rejected() {
        assert!(generate_wav_header(8000, 12, 1, 0).is_err());
        assert!(generate_wav_header(8000, 0, 1, 0).is_err());
        assert_eq!(WavHeader::new(8000, 24, 2, 0).unwrap().block_align, 6);
    }
}
