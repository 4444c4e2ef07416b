//! Pure sample codec: chunk merging, channel interleaving, PCM and WAV encoding.
//!
//! Nothing here allocates more than its output or touches shared state, so
//! every function is safe to call from the worker thread while capture
//! continues.

use crate::models::config::OutputFormat;
use crate::models::error::RecorderError;
use crate::processing::wav_format::{self, WAV_BIT_DEPTH, WAV_HEADER_SIZE};

/// Scale applied to non-negative samples when quantizing to 16 bits.
const PCM16_POSITIVE_SCALE: f64 = 32767.0;
/// Scale applied to negative samples when quantizing to 16 bits.
const PCM16_NEGATIVE_SCALE: f64 = 32768.0;

/// Concatenate a channel's chunks, in arrival order, into one buffer of
/// exactly `total_length` samples.
///
/// A chunk total that disagrees with `total_length` means the capture side
/// broke its contract; the merge is refused rather than truncated or padded.
pub fn merge_buffers(chunks: &[Vec<f32>], total_length: usize) -> Result<Vec<f32>, RecorderError> {
    let actual: usize = chunks.iter().map(Vec::len).sum();
    if actual != total_length {
        return Err(RecorderError::LengthMismatch {
            expected: total_length,
            actual,
        });
    }

    let mut merged = Vec::with_capacity(total_length);
    for chunk in chunks {
        merged.extend_from_slice(chunk);
    }
    Ok(merged)
}

/// Interleave per-channel buffers into one stream.
///
/// Two channels produce `[L0, R0, L1, R1, ...]`. Any other channel count
/// passes the first channel through unchanged; an empty slice yields an
/// empty stream.
pub fn interleave(channels: &[Vec<f32>]) -> Result<Vec<f32>, RecorderError> {
    match channels {
        [left, right] => {
            if left.len() != right.len() {
                return Err(RecorderError::ChannelLengthMismatch {
                    left: left.len(),
                    right: right.len(),
                });
            }
            let mut stereo = Vec::with_capacity(left.len() * 2);
            for (&l, &r) in left.iter().zip(right) {
                stereo.push(l);
                stereo.push(r);
            }
            Ok(stereo)
        }
        [first, ..] => Ok(first.clone()),
        [] => Ok(Vec::new()),
    }
}

/// Quantize one sample to a signed 16-bit value.
///
/// Clamps to `[-1.0, 1.0]`, scales negatives by 32768 and the rest by 32767,
/// then truncates toward zero. NaN maps to 0.
pub fn quantize_pcm16(sample: f32) -> i16 {
    let s = (sample as f64).clamp(-1.0, 1.0);
    let scaled = if s < 0.0 {
        s * PCM16_NEGATIVE_SCALE
    } else {
        s * PCM16_POSITIVE_SCALE
    };
    scaled as i16
}

/// Encode samples as little-endian 16-bit PCM, 2 bytes per sample.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    write_pcm16(&mut data, samples);
    data
}

/// Inverse of [`encode_pcm16`]; a trailing odd byte is ignored.
pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| {
            let value = i16::from_le_bytes([pair[0], pair[1]]) as f64;
            let scale = if value < 0.0 {
                PCM16_NEGATIVE_SCALE
            } else {
                PCM16_POSITIVE_SCALE
            };
            (value / scale) as f32
        })
        .collect()
}

/// Widen samples to 64-bit floats in native byte order, 8 bytes per sample.
pub fn encode_pcm64_float(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 8);
    for &sample in samples {
        data.extend_from_slice(&(sample as f64).to_ne_bytes());
    }
    data
}

/// Encode a headerless stream in the given raw output format.
pub fn encode_raw(samples: &[f32], format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::S16 => encode_pcm16(samples),
        OutputFormat::F64 => encode_pcm64_float(samples),
    }
}

/// Build a complete WAV file: 44-byte header followed by 16-bit PCM.
///
/// `samples` must already be interleaved for `num_channels`.
pub fn encode_wav(samples: &[f32], sample_rate: u32, num_channels: u16) -> Result<Vec<u8>, RecorderError> {
    let data_size = samples
        .len()
        .checked_mul(2)
        .and_then(|len| u32::try_from(len).ok())
        .ok_or_else(|| RecorderError::InvalidWav(format!("{} samples do not fit a wav data chunk", samples.len())))?;

    let header = wav_format::generate_wav_header(sample_rate, WAV_BIT_DEPTH, num_channels, data_size)?;

    let mut data = Vec::with_capacity(WAV_HEADER_SIZE + data_size as usize);
    data.extend_from_slice(&header);
    write_pcm16(&mut data, samples);
    Ok(data)
}

fn write_pcm16(out: &mut Vec<u8>, samples: &[f32]) {
    for &sample in samples {
        out.extend_from_slice(&quantize_pcm16(sample).to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::abs_diff_eq;

    #[test]
    fn merge_preserves_chunk_order() {
        let chunks = vec![vec![1.0, 2.0], vec![3.0], vec![4.0, 5.0]];
        let merged = merge_buffers(&chunks, 5).unwrap();
        assert_eq!(merged, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn merge_empty() {
        assert!(merge_buffers(&[], 0).unwrap().is_empty());
    }

    #[test]
    fn merge_rejects_length_mismatch() {
        let chunks = vec![vec![1.0, 2.0], vec![3.0]];
        let err = merge_buffers(&chunks, 4).unwrap_err();
        assert_eq!(err, RecorderError::LengthMismatch { expected: 4, actual: 3 });
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn interleave_stereo() {
        let channels = vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]];
        let result = interleave(&channels).unwrap();
        assert_eq!(result, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn interleave_stereo_even_odd_positions() {
        let left: Vec<f32> = (0..64).map(|i| i as f32).collect();
        let right: Vec<f32> = (0..64).map(|i| -(i as f32)).collect();
        let result = interleave(&[left.clone(), right.clone()]).unwrap();

        assert_eq!(result.len(), 128);
        let evens: Vec<f32> = result.iter().step_by(2).copied().collect();
        let odds: Vec<f32> = result.iter().skip(1).step_by(2).copied().collect();
        assert_eq!(evens, left);
        assert_eq!(odds, right);
    }

    #[test]
    fn interleave_rejects_unequal_stereo() {
        let channels = vec![vec![1.0, 2.0], vec![4.0]];
        assert_eq!(
            interleave(&channels).unwrap_err(),
            RecorderError::ChannelLengthMismatch { left: 2, right: 1 }
        );
    }

    #[test]
    fn interleave_mono_and_multichannel_pass_first_channel() {
        let mono = vec![vec![0.1, 0.2]];
        assert_eq!(interleave(&mono).unwrap(), vec![0.1, 0.2]);

        let quad = vec![vec![1.0], vec![2.0], vec![3.0], vec![4.0]];
        assert_eq!(interleave(&quad).unwrap(), vec![1.0]);

        assert!(interleave(&[]).unwrap().is_empty());
    }

    #[test]
    fn pcm16_asymmetric_scale() {
        let pcm = encode_pcm16(&[0.0, 1.0, -1.0, 0.5, -0.5]);
        assert_eq!(pcm.len(), 10);

        let values: Vec<i16> = pcm.chunks_exact(2).map(|p| i16::from_le_bytes([p[0], p[1]])).collect();
        assert_eq!(values, vec![0, 32767, -32768, 16383, -16384]);
    }

    #[test]
    fn pcm16_clamps_out_of_range_and_nan() {
        assert_eq!(quantize_pcm16(2.0), i16::MAX);
        assert_eq!(quantize_pcm16(-3.0), i16::MIN);
        assert_eq!(quantize_pcm16(f32::NAN), 0);
        assert_eq!(quantize_pcm16(f32::INFINITY), i16::MAX);
    }

    #[test]
    fn pcm16_truncates_toward_zero() {
        // 0.25 * 32767 = 8191.75, -0.25 * 32768 = -8192 exactly
        assert_eq!(quantize_pcm16(0.25), 8191);
        assert_eq!(quantize_pcm16(-0.25), -8192);
        // -0.1 * 32768 = -3276.8
        assert_eq!(quantize_pcm16(-0.1), -3276);
    }

    #[test]
    fn pcm16_is_deterministic() {
        let samples: Vec<f32> = (0..500).map(|i| ((i as f32) * 0.37).sin()).collect();
        assert_eq!(encode_pcm16(&samples), encode_pcm16(&samples));
    }

    #[test]
    fn pcm16_decode_within_one_step() {
        let samples: Vec<f32> = (0..1000).map(|i| ((i as f32) * 0.013).sin() * 0.999).collect();
        let decoded = decode_pcm16(&encode_pcm16(&samples));
        assert_eq!(decoded.len(), samples.len());
        for (original, restored) in samples.iter().zip(&decoded) {
            assert!(
                abs_diff_eq!(*original, *restored, epsilon = 1.0 / 32767.0),
                "{} decoded as {}",
                original,
                restored
            );
        }
    }

    #[test]
    fn pcm64_widens_native_endian() {
        let bytes = encode_pcm64_float(&[0.5, -0.25]);
        assert_eq!(bytes.len(), 16);
        let first = f64::from_ne_bytes(bytes[0..8].try_into().unwrap());
        let second = f64::from_ne_bytes(bytes[8..16].try_into().unwrap());
        assert_eq!(first, 0.5);
        assert_eq!(second, -0.25);
    }

    #[test]
    fn raw_encoding_follows_format() {
        let samples = [0.5f32; 3];
        assert_eq!(encode_raw(&samples, OutputFormat::S16).len(), 6);
        assert_eq!(encode_raw(&samples, OutputFormat::F64).len(), 24);
    }

    #[test]
    fn wav_stereo_header_sizes() {
        // 10 samples per channel, already interleaved
        let samples = vec![0.0f32; 20];
        let wav = encode_wav(&samples, 44100, 2).unwrap();

        assert_eq!(wav.len(), 44 + 40);
        let data_len = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_len, 40);
        let chunk_size = u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]);
        assert_eq!(chunk_size, 76);
        let byte_rate = u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]);
        assert_eq!(byte_rate, 44100 * 2 * 2);
    }

    #[test]
    fn wav_mono_golden_bytes() {
        let mut samples = vec![1.0f32; 4];
        samples.extend([-1.0f32; 4]);
        samples.extend([0.5f32; 4]);

        let wav = encode_wav(&samples, 8000, 1).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(b"RIFF");
        expected.extend_from_slice(&60u32.to_le_bytes());
        expected.extend_from_slice(b"WAVE");
        expected.extend_from_slice(b"fmt ");
        expected.extend_from_slice(&16u32.to_le_bytes());
        expected.extend_from_slice(&1u16.to_le_bytes());
        expected.extend_from_slice(&1u16.to_le_bytes());
        expected.extend_from_slice(&8000u32.to_le_bytes());
        expected.extend_from_slice(&16000u32.to_le_bytes());
        expected.extend_from_slice(&2u16.to_le_bytes());
        expected.extend_from_slice(&16u16.to_le_bytes());
        expected.extend_from_slice(b"data");
        expected.extend_from_slice(&24u32.to_le_bytes());
        for _ in 0..4 {
            expected.extend_from_slice(&[0xFF, 0x7F]);
        }
        for _ in 0..4 {
            expected.extend_from_slice(&[0x00, 0x80]);
        }
        for _ in 0..4 {
            expected.extend_from_slice(&[0xFF, 0x3F]);
        }

        assert_eq!(wav.len(), 68);
        assert_eq!(wav, expected);
    }

    #[test]
    fn wav_rejects_unrepresentable_byte_rate() {
        let err = encode_wav(&[0.25, -0.25], 2_000_000_000, 2).unwrap_err();
        assert!(matches!(err, RecorderError::InvalidWav(_)));
    }
}
