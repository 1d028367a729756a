//! Outbound audio encoding for the streaming session
//!
//! Microphone frames are resampled to the wire rate, clamped to 16-bit
//! signed samples, and base64-encoded into append events. The encode step
//! is pure and deterministic for a given input buffer.

use base64::Engine as _;

use crate::{Error, Result};

/// Sample rate the realtime agent expects
pub const WIRE_SAMPLE_RATE: u32 = 24000;

/// Encode f32 samples as base64 little-endian PCM16
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_pcm16_base64(samples: &[f32]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        // Clamp to [-1.0, 1.0] before scaling
        let clamped = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        bytes.extend_from_slice(&clamped.to_le_bytes());
    }
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Resample audio between rates; pass-through when they already match
///
/// # Errors
///
/// Returns error if the resampler cannot be constructed or fails mid-stream
#[allow(clippy::cast_possible_truncation)]
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate {
        return Ok(samples.to_vec());
    }

    use rubato::{FftFixedIn, Resampler};

    let chunk_size = 1024;
    let sub_chunks = 2;

    let mut resampler =
        FftFixedIn::<f64>::new(from_rate as usize, to_rate as usize, chunk_size, sub_chunks, 1)
            .map_err(|e| Error::Audio(format!("resampler init failed: {e}")))?;

    let input: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
    let mut output = Vec::new();

    for chunk in input.chunks(chunk_size) {
        if chunk.len() == chunk_size {
            let result = resampler
                .process(&[chunk.to_vec()], None)
                .map_err(|e| Error::Audio(format!("resample failed: {e}")))?;
            output.extend_from_slice(&result[0]);
        }
    }

    Ok(output.iter().map(|&s| s as f32).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_known_ramp() {
        // 0.0 -> 0x0000, ~0.5 -> 0x3FFF (16383), -1.0 -> 0x8001 (-32767)
        let encoded = encode_pcm16_base64(&[0.0, 0.5, -1.0]);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .unwrap();
        assert_eq!(bytes.len(), 6);
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 0);
        assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), 16383);
        assert_eq!(i16::from_le_bytes([bytes[4], bytes[5]]), -32767);
    }

    #[test]
    fn encode_clamps_out_of_range() {
        let encoded = encode_pcm16_base64(&[2.0, -2.0]);
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .unwrap();
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 32767);
        assert_eq!(i16::from_le_bytes([bytes[2], bytes[3]]), -32768);
    }

    #[test]
    fn encode_is_deterministic() {
        let samples: Vec<f32> = (0..480).map(|i| (i as f32 / 480.0).sin()).collect();
        assert_eq!(encode_pcm16_base64(&samples), encode_pcm16_base64(&samples));
    }

    #[test]
    fn resample_passthrough_at_same_rate() {
        let samples = vec![0.1f32, 0.2, 0.3];
        let out = resample(&samples, 16000, 16000).unwrap();
        assert_eq!(out, samples);
    }

    #[test]
    fn resample_changes_length_by_ratio() {
        let samples = vec![0.0f32; 4096];
        let out = resample(&samples, 16000, 24000).unwrap();
        // 3/2 ratio, minus partial-chunk tail loss
        assert!(out.len() > samples.len());
    }
}
