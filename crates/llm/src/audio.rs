//! PCM Audio Frames
//!
//! Live sessions stream base64-encoded, little-endian 16-bit mono PCM. Frames
//! are decoded into normalized `f32` samples ready for a playback queue.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::types::{LlmError, LlmResult};

/// Sample rate of the audio the briefing model streams back.
pub const BRIEFING_SAMPLE_RATE: u32 = 24_000;

/// One decoded chunk of mono audio.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pub sample_rate: u32,
    /// Samples in -1.0..1.0
    pub samples: Vec<f32>,
}

impl AudioFrame {
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }

    /// Re-encode as little-endian 16-bit PCM.
    pub fn to_pcm16_le(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * 2);
        for sample in &self.samples {
            let value = (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
            out.extend_from_slice(&value.to_le_bytes());
        }
        out
    }
}

/// Convert little-endian 16-bit PCM into normalized samples.
///
/// A trailing odd byte cannot form a sample and is dropped.
pub fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

/// Decode one base64 PCM payload.
pub fn decode_pcm16_base64(data: &str, sample_rate: u32) -> LlmResult<AudioFrame> {
    let bytes = STANDARD.decode(data.trim()).map_err(|e| LlmError::ParseError {
        message: format!("invalid base64 audio frame: {}", e),
    })?;
    Ok(AudioFrame {
        sample_rate,
        samples: pcm16_to_f32(&bytes),
    })
}

/// Extract the `rate=` parameter from a MIME type like `audio/pcm;rate=24000`.
pub fn sample_rate_from_mime(mime_type: &str) -> Option<u32> {
    mime_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.trim().parse().ok())
}
