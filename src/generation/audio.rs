// SYNOID Narration Audio
// Copyright (c) 2026 Xing_The_Creator | SYNOID
//
// Decoded speech: interleaved 16-bit PCM plus its format. The duration of
// this buffer is the montage target.

use crate::config::{NARRATION_CHANNELS, NARRATION_SAMPLE_RATE};
use crate::generation::GenerationError;
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct NarrationAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl NarrationAudio {
    /// Decode little-endian 16-bit PCM. A trailing odd byte is dropped.
    pub fn from_pcm16_le(bytes: &[u8], sample_rate: u32, channels: u16) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Decode the base64 payload returned by the speech endpoint.
    pub fn from_base64_pcm(data: &str) -> Result<Self, GenerationError> {
        let bytes = STANDARD
            .decode(data.trim())
            .map_err(|e| GenerationError::Decode(e.to_string()))?;
        if bytes.len() < 2 {
            return Err(GenerationError::Decode(
                "The speech payload contained no samples.".to_string(),
            ));
        }
        Ok(Self::from_pcm16_le(&bytes, NARRATION_SAMPLE_RATE, NARRATION_CHANNELS))
    }

    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }

    pub fn write_wav(&self, path: &Path) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec)
            .with_context(|| format!("Failed to create {:?}", path))?;
        for sample in &self.samples {
            writer.write_sample(*sample)?;
        }
        writer.finalize().context("Failed to finalize WAV file")?;
        Ok(())
    }

    pub fn read_wav(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("Failed to open {:?}", path))?;
        let spec = reader.spec();
        if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
            anyhow::bail!(
                "Unsupported WAV format in {:?}: expected 16-bit PCM, got {}-bit {:?}",
                path,
                spec.bits_per_sample,
                spec.sample_format
            );
        }
        let samples = reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read WAV samples")?;
        Ok(Self {
            samples,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_decoding_and_duration() {
        // 48_000 bytes = 24_000 mono samples = 1 second
        let bytes = vec![0u8; 48_000];
        let audio = NarrationAudio::from_pcm16_le(&bytes, 24_000, 1);
        assert_eq!(audio.frames(), 24_000);
        assert_eq!(audio.duration_secs(), 1.0);

        let audio = NarrationAudio::from_pcm16_le(&[0x01, 0x80, 0xff], 24_000, 1);
        assert_eq!(audio.samples, vec![i16::MIN + 1]);
    }

    #[test]
    fn test_base64_payload() {
        let encoded = STANDARD.encode([0x10u8, 0x00, 0xf0, 0xff]);
        let audio = NarrationAudio::from_base64_pcm(&encoded).unwrap();
        assert_eq!(audio.samples, vec![16, -16]);
        assert_eq!(audio.sample_rate, NARRATION_SAMPLE_RATE);

        assert!(matches!(
            NarrationAudio::from_base64_pcm("not base64!"),
            Err(GenerationError::Decode(_))
        ));
        assert!(NarrationAudio::from_base64_pcm("").is_err());
    }

    #[test]
    fn test_wav_write_then_read() {
        let path = std::env::temp_dir().join(format!("synoid_narration_{}.wav", uuid::Uuid::new_v4()));
        let audio = NarrationAudio {
            samples: (0..12_000).map(|i| (i % 100) as i16).collect(),
            sample_rate: 24_000,
            channels: 1,
        };
        audio.write_wav(&path).unwrap();
        let loaded = NarrationAudio::read_wav(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded, audio);
        assert_eq!(loaded.duration_secs(), 0.5);
    }
}
