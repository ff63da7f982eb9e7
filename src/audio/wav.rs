//! WAV decoding for the pass-through path, backed by the `hound` crate.
//!
//! Extracted audio is always 16 kHz mono 16-bit PCM, but a pass-through WAV
//! can be anything the user had lying around — 44.1 kHz stereo float is
//! common.  [`load_wav_mono_16k`] normalises every case to the 16 kHz mono
//! f32 samples Whisper requires: integer samples are scaled to ±1.0,
//! channels are averaged down to mono, and the rate is converted with linear
//! interpolation (plenty for speech).

use std::path::Path;

use thiserror::Error;

/// Sample rate required by the inference stage.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

// ---------------------------------------------------------------------------
// DecodeError
// ---------------------------------------------------------------------------

/// Errors raised while decoding a WAV file.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file could not be opened or parsed as WAV.
    #[error("Cannot read WAV file: {0}")]
    Wav(#[from] hound::Error),

    /// The WAV uses a sample layout this decoder does not handle.
    #[error("Unsupported WAV sample format: {0}")]
    UnsupportedFormat(String),
}

// ---------------------------------------------------------------------------
// load_wav_mono_16k
// ---------------------------------------------------------------------------

/// Decode `path` into 16 kHz mono f32 samples.
///
/// Handles 16/24/32-bit integer PCM and 32-bit float WAV, any channel count,
/// any sample rate.
pub fn load_wav_mono_16k(path: &Path) -> Result<Vec<f32>, DecodeError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => {
            reader.samples::<f32>().collect::<Result<_, _>>()?
        }
        (hound::SampleFormat::Int, bits @ 1..=32) => {
            let scale = (1_i64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()?
        }
        (format, bits) => {
            return Err(DecodeError::UnsupportedFormat(format!(
                "{format:?} at {bits} bits per sample"
            )))
        }
    };

    let mono = downmix_to_mono(&samples, spec.channels);
    Ok(resample_to_16k(&mono, spec.sample_rate))
}

// ---------------------------------------------------------------------------
// downmix_to_mono
// ---------------------------------------------------------------------------

/// Average interleaved multi-channel audio down to one channel.
///
/// Mono input is returned as an owned copy; zero channels yields an empty
/// vector.
fn downmix_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// resample_to_16k
// ---------------------------------------------------------------------------

/// Linear-interpolation resample from `source_rate` Hz to 16 kHz.
///
/// Input already at 16 kHz is copied unchanged.
fn resample_to_16k(samples: &[f32], source_rate: u32) -> Vec<f32> {
    if source_rate == TARGET_SAMPLE_RATE {
        return samples.to_vec();
    }
    if samples.is_empty() {
        return Vec::new();
    }

    let ratio = TARGET_SAMPLE_RATE as f64 / source_rate as f64;
    let output_len = (samples.len() as f64 * ratio).ceil() as usize;
    let mut output = Vec::with_capacity(output_len);

    for i in 0..output_len {
        let src_pos = i as f64 / ratio;
        let idx = src_pos as usize;
        let frac = (src_pos - idx as f64) as f32;

        let sample = if idx + 1 < samples.len() {
            samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
        } else if idx < samples.len() {
            samples[idx]
        } else {
            0.0
        };

        output.push(sample);
    }

    output
}

// ---------------------------------------------------------------------------
// Test fixtures
// ---------------------------------------------------------------------------

/// Write one second of 16-bit mono silence at the given rate.
#[cfg(test)]
pub fn write_silence_wav(path: &Path, sample_rate: u32) -> std::io::Result<()> {
    write_wav_i16(path, &vec![0_i16; sample_rate as usize], sample_rate, 1)
}

/// Write arbitrary interleaved 16-bit samples (test helper).
#[cfg(test)]
pub fn write_wav_i16(
    path: &Path,
    samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> std::io::Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    for &s in samples {
        writer
            .write_sample(s)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    }
    writer
        .finalize()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
