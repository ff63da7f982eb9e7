//! Audio preparation — the first stage of every transcription job.
//!
//! # Pipeline
//!
//! ```text
//! source path ──▶ prepare_audio
//!                   ├─ .wav            → PreparedAudio::Passthrough
//!                   └─ anything else   → AudioExtractor (ffmpeg subprocess)
//!                                        → PreparedAudio::Temporary
//!                 ──▶ load_wav_mono_16k → Vec<f32> for the STT engine
//! ```
//!
//! Temporary WAV files are owned by [`PreparedAudio`] and deleted when it is
//! dropped, success and failure alike.

pub mod extract;
pub mod formats;
pub mod wav;

pub use extract::{prepare_audio, AudioExtractor, ExtractError, FfmpegExtractor, PreparedAudio};
pub use formats::{
    is_passthrough, is_supported, AUDIO_EXTENSIONS, PASSTHROUGH_EXTENSIONS, VIDEO_EXTENSIONS,
};
pub use wav::{load_wav_mono_16k, DecodeError, TARGET_SAMPLE_RATE};

// test-only re-export so pipeline tests can build extraction doubles without
// spelling the full module path.
#[cfg(test)]
pub use extract::MockExtractor;
