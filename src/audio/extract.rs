//! Audio preparation — pass-through detection and ffmpeg extraction.
//!
//! # Overview
//!
//! [`prepare_audio`] is the first stage of every job.  WAV sources are used
//! as-is ([`PreparedAudio::Passthrough`]); everything else is handed to an
//! [`AudioExtractor`], which produces a temporary 16 kHz mono 16-bit PCM WAV
//! file.
//!
//! [`FfmpegExtractor`] is the production implementation: it shells out to the
//! `ffmpeg` binary.  The temporary file is owned by the returned
//! [`PreparedAudio`] and is removed when it is dropped, so cleanup happens on
//! every exit path of a job without the orchestrator having to remember.
//!
//! [`MockExtractor`] (under `#[cfg(test)]`) lets pipeline tests run without
//! ffmpeg installed.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempPath;
use thiserror::Error;

use super::formats;

// ---------------------------------------------------------------------------
// ExtractError
// ---------------------------------------------------------------------------

/// All errors that can arise while preparing the audio input.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The source file does not exist on disk.
    #[error("Source file not found: {0}")]
    SourceMissing(String),

    /// The ffmpeg binary could not be started.
    #[error("FFmpeg not found ({0}) — install it and make sure it is on PATH")]
    ToolMissing(String),

    /// ffmpeg exited with a non-zero status; the message embeds its stderr.
    #[error("Audio conversion failed: {0}")]
    ToolFailed(String),

    /// ffmpeg did not finish within the configured timeout.
    #[error("Audio conversion timed out after {0} s")]
    Timeout(u64),

    /// Temp-file creation or another I/O operation failed.
    #[error("I/O error during audio preparation: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// PreparedAudio
// ---------------------------------------------------------------------------

/// The outcome of the audio-preparation stage: a WAV path the inference
/// stage can read.
///
/// The `Temporary` variant owns the file via [`tempfile::TempPath`]; dropping
/// it deletes the file (deletion errors are swallowed by `TempPath`).  The
/// `Passthrough` variant borrows nothing and deletes nothing.
#[derive(Debug)]
pub enum PreparedAudio {
    /// The source file itself is directly consumable.
    Passthrough(PathBuf),
    /// A temporary WAV produced by the extractor; removed on drop.
    Temporary(TempPath),
}

impl PreparedAudio {
    /// The WAV path to feed into the inference stage.
    pub fn path(&self) -> &Path {
        match self {
            PreparedAudio::Passthrough(p) => p,
            PreparedAudio::Temporary(t) => t,
        }
    }

    /// `true` when a temporary file backs this audio.
    pub fn is_temporary(&self) -> bool {
        matches!(self, PreparedAudio::Temporary(_))
    }
}

// ---------------------------------------------------------------------------
// AudioExtractor trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for the external audio-extraction
/// capability.
///
/// Implementations must be `Send + Sync` so they can be held behind an
/// `Arc<dyn AudioExtractor>` and called from the worker context.
pub trait AudioExtractor: Send + Sync {
    /// Convert `source` into a temporary 16 kHz mono 16-bit PCM WAV file.
    fn extract(&self, source: &Path) -> Result<PreparedAudio, ExtractError>;
}

// ---------------------------------------------------------------------------
// prepare_audio
// ---------------------------------------------------------------------------

/// First stage of a job: decide between pass-through and extraction.
///
/// # Errors
///
/// - [`ExtractError::SourceMissing`] — `source` does not exist; the
///   extractor is never invoked in this case.
/// - Any error from [`AudioExtractor::extract`] for non-WAV sources.
pub fn prepare_audio(
    source: &Path,
    extractor: &dyn AudioExtractor,
) -> Result<PreparedAudio, ExtractError> {
    if !source.exists() {
        return Err(ExtractError::SourceMissing(source.display().to_string()));
    }

    if formats::is_passthrough(source) {
        log::debug!("audio: {} used as-is (pass-through)", source.display());
        return Ok(PreparedAudio::Passthrough(source.to_path_buf()));
    }

    extractor.extract(source)
}

// ---------------------------------------------------------------------------
// FfmpegExtractor
// ---------------------------------------------------------------------------

/// Production extractor that invokes the `ffmpeg` binary.
///
/// The invocation mirrors what Whisper expects:
///
/// ```text
/// ffmpeg -hide_banner -loglevel error -i <source>
///        -vn -acodec pcm_s16le -ar 16000 -ac 1 -y <temp.wav>
/// ```
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    ffmpeg: PathBuf,
    timeout: Duration,
}

impl FfmpegExtractor {
    /// Build from the extraction section of the app config.
    pub fn from_config(config: &crate::config::ExtractionConfig) -> Self {
        Self {
            ffmpeg: config
                .ffmpeg_path
                .as_deref()
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("ffmpeg")),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Construct with an explicit binary path and timeout (useful in tests).
    pub fn new(ffmpeg: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            timeout,
        }
    }
}

impl AudioExtractor for FfmpegExtractor {
    fn extract(&self, source: &Path) -> Result<PreparedAudio, ExtractError> {
        let temp = tempfile::Builder::new()
            .prefix("voice-extractor-")
            .suffix(".wav")
            .tempfile()?
            .into_temp_path();

        log::info!(
            "audio: extracting {} -> {}",
            source.display(),
            temp.display()
        );

        let mut child = Command::new(&self.ffmpeg)
            .arg("-hide_banner")
            .args(["-loglevel", "error"])
            .arg("-i")
            .arg(source)
            .args(["-vn", "-acodec", "pcm_s16le", "-ar", "16000", "-ac", "1", "-y"])
            .arg(temp.as_os_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    ExtractError::ToolMissing(self.ffmpeg.display().to_string())
                }
                _ => ExtractError::Io(e),
            })?;

        // Poll rather than block so the large-but-finite timeout can fire.
        let deadline = Instant::now() + self.timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ExtractError::Timeout(self.timeout.as_secs()));
                }
                None => std::thread::sleep(Duration::from_millis(50)),
            }
        };

        if !status.success() {
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            let diag = stderr.trim();
            let msg = if diag.is_empty() {
                format!("ffmpeg exited with {status}")
            } else {
                format!("ffmpeg exited with {status}: {diag}")
            };
            return Err(ExtractError::ToolFailed(msg));
        }

        Ok(PreparedAudio::Temporary(temp))
    }
}

// ---------------------------------------------------------------------------
// MockExtractor  (test-only)
// ---------------------------------------------------------------------------

/// Test double that writes a silent WAV instead of invoking ffmpeg, or fails
/// with a configured error.  Records whether it was invoked at all so tests
/// can assert the pass-through property.
#[cfg(test)]
pub struct MockExtractor {
    fail_with: Option<String>,
    pub calls: std::sync::atomic::AtomicUsize,
    pub last_temp: std::sync::Mutex<Option<PathBuf>>,
}

#[cfg(test)]
impl MockExtractor {
    /// An extractor that succeeds, producing 1 s of 16 kHz silence.
    pub fn ok() -> Self {
        Self {
            fail_with: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
            last_temp: std::sync::Mutex::new(None),
        }
    }

    /// An extractor that always fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            fail_with: Some(message.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
            last_temp: std::sync::Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl AudioExtractor for MockExtractor {
    fn extract(&self, _source: &Path) -> Result<PreparedAudio, ExtractError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(msg) = &self.fail_with {
            return Err(ExtractError::ToolFailed(msg.clone()));
        }

        let temp = tempfile::Builder::new()
            .prefix("voice-extractor-test-")
            .suffix(".wav")
            .tempfile()?
            .into_temp_path();
        crate::audio::wav::write_silence_wav(&temp, 16_000).map_err(ExtractError::Io)?;
        *self.last_temp.lock().unwrap() = Some(temp.to_path_buf());
        Ok(PreparedAudio::Temporary(temp))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
