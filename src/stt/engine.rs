//! Core STT engine trait and implementations.
//!
//! # Overview
//!
//! [`SttEngine`] is the interface the job orchestrator talks to.  It is
//! object-safe and `Send + Sync` so it can be held behind an
//! `Arc<dyn SttEngine>`.
//!
//! [`WhisperEngine`] is the production implementation wrapping a
//! `whisper_rs::WhisperContext`.  Construct it with [`WhisperEngine::load`].
//!
//! [`MockSttEngine`] (available under `#[cfg(test)]`) is a zero-dependency
//! stub that returns a pre-configured response — useful for unit-testing the
//! pipeline without a real GGML model file.

use std::path::Path;

use thiserror::Error;
use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters};

use crate::stt::transcribe::{SamplingStrategy, Segment, TranscribeParams, TranscriptionResult};

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// All errors that can arise from the STT subsystem.
#[derive(Debug, Clone, Error)]
pub enum SttError {
    /// The GGML model file was not found at the given path.
    #[error("Model file not found: {0} — download it from huggingface.co/ggerganov/whisper.cpp")]
    ModelNotFound(String),

    /// `whisper_rs` failed to initialise a `WhisperContext` or `WhisperState`.
    #[error("Whisper context initialisation failed: {0}")]
    ContextInit(String),

    /// An error occurred during the inference pass.
    #[error("Transcription error: {0}")]
    Transcription(String),
}

// ---------------------------------------------------------------------------
// SttEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech-to-text engines.
///
/// # Contract
///
/// - `audio` must be **16 kHz, mono, f32** PCM samples.
/// - `language` is an ISO-639-1 hint; `None` lets the engine detect the
///   language itself.
/// - Silent or empty audio is a valid input producing an empty transcript,
///   not an error.
pub trait SttEngine: std::fmt::Debug + Send + Sync {
    /// Transcribe `audio` and return the full result with per-segment
    /// timing information.
    fn transcribe(
        &self,
        audio: &[f32],
        language: Option<&str>,
    ) -> Result<TranscriptionResult, SttError>;
}

// Compile-time assertion: Box<dyn SttEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SttEngine>) {}
};

// ---------------------------------------------------------------------------
// WhisperEngine
// ---------------------------------------------------------------------------

/// Production STT engine that wraps a `whisper_rs::WhisperContext`.
///
/// A new `WhisperState` is created for every [`transcribe`] call so the
/// engine can be shared across threads without any locking.
///
/// [`transcribe`]: SttEngine::transcribe
pub struct WhisperEngine {
    ctx: WhisperContext,
    params: TranscribeParams,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// `WhisperContext` holds a raw pointer internally but declares
// `unsafe impl Send` and `unsafe impl Sync` in whisper-rs — the model
// weights are read-only after loading.  `TranscribeParams` is fully owned
// and trivially Send+Sync.
// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs.
unsafe impl Send for WhisperEngine {}
unsafe impl Sync for WhisperEngine {}

impl WhisperEngine {
    /// Load a GGML model from `model_path` and prepare it for inference.
    ///
    /// # Errors
    ///
    /// - [`SttError::ModelNotFound`] — `model_path` does not exist.
    /// - [`SttError::ContextInit`]  — whisper-rs failed to load the file.
    pub fn load(
        model_path: impl AsRef<Path>,
        params: TranscribeParams,
    ) -> Result<Self, SttError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(SttError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            SttError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let ctx_params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        Ok(Self { ctx, params })
    }
}

impl SttEngine for WhisperEngine {
    fn transcribe(
        &self,
        audio: &[f32],
        language: Option<&str>,
    ) -> Result<TranscriptionResult, SttError> {
        // ── Build FullParams ──────────────────────────────────────────────
        // Convert our SamplingStrategy → whisper-rs's SamplingStrategy.
        use whisper_rs::SamplingStrategy as WS;
        let ws = match self.params.strategy {
            SamplingStrategy::Greedy { best_of } => WS::Greedy { best_of },
            SamplingStrategy::BeamSearch { beam_size, patience } => {
                WS::BeamSearch { beam_size, patience }
            }
        };

        let mut fp = FullParams::new(ws);

        // set_language takes an Option<&str> whose lifetime is tied to fp.
        // Both `fp` and `language` remain alive until state.full() returns,
        // so the borrow is valid.
        fp.set_language(language);
        fp.set_n_threads(self.params.n_threads);
        fp.set_translate(false);

        if self.params.suppress_progress {
            fp.set_print_progress(false);
            fp.set_print_realtime(false);
            fp.set_print_timestamps(false);
        }

        // ── Create per-call state and run inference ───────────────────────
        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        let wall_start = std::time::Instant::now();

        state
            .full(fp, audio)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        // ── Collect segments ──────────────────────────────────────────────
        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let mut text = String::new();
        let mut segments: Vec<Segment> = Vec::with_capacity(n_segments as usize);

        for i in 0..n_segments {
            let seg_text = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;

            // Timestamps are in centiseconds → multiply by 10 for ms.
            let t0 = state.full_get_segment_t0(i).unwrap_or(0).max(0) as u64 * 10;
            let t1 = state.full_get_segment_t1(i).unwrap_or(0).max(0) as u64 * 10;

            text.push_str(&seg_text);
            segments.push(Segment {
                text: seg_text,
                start_ms: t0,
                end_ms: t1,
            });
        }

        // The hint wins when one was given; otherwise ask Whisper what it
        // detected.
        let detected = match language {
            Some(hint) => Some(hint.to_string()),
            None => state
                .full_lang_id_from_state()
                .ok()
                .and_then(whisper_rs::get_lang_str)
                .map(str::to_string),
        };

        Ok(TranscriptionResult {
            text: text.trim().to_string(),
            segments,
            language: detected,
            duration_ms: wall_start.elapsed().as_millis(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockSttEngine  (test-only)
// ---------------------------------------------------------------------------

/// A test double that returns a pre-configured response without loading any
/// model file.  Records the language hints it was called with.
#[cfg(test)]
#[derive(Debug)]
pub struct MockSttEngine {
    response: Result<TranscriptionResult, SttError>,
    pub hints: std::sync::Mutex<Vec<Option<String>>>,
    pub audio_lens: std::sync::Mutex<Vec<usize>>,
}

#[cfg(test)]
impl MockSttEngine {
    /// A mock returning one segment per entry of `segments`.
    pub fn with_segments(segments: &[&str]) -> Self {
        let text = segments.concat().trim().to_string();
        let segments = segments
            .iter()
            .enumerate()
            .map(|(i, s)| Segment {
                text: s.to_string(),
                start_ms: i as u64 * 1_000,
                end_ms: (i as u64 + 1) * 1_000,
            })
            .collect();
        Self {
            response: Ok(TranscriptionResult {
                text,
                segments,
                language: Some("en".into()),
                duration_ms: 1,
            }),
            hints: std::sync::Mutex::new(Vec::new()),
            audio_lens: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// A mock that transcribes everything to silence: empty text, no
    /// segments.
    pub fn silent() -> Self {
        Self {
            response: Ok(TranscriptionResult {
                text: String::new(),
                segments: Vec::new(),
                language: None,
                duration_ms: 1,
            }),
            hints: std::sync::Mutex::new(Vec::new()),
            audio_lens: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// A mock that always returns `Err(error)`.
    pub fn err(error: SttError) -> Self {
        Self {
            response: Err(error),
            hints: std::sync::Mutex::new(Vec::new()),
            audio_lens: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[cfg(test)]
impl SttEngine for MockSttEngine {
    fn transcribe(
        &self,
        _audio: &[f32],
        language: Option<&str>,
    ) -> Result<TranscriptionResult, SttError> {
        self.hints
            .lock()
            .unwrap()
            .push(language.map(str::to_string));
        self.audio_lens.lock().unwrap().push(_audio.len());
        self.response.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // --- MockSttEngine ---

    #[test]
    fn mock_returns_configured_segments() {
        let engine = MockSttEngine::with_segments(&[" Hello", " world."]);
        let result = engine.transcribe(&vec![0.0f32; 16_000], None).unwrap();
        assert_eq!(result.text, "Hello world.");
        assert_eq!(result.segments.len(), 2);
        assert_eq!(result.segments[1].start_ms, 1_000);
    }

    #[test]
    fn mock_records_language_hints() {
        let engine = MockSttEngine::silent();
        let _ = engine.transcribe(&[], Some("es"));
        let _ = engine.transcribe(&[], None);
        let hints = engine.hints.lock().unwrap();
        assert_eq!(*hints, vec![Some("es".to_string()), None]);
    }

    #[test]
    fn mock_err_returns_configured_error() {
        let engine = MockSttEngine::err(SttError::Transcription("boom".into()));
        let err = engine.transcribe(&[], None).unwrap_err();
        assert!(matches!(err, SttError::Transcription(_)));
    }

    #[test]
    fn silent_mock_is_a_valid_empty_result() {
        let engine = MockSttEngine::silent();
        let result = engine.transcribe(&vec![0.0f32; 160_000], None).unwrap();
        assert!(result.text.is_empty());
        assert!(result.segments.is_empty());
    }

    // --- WhisperEngine::load missing path ---

    #[test]
    fn load_missing_model_returns_model_not_found() {
        let params = TranscribeParams::default();
        let result = WhisperEngine::load("/nonexistent/model.bin", params);
        assert!(
            matches!(result, Err(SttError::ModelNotFound(_))),
            "expected ModelNotFound, got: {result:?}"
        );
    }

    // --- SttEngine object safety ---

    #[test]
    fn box_dyn_stt_engine_compiles() {
        // If this test compiles, the trait is object-safe.
        let engine: Box<dyn SttEngine> = Box::new(MockSttEngine::silent());
        let _ = engine.transcribe(&[], None);
    }

    // --- SttError display ---

    #[test]
    fn stt_error_display_names_the_missing_model() {
        let e = SttError::ModelNotFound("/some/ggml-base.bin".into());
        assert!(e.to_string().contains("/some/ggml-base.bin"));
    }
}
