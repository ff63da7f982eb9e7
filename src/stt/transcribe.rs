//! Transcription parameter types, result types and language handling.
//!
//! [`TranscribeParams`] carries the settings that apply to every inference
//! run; the language hint is per-job and is passed to
//! [`SttEngine::transcribe`] instead.
//!
//! [`SttEngine::transcribe`]: crate::stt::SttEngine::transcribe

// ---------------------------------------------------------------------------
// Languages
// ---------------------------------------------------------------------------

/// Sentinel language value meaning "let Whisper detect the language".
pub const AUTO_LANGUAGE: &str = "auto";

/// Languages offered in the UI, auto-detect first.
pub const SUPPORTED_LANGUAGES: &[&str] = &[
    AUTO_LANGUAGE,
    "es",
    "en",
    "fr",
    "de",
    "it",
    "pt",
    "ru",
    "ja",
    "ko",
    "zh",
];

/// Normalize a language selection: known codes pass through lower-cased,
/// everything else falls back to auto-detect.  Invalid selections are
/// normalized, not rejected.
pub fn normalize_language(language: &str) -> String {
    let lang = language.trim().to_ascii_lowercase();
    if SUPPORTED_LANGUAGES.contains(&lang.as_str()) {
        lang
    } else {
        log::warn!("unknown language {language:?}, falling back to auto-detect");
        AUTO_LANGUAGE.to_string()
    }
}

/// Convert a normalized language into the optional hint the engine takes:
/// `None` means auto-detect.
pub fn language_hint(language: &str) -> Option<&str> {
    if language == AUTO_LANGUAGE {
        None
    } else {
        Some(language)
    }
}

// ---------------------------------------------------------------------------
// SamplingStrategy
// ---------------------------------------------------------------------------

/// Mirrors `whisper_rs::SamplingStrategy` but is owned and `Clone`.
///
/// [`SamplingStrategy::Greedy`] is the low-latency single-pass default;
/// [`SamplingStrategy::BeamSearch`] gives slightly better accuracy at the
/// cost of 2-4× higher latency.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    /// Greedy (single-pass) decoding.
    Greedy {
        /// Number of candidate tokens evaluated per step.  1 is fastest.
        best_of: i32,
    },
    /// Beam-search decoding.
    BeamSearch {
        /// Number of beams to maintain in parallel.
        beam_size: i32,
        /// Beam-search patience factor (≥1.0 = standard beam search).
        patience: f32,
    },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Greedy { best_of: 1 }
    }
}

// ---------------------------------------------------------------------------
// TranscribeParams
// ---------------------------------------------------------------------------

/// Job-independent parameters for Whisper inference runs.
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// Decoding strategy — Greedy is fastest, BeamSearch is more accurate.
    pub strategy: SamplingStrategy,

    /// Number of CPU threads handed to Whisper.  Defaults to
    /// [`optimal_threads()`], capped at 8.
    pub n_threads: i32,

    /// Suppress Whisper's progress output to stderr.
    pub suppress_progress: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            strategy: SamplingStrategy::default(),
            n_threads: optimal_threads(),
            suppress_progress: true,
        }
    }
}

/// Returns the number of CPU threads to use for inference, capped at 8 to
/// avoid diminishing returns on Whisper.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// The output of a successful transcription.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    /// Full concatenated transcript text (trimmed of leading/trailing
    /// whitespace).  Empty for silent input — that is a valid result, not an
    /// error.
    pub text: String,

    /// Individual time-aligned segments produced by Whisper, in order.
    pub segments: Vec<Segment>,

    /// ISO-639-1 code of the language Whisper used: the caller's hint when
    /// one was given, the detected language otherwise (when known).
    pub language: Option<String>,

    /// Wall-clock time the inference took, in milliseconds.
    pub duration_ms: u128,
}

/// A single time-aligned text chunk produced by Whisper.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Segment text (may include punctuation inserted by Whisper).
    pub text: String,
    /// Segment start time in milliseconds from the start of the audio.
    pub start_ms: u64,
    /// Segment end time in milliseconds from the start of the audio.
    pub end_ms: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
