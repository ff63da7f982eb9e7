//! Job definition and the UI-side job phase.

use std::path::PathBuf;

use crate::stt::{normalize_language, ModelKind};

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// One user-initiated transcription request.
///
/// Model and language are normalized at construction: an identifier outside
/// the registry falls back to `base`, an unknown language falls back to
/// auto-detect.  A `Job` is owned by the worker for its whole run and is
/// discarded afterwards — only the resulting [`Transcript`] survives.
///
/// [`Transcript`]: crate::transcript::Transcript
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    /// Absolute path of the selected media file.
    pub source: PathBuf,
    /// Whisper model to run.
    pub model: ModelKind,
    /// Normalized language selection (`"auto"` or an ISO-639-1 code).
    pub language: String,
}

impl Job {
    /// Build a job from raw UI selections, applying the lenient fallback
    /// normalization for model and language.
    pub fn new(source: impl Into<PathBuf>, model: &str, language: &str) -> Self {
        Self {
            source: source.into(),
            model: ModelKind::normalize(model),
            language: normalize_language(language),
        }
    }
}

// ---------------------------------------------------------------------------
// JobPhase — UI-side lifecycle
// ---------------------------------------------------------------------------

/// Lifecycle of the current job as seen by the UI.
///
/// ```text
/// Idle ──submit──▶ Running ──Completed event──▶ Completed
///                          ──Failed event─────▶ Failed
/// Completed / Failed ──next submit──▶ Running
/// ```
///
/// A new job may only be submitted while no job is `Running`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    /// No job has run yet, or the last result was cleared.
    #[default]
    Idle,
    /// A worker is active; the submit control is disabled.
    Running,
    /// The last job produced a transcript.
    Completed,
    /// The last job failed; any earlier transcript is still shown.
    Failed,
}

impl JobPhase {
    /// `true` while a worker is active.
    pub fn is_running(&self) -> bool {
        matches!(self, JobPhase::Running)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
