//! The final transcript and its persistence.
//!
//! A [`Transcript`] is created once, when a job completes, and never mutated
//! afterwards.  It lives in the UI until the text area is cleared or the
//! next job starts.

use std::path::{Path, PathBuf};

use crate::stt::ModelKind;

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// The result of one completed transcription job.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    /// Full transcript text.  May be empty for silent input.
    pub text: String,
    /// ISO-639-1 code of the language that was transcribed, when known.
    pub language: Option<String>,
    /// Duration of the source audio, formatted as `M:SS`.
    pub source_duration: String,
    /// The model that produced this transcript.
    pub model: ModelKind,
}

impl Transcript {
    /// Write the text as UTF-8 to `path`.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.text)
    }

    /// One-line summary for the status bar, e.g.
    /// `"2:41 of audio · language: es · model: base"`.
    pub fn summary(&self) -> String {
        match &self.language {
            Some(lang) => format!(
                "{} of audio · language: {} · model: {}",
                self.source_duration, lang, self.model
            ),
            None => format!("{} of audio · model: {}", self.source_duration, self.model),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Default save-path suggestion: `<source stem>_transcription.txt` in the
/// source file's directory.
pub fn default_output_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("transcription");
    let file_name = format!("{stem}_transcription.txt");
    match source.parent() {
        Some(dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Format a duration in whole seconds as `M:SS` (e.g. `0:07`, `12:34`).
pub fn format_duration(total_secs: u64) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
