//! Media file-extension allowlists.
//!
//! Two distinct sets exist:
//!
//! * [`VIDEO_EXTENSIONS`] / [`AUDIO_EXTENSIONS`] — everything the user may
//!   select at all.  Anything else is rejected before a job is created.
//! * [`PASSTHROUGH_EXTENSIONS`] — the subset the inference stage can consume
//!   directly, without going through ffmpeg.  Whisper takes raw 16 kHz mono
//!   f32 PCM, so only WAV qualifies: it is decoded in-process (see
//!   [`crate::audio::wav`]); every other container is converted first.

use std::path::Path;

/// Video containers accepted by the file selector.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "wmv", "flv", "webm", "m4v"];

/// Audio containers accepted by the file selector.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "aac", "ogg", "m4a", "flac"];

/// Formats fed to the inference stage without an extraction step.
pub const PASSTHROUGH_EXTENSIONS: &[&str] = &["wav"];

/// Lower-cased extension of `path`, or `None` when it has none.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Returns `true` when `path` has an extension from either allowlist.
pub fn is_supported(path: &Path) -> bool {
    match extension_of(path) {
        Some(ext) => {
            VIDEO_EXTENSIONS.contains(&ext.as_str()) || AUDIO_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

/// Returns `true` when `path` can skip the extraction step entirely.
pub fn is_passthrough(path: &Path) -> bool {
    match extension_of(path) {
        Some(ext) => PASSTHROUGH_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
