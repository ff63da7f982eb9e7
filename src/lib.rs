//! Voice Extractor — desktop GUI that turns a media file into a transcript.
//!
//! The user picks a video or audio file, chooses a Whisper model and a
//! language, and the app extracts the speech as text: audio is prepared with
//! ffmpeg (or used as-is for WAV), inference runs through `whisper-rs` on a
//! background worker, and progress streams back to the egui window over an
//! event channel drained by a 100 ms poll loop.
//!
//! # Modules
//!
//! | Module        | Responsibility                                        |
//! |---------------|-------------------------------------------------------|
//! | [`audio`]     | format allowlists, ffmpeg extraction, WAV decoding    |
//! | [`stt`]       | Whisper engine, model registry, caching provider      |
//! | [`pipeline`]  | job runner, orchestrator, UI event channel            |
//! | [`transcript`]| final transcript type and persistence                 |
//! | [`clipboard`] | copy-to-clipboard via arboard                         |
//! | [`config`]    | settings.toml + platform paths                        |
//! | [`app`]       | the eframe/egui application                           |

pub mod app;
pub mod audio;
pub mod clipboard;
pub mod config;
pub mod pipeline;
pub mod stt;
pub mod transcript;
