//! Job pipeline for Voice Extractor.
//!
//! This module wires the file → ffmpeg → Whisper → transcript sequence and
//! the event channel the UI polls every frame.
//!
//! # Architecture
//!
//! ```text
//! UI thread                       tokio blocking pool
//! ─────────                       ───────────────────
//! JobRunner::submit(Job) ───────▶ run_job()
//!                                   ├─ prepare_audio (ffmpeg / pass-through)
//!                                   ├─ ModelProvider::engine_for (cached)
//!                                   ├─ load_wav_mono_16k
//!                                   └─ SttEngine::transcribe
//!                                        │
//! EventReceiver::drain_all ◀──── EventSender::push (Status / Progress /
//!   every frame (100 ms)                Segment / Completed / Failed)
//! ```
//!
//! The worker never touches UI state; the UI never blocks on the worker.

pub mod events;
pub mod job;
pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use events::{event_channel, EventReceiver, EventSender, JobEvent};
pub use job::{Job, JobPhase};
pub use runner::{run_job, JobRunner, SubmitError};
