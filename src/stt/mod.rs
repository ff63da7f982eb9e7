//! STT (Speech-to-Text) module.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │              ModelProvider (trait)                     │
//! │                                                        │
//! │   ┌─────────────┐     ┌────────────────────────┐      │
//! │   │  ModelPaths  │────▶│ CachingWhisperProvider │      │
//! │   │ - resolve    │     │ - Mutex<HashMap> cache │      │
//! │   └─────────────┘     └───────────┬────────────┘      │
//! │                                    │ engine_for(kind)  │
//! │                                    ▼                   │
//! │                        ┌──────────────────┐            │
//! │                        │ SttEngine (trait)│            │
//! │                        │ WhisperEngine    │            │
//! │                        │ audio → segments │            │
//! │                        └──────────────────┘            │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_extractor::config::AppPaths;
//! use voice_extractor::stt::{
//!     CachingWhisperProvider, ModelKind, ModelPaths, ModelProvider, TranscribeParams,
//! };
//!
//! let provider = CachingWhisperProvider::new(
//!     ModelPaths::from_app_paths(&AppPaths::new()),
//!     TranscribeParams::default(),
//! );
//!
//! // audio: 16 kHz, mono, f32 PCM from the audio module
//! let audio: Vec<f32> = vec![0.0; 16_000]; // 1 s of silence
//! let engine = provider.engine_for(ModelKind::Base).unwrap();
//! let result = engine.transcribe(&audio, None).unwrap();
//! println!("{}", result.text);
//! ```

pub mod engine;
pub mod model;
pub mod provider;
pub mod transcribe;

// ── Public re-exports ──────────────────────────────────────────────────────

pub use engine::{SttEngine, SttError, WhisperEngine};
pub use model::{ModelInfo, ModelKind, ModelPaths, MODELS};
pub use provider::{CachingWhisperProvider, ModelProvider};
pub use transcribe::{
    language_hint, normalize_language, SamplingStrategy, Segment, TranscribeParams,
    TranscriptionResult, AUTO_LANGUAGE, SUPPORTED_LANGUAGES,
};

// test-only re-exports so the pipeline test module can import the doubles
// without spelling the full module paths.
#[cfg(test)]
pub use engine::MockSttEngine;
#[cfg(test)]
pub use provider::MockModelProvider;
