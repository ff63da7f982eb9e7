//! Model loading and caching behind the [`ModelProvider`] capability trait.
//!
//! The orchestrator never touches `whisper_rs` directly: it asks a
//! [`ModelProvider`] for an engine by [`ModelKind`].  The production
//! implementation, [`CachingWhisperProvider`], loads GGML files on first use
//! and keeps them behind an explicit mutex so repeated jobs with the same
//! model skip the (multi-second) reload.  The mutex also keeps the cache
//! sound even if more than one worker ever runs; the at-most-one-job rule is
//! not load-bearing here.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::engine::{SttEngine, SttError, WhisperEngine};
use super::model::{ModelKind, ModelPaths};
use super::transcribe::TranscribeParams;

// ---------------------------------------------------------------------------
// ModelProvider trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe source of loaded STT engines.
pub trait ModelProvider: Send + Sync {
    /// Return an engine for `model`, loading it if necessary.
    fn engine_for(&self, model: ModelKind) -> Result<Arc<dyn SttEngine>, SttError>;
}

// ---------------------------------------------------------------------------
// CachingWhisperProvider
// ---------------------------------------------------------------------------

/// Loads Whisper GGML models from [`ModelPaths`] and caches them per
/// [`ModelKind`].
pub struct CachingWhisperProvider {
    paths: ModelPaths,
    params: TranscribeParams,
    cache: Mutex<HashMap<ModelKind, Arc<dyn SttEngine>>>,
}

impl CachingWhisperProvider {
    /// Create an empty provider; nothing is loaded until the first
    /// [`engine_for`](ModelProvider::engine_for) call.
    pub fn new(paths: ModelPaths, params: TranscribeParams) -> Self {
        Self {
            paths,
            params,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl ModelProvider for CachingWhisperProvider {
    fn engine_for(&self, model: ModelKind) -> Result<Arc<dyn SttEngine>, SttError> {
        let mut cache = self.cache.lock().unwrap();

        if let Some(engine) = cache.get(&model) {
            log::debug!("stt: model {model} served from cache");
            return Ok(Arc::clone(engine));
        }

        let path = self.paths.model_path(model);
        log::info!("stt: loading model {model} from {}", path.display());

        let engine: Arc<dyn SttEngine> =
            Arc::new(WhisperEngine::load(&path, self.params.clone())?);
        cache.insert(model, Arc::clone(&engine));
        Ok(engine)
    }
}

// ---------------------------------------------------------------------------
// MockModelProvider  (test-only)
// ---------------------------------------------------------------------------

/// Test double serving a fixed engine (or a fixed error) and counting how
/// often — and for which model — it was asked.
#[cfg(test)]
pub struct MockModelProvider {
    engine: Option<Arc<dyn SttEngine>>,
    error: Option<SttError>,
    pub requests: Mutex<Vec<ModelKind>>,
}

#[cfg(test)]
impl MockModelProvider {
    /// A provider that always hands out `engine`.
    pub fn with_engine(engine: Arc<dyn SttEngine>) -> Self {
        Self {
            engine: Some(engine),
            error: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A provider that always fails with `error`.
    pub fn failing(error: SttError) -> Self {
        Self {
            engine: None,
            error: Some(error),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Number of `engine_for` calls so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[cfg(test)]
impl ModelProvider for MockModelProvider {
    fn engine_for(&self, model: ModelKind) -> Result<Arc<dyn SttEngine>, SttError> {
        self.requests.lock().unwrap().push(model);
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        Ok(Arc::clone(self.engine.as_ref().expect("engine configured")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
