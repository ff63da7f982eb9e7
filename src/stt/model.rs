//! Model registry, metadata and path resolution.
//!
//! The five standard multilingual Whisper GGML models are supported.
//! [`ModelKind`] is the typed identifier used throughout the crate;
//! [`ModelPaths`] resolves the on-disk location of a model given an
//! [`crate::config::AppPaths`] instance.

use std::path::PathBuf;

use crate::config::AppPaths;

// ---------------------------------------------------------------------------
// ModelKind
// ---------------------------------------------------------------------------

/// Capacity tier of a Whisper GGML model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelKind {
    /// ~75 MB file — fastest, lowest accuracy.
    Tiny,
    /// ~142 MB file — balanced (default). ✅
    #[default]
    Base,
    /// ~466 MB file.
    Small,
    /// ~1.5 GB file.
    Medium,
    /// ~2.9 GB file — highest accuracy, slowest.
    Large,
}

impl ModelKind {
    /// All selectable models, smallest first (combo-box order).
    pub const ALL: &'static [ModelKind] = &[
        ModelKind::Tiny,
        ModelKind::Base,
        ModelKind::Small,
        ModelKind::Medium,
        ModelKind::Large,
    ];

    /// Identifier used in config files and the UI (`"tiny"` … `"large"`).
    pub fn id(&self) -> &'static str {
        match self {
            ModelKind::Tiny => "tiny",
            ModelKind::Base => "base",
            ModelKind::Small => "small",
            ModelKind::Medium => "medium",
            ModelKind::Large => "large",
        }
    }

    /// Parse an identifier; `None` for anything outside the registry.
    pub fn from_id(id: &str) -> Option<ModelKind> {
        let id = id.trim().to_ascii_lowercase();
        ModelKind::ALL.iter().copied().find(|m| m.id() == id)
    }

    /// Parse an identifier, falling back to [`ModelKind::Base`] for unknown
    /// values.  Invalid selections are normalized, not rejected.
    pub fn normalize(id: &str) -> ModelKind {
        match Self::from_id(id) {
            Some(kind) => kind,
            None => {
                log::warn!("unknown model id {id:?}, falling back to \"base\"");
                ModelKind::default()
            }
        }
    }

    /// Static metadata for this model.
    pub fn info(&self) -> &'static ModelInfo {
        &MODELS[*self as usize]
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

// ---------------------------------------------------------------------------
// ModelInfo
// ---------------------------------------------------------------------------

/// Static metadata for a single GGML model file.
#[derive(Debug)]
pub struct ModelInfo {
    /// The typed identifier this entry describes.
    pub kind: ModelKind,
    /// Human-readable display name shown in the UI.
    pub display_name: &'static str,
    /// File name under the models directory (e.g. `"ggml-base.bin"`).
    pub file_name: &'static str,
    /// Approximate file size in megabytes.
    pub file_size_mb: u64,
    /// Minimum RAM required to run this model (megabytes).
    pub ram_required_mb: u64,
    /// Source URL for downloading the GGML file.
    pub source_url: &'static str,
}

/// Standard OpenAI Whisper models (99-language multilingual), indexed by
/// `ModelKind as usize`.
pub const MODELS: &[ModelInfo] = &[
    ModelInfo {
        kind: ModelKind::Tiny,
        display_name: "Whisper Tiny (fastest)",
        file_name: "ggml-tiny.bin",
        file_size_mb: 75,
        ram_required_mb: 400,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
    },
    ModelInfo {
        kind: ModelKind::Base,
        display_name: "Whisper Base [Recommended]",
        file_name: "ggml-base.bin",
        file_size_mb: 142,
        ram_required_mb: 500,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
    },
    ModelInfo {
        kind: ModelKind::Small,
        display_name: "Whisper Small",
        file_name: "ggml-small.bin",
        file_size_mb: 466,
        ram_required_mb: 1_000,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
    },
    ModelInfo {
        kind: ModelKind::Medium,
        display_name: "Whisper Medium",
        file_name: "ggml-medium.bin",
        file_size_mb: 1_500,
        ram_required_mb: 3_000,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
    },
    ModelInfo {
        kind: ModelKind::Large,
        display_name: "Whisper Large-v3 (best quality)",
        file_name: "ggml-large-v3.bin",
        file_size_mb: 2_900,
        ram_required_mb: 6_000,
        source_url: "https://huggingface.co/ggerganov/whisper.cpp",
    },
];

// ---------------------------------------------------------------------------
// ModelPaths
// ---------------------------------------------------------------------------

/// Resolves the on-disk location of model files from [`AppPaths`].
///
/// ```rust,no_run
/// use voice_extractor::config::AppPaths;
/// use voice_extractor::stt::{ModelKind, ModelPaths};
///
/// let paths = ModelPaths::from_app_paths(&AppPaths::new());
/// let available: Vec<_> = ModelKind::ALL.iter()
///     .filter(|m| paths.is_available(**m))
///     .collect();
/// ```
#[derive(Debug, Clone)]
pub struct ModelPaths {
    /// Directory that contains (or will contain) GGML `.bin` files.
    pub models_dir: PathBuf,
}

impl ModelPaths {
    /// Build a [`ModelPaths`] from the application's [`AppPaths`].
    pub fn from_app_paths(app_paths: &AppPaths) -> Self {
        Self {
            models_dir: app_paths.models_dir.clone(),
        }
    }

    /// Construct directly from a models directory path (useful in tests).
    pub fn new(models_dir: impl Into<PathBuf>) -> Self {
        Self {
            models_dir: models_dir.into(),
        }
    }

    /// Full path to the GGML file for the given model.
    pub fn model_path(&self, model: ModelKind) -> PathBuf {
        self.models_dir.join(model.info().file_name)
    }

    /// Returns `true` if the model file exists on disk.
    pub fn is_available(&self, model: ModelKind) -> bool {
        self.model_path(model).exists()
    }

    /// Returns all models that are present on disk.
    pub fn list_local_models(&self) -> Vec<ModelKind> {
        ModelKind::ALL
            .iter()
            .copied()
            .filter(|m| self.is_available(*m))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_aligned_with_kinds() {
        assert_eq!(MODELS.len(), ModelKind::ALL.len());
        for kind in ModelKind::ALL {
            assert_eq!(kind.info().kind, *kind, "MODELS order must match enum");
        }
    }

    #[test]
    fn from_id_known() {
        assert_eq!(ModelKind::from_id("medium"), Some(ModelKind::Medium));
        assert_eq!(ModelKind::from_id("  TINY "), Some(ModelKind::Tiny));
    }

    #[test]
    fn from_id_unknown() {
        assert!(ModelKind::from_id("does-not-exist").is_none());
        assert!(ModelKind::from_id("").is_none());
    }

    #[test]
    fn normalize_falls_back_to_base() {
        assert_eq!(ModelKind::normalize("turbo-xxl"), ModelKind::Base);
        assert_eq!(ModelKind::normalize(""), ModelKind::Base);
    }

    #[test]
    fn normalize_known_id_is_identity() {
        for kind in ModelKind::ALL {
            assert_eq!(ModelKind::normalize(kind.id()), *kind);
        }
    }

    #[test]
    fn default_model_is_base() {
        assert_eq!(ModelKind::default(), ModelKind::Base);
    }

    #[test]
    fn model_paths_non_existent_returns_false() {
        let mp = ModelPaths::new("/nonexistent/path");
        assert!(!mp.is_available(ModelKind::Base));
        assert!(mp.list_local_models().is_empty());
    }

    #[test]
    fn model_paths_correct_file_name() {
        let mp = ModelPaths::new("/models");
        let p = mp.model_path(ModelKind::Large);
        assert!(p.to_str().unwrap().ends_with("ggml-large-v3.bin"));
    }
}
