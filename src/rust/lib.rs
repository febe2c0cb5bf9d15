//! Language identification results and model artifact caching for
//! fastText-style classifiers.
//!
//! Two independent pieces:
//!
//! - [`ModelManager`] keeps one cached copy of the model binary on disk:
//!   fetch if absent, forced re-fetch, eviction.
//! - [`normalize_one`] / [`normalize_many`] turn raw `(label, confidence)`
//!   output into [`Language`] values, gated by a confidence threshold.
//!
//! [`LanguageIdentifier`] ties them together: it makes sure the artifact is
//! present, loads it through a caller-supplied [`ModelLoader`], and
//! normalizes every prediction.
//!
//! # Basic Usage
//!
//! ```rust
//! use luga::{normalize_many, BatchOptions, Language};
//!
//! let labels = vec![vec!["__label__da"], vec!["__label__en"]];
//! let confidences = vec![vec![0.998f32], vec![0.12f32]];
//!
//! let languages = normalize_many(&labels, &confidences, BatchOptions::new())?
//!     .into_languages()
//!     .unwrap_or_default();
//! assert_eq!(languages[0].name(), "da");
//! assert_eq!(languages[1], Language::Unknown);
//! # Ok::<(), luga::ClassifierError>(())
//! ```
//!
//! # Artifact cache
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use luga::ModelManager;
//!
//! let manager = ModelManager::new_default()?;
//! manager.ensure_default(false)?; // no-op once cached
//! assert!(manager.is_present());
//! manager.evict()?;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod model_manager;
pub mod runtime;

pub use classifier::{
    normalize_languages, normalize_many, normalize_one, parse_prediction_line, strip_label,
    BatchOptions, BatchOutput, ClassifierError, Confidence, Diagnostics, FieldValue,
    IdentifierBuilder, Language, LanguageField, LanguageIdentifier, LanguageModel, ModelLoader,
    RawBatch, RawLabel, RawPrediction, DEFAULT_THRESHOLD, LABEL_PREFIX, UNKNOWN_LANGUAGE,
};
pub use model_manager::{ArtifactConfig, Fetch, HttpFetcher, ModelError, ModelManager};
pub use runtime::{shared, shared_or_init, IdentifierConfig, InitError};

pub fn init_logger() {
    env_logger::init();
}
