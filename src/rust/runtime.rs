use std::sync::{Arc, Mutex, PoisonError};

use lazy_static::lazy_static;

use crate::classifier::{
    ClassifierError, Diagnostics, LanguageIdentifier, ModelLoader, DEFAULT_THRESHOLD,
};
use crate::model_manager::{ArtifactConfig, ModelError};

/// Everything needed to bring up a [`LanguageIdentifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierConfig {
    pub artifact: ArtifactConfig,
    pub threshold: f64,
    pub diagnostics: Diagnostics,
    /// Re-fetch the artifact even when a cached copy exists.
    pub force_refresh: bool,
}

impl Default for IdentifierConfig {
    fn default() -> Self {
        Self {
            artifact: ArtifactConfig::default(),
            threshold: DEFAULT_THRESHOLD,
            diagnostics: Diagnostics::Silent,
            force_refresh: false,
        }
    }
}

impl IdentifierConfig {
    pub fn from_env() -> Self {
        Self {
            artifact: ArtifactConfig::from_env(),
            ..Self::default()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("Model artifact unavailable: {0}")]
    Artifact(#[from] ModelError),
    #[error("Classifier initialization failed: {0}")]
    Classifier(#[from] ClassifierError),
}

lazy_static! {
    static ref SHARED: Mutex<Option<Arc<LanguageIdentifier>>> = Mutex::new(None);
}

/// Returns the process-wide identifier, initializing it on first call.
///
/// Concurrent first callers wait on each other, so the artifact is fetched
/// and loaded at most once. A failed initialization leaves nothing behind
/// and the next call tries again.
pub fn shared_or_init(
    config: IdentifierConfig,
    loader: &dyn ModelLoader,
) -> Result<Arc<LanguageIdentifier>, InitError> {
    let mut slot = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(identifier) = slot.as_ref() {
        return Ok(Arc::clone(identifier));
    }

    let identifier = Arc::new(LanguageIdentifier::init(config, loader)?);
    *slot = Some(Arc::clone(&identifier));
    Ok(identifier)
}

/// The process-wide identifier, if [`shared_or_init`] has succeeded.
pub fn shared() -> Option<Arc<LanguageIdentifier>> {
    SHARED
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .map(Arc::clone)
}
