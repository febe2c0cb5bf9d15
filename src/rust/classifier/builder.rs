use log::info;

use super::classifier::LanguageIdentifier;
use super::error::ClassifierError;
use super::model::{Diagnostics, ModelLoader};
use crate::model_manager::{ArtifactConfig, Fetch, ModelManager};
use crate::runtime::{IdentifierConfig, InitError};

/// A builder for constructing a [`LanguageIdentifier`] with a fluent interface.
///
/// Building makes sure the model artifact is cached (fetching it when
/// missing or when a refresh is forced), then hands the cached file to a
/// [`ModelLoader`].
#[derive(Debug, Default)]
pub struct IdentifierBuilder {
    config: IdentifierConfig,
}

impl IdentifierBuilder {
    /// Creates a builder with the default configuration
    pub fn new() -> Self {
        Self {
            config: IdentifierConfig::default(),
        }
    }

    /// Replaces the whole configuration
    pub fn with_config(mut self, config: IdentifierConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets where the artifact comes from and where it is cached
    pub fn with_artifact_config(mut self, artifact: ArtifactConfig) -> Self {
        self.config.artifact = artifact;
        self
    }

    /// Sets the minimum confidence for a named language
    ///
    /// # Errors
    /// `ValidationError` if the threshold lies outside `[0.0, 1.0]`
    pub fn with_threshold(mut self, threshold: f64) -> Result<Self, ClassifierError> {
        self.config.threshold = validate_threshold(threshold)?;
        Ok(self)
    }

    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.config.diagnostics = diagnostics;
        self
    }

    /// Re-fetch the artifact even when a cached copy exists
    pub fn with_force_refresh(mut self, force_refresh: bool) -> Self {
        self.config.force_refresh = force_refresh;
        self
    }

    /// Fetches over HTTP with the configured artifact settings and loads the model
    pub fn build(self, loader: &dyn ModelLoader) -> Result<LanguageIdentifier, InitError> {
        let manager = ModelManager::new(self.config.artifact.clone())?;
        self.build_with(&manager, loader)
    }

    /// Like [`build`](Self::build) but uses an existing manager, whose own
    /// artifact settings take precedence.
    pub fn build_with<F: Fetch>(
        self,
        manager: &ModelManager<F>,
        loader: &dyn ModelLoader,
    ) -> Result<LanguageIdentifier, InitError> {
        let threshold = validate_threshold(self.config.threshold)?;

        info!("Ensuring model artifact at {:?}", manager.artifact_path());
        manager.ensure_default(self.config.force_refresh)?;

        let path = manager.artifact_path();
        info!("Loading model from {:?}", path);
        let model = loader.load(&path, self.config.diagnostics)?;
        info!("Language identifier ready (threshold {})", threshold);

        Ok(LanguageIdentifier::from_parts(model, path, threshold))
    }
}

fn validate_threshold(threshold: f64) -> Result<f64, ClassifierError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(ClassifierError::ValidationError(format!(
            "Threshold must be between 0.0 and 1.0, got {}",
            threshold
        )))
    }
}
