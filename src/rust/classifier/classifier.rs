use std::fmt;
use std::path::{Path, PathBuf};

use super::builder::IdentifierBuilder;
use super::error::ClassifierError;
use super::language::Language;
use super::model::{LanguageModel, ModelLoader, RawBatch, RawPrediction};
use super::normalize::{normalize_many, normalize_one, BatchOptions, BatchOutput};
use crate::runtime::{IdentifierConfig, InitError};

/// A loaded language identification model plus the threshold its answers
/// are judged by.
///
/// Built once per process through [`LanguageIdentifier::init`] or
/// [`LanguageIdentifier::builder`]; read-only afterwards.
///
/// ```no_run
/// # use luga::{LanguageIdentifier, IdentifierConfig, ModelLoader};
/// # fn run(loader: &dyn ModelLoader) -> Result<(), Box<dyn std::error::Error>> {
/// let identifier = LanguageIdentifier::init(IdentifierConfig::from_env(), loader)?;
/// let language = identifier.identify("Hvordan har du det?")?;
/// println!("{}", language);
/// # Ok(())
/// # }
/// ```
pub struct LanguageIdentifier {
    model: Box<dyn LanguageModel>,
    artifact_path: PathBuf,
    threshold: f64,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<LanguageIdentifier>();
    }
};

impl fmt::Debug for LanguageIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageIdentifier")
            .field("artifact_path", &self.artifact_path)
            .field("threshold", &self.threshold)
            .finish_non_exhaustive()
    }
}

impl LanguageIdentifier {
    /// Creates a new IdentifierBuilder for fluent construction
    pub fn builder() -> IdentifierBuilder {
        IdentifierBuilder::new()
    }

    /// Fetches the artifact if needed and loads it with `loader`.
    pub fn init(config: IdentifierConfig, loader: &dyn ModelLoader) -> Result<Self, InitError> {
        IdentifierBuilder::new().with_config(config).build(loader)
    }

    pub(crate) fn from_parts(
        model: Box<dyn LanguageModel>,
        artifact_path: PathBuf,
        threshold: f64,
    ) -> Self {
        Self {
            model,
            artifact_path,
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Batch options carrying this identifier's threshold.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions::new().with_threshold(self.threshold)
    }

    /// Raw model answer for one line of text.
    pub fn predict_one(&self, text: &str) -> Result<RawPrediction, ClassifierError> {
        validate_text(text)?;
        self.model.predict_one(text)
    }

    /// Raw model answers for several lines of text.
    pub fn predict_many(&self, texts: &[&str]) -> Result<RawBatch, ClassifierError> {
        for text in texts {
            validate_text(text)?;
        }
        self.model.predict_many(texts)
    }

    /// Predicts the language of one line of text.
    pub fn identify(&self, text: &str) -> Result<Language, ClassifierError> {
        let prediction = self.predict_one(text)?;
        normalize_one(&prediction, self.threshold)
    }

    /// Predicts the language of each text, shaped by `options`.
    ///
    /// Only the shape flags of `options` are used; the threshold is always
    /// this identifier's own.
    pub fn identify_many(
        &self,
        texts: &[&str],
        options: BatchOptions,
    ) -> Result<BatchOutput, ClassifierError> {
        let (labels, scores) = self.predict_many(texts)?;
        normalize_many(&labels, &scores, options.with_threshold(self.threshold))
    }
}

fn validate_text(text: &str) -> Result<(), ClassifierError> {
    if text.is_empty() {
        return Err(ClassifierError::ValidationError("Input text cannot be empty".into()));
    }
    // the model predicts one line at a time
    if text.contains('\n') {
        return Err(ClassifierError::ValidationError(
            "Input text must be a single line".into(),
        ));
    }
    Ok(())
}
