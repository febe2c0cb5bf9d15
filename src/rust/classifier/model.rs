use std::path::Path;

use ndarray::Array1;

use super::error::ClassifierError;

/// Raw answer for one text: ranked labels and their probabilities.
pub type RawPrediction = (Vec<String>, Array1<f32>);
/// Raw answer for a batch: per-text labels and per-text probabilities.
pub type RawBatch = (Vec<Vec<String>>, Vec<Array1<f32>>);

/// A loaded language identification model.
///
/// Implementations wrap whatever actually runs the model; this crate only
/// consumes the predictions.
pub trait LanguageModel: Send + Sync {
    /// Top prediction for a single line of text.
    fn predict_one(&self, text: &str) -> Result<RawPrediction, ClassifierError>;

    /// Top prediction for each text, in input order.
    fn predict_many(&self, texts: &[&str]) -> Result<RawBatch, ClassifierError> {
        let mut labels = Vec::with_capacity(texts.len());
        let mut scores = Vec::with_capacity(texts.len());
        for text in texts {
            let (label, score) = self.predict_one(text)?;
            labels.push(label);
            scores.push(score);
        }
        Ok((labels, scores))
    }
}

/// Where a model's own diagnostic output goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Diagnostics {
    /// Discard everything.
    #[default]
    Silent,
    /// Forward to the `log` facade at warn level.
    Log,
}

impl Diagnostics {
    pub fn emit(&self, message: &str) {
        if let Self::Log = self {
            log::warn!(target: "luga::model", "{}", message);
        }
    }
}

/// Loads a cached artifact into a [`LanguageModel`].
pub trait ModelLoader {
    fn load(
        &self,
        path: &Path,
        diagnostics: Diagnostics,
    ) -> Result<Box<dyn LanguageModel>, ClassifierError>;
}

impl<F> ModelLoader for F
where
    F: Fn(&Path, Diagnostics) -> Result<Box<dyn LanguageModel>, ClassifierError>,
{
    fn load(
        &self,
        path: &Path,
        diagnostics: Diagnostics,
    ) -> Result<Box<dyn LanguageModel>, ClassifierError> {
        self(path, diagnostics)
    }
}
