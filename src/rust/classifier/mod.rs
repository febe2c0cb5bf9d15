mod builder;
#[allow(clippy::module_inception)]
mod classifier;
mod error;
mod language;
mod model;
mod normalize;

pub use builder::IdentifierBuilder;
pub use classifier::LanguageIdentifier;
pub use error::ClassifierError;
pub use language::{FieldValue, Language, LanguageField, UNKNOWN_LANGUAGE};
pub use model::{Diagnostics, LanguageModel, ModelLoader, RawBatch, RawPrediction};
pub use normalize::{
    normalize_languages, normalize_many, normalize_one, parse_prediction_line, strip_label,
    BatchOptions, BatchOutput, Confidence, RawLabel, DEFAULT_THRESHOLD, LABEL_PREFIX,
};
