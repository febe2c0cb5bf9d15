use std::fmt;

/// Represents the different types of errors that can occur while turning
/// classifier output into [`Language`](super::Language) values.
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Label and confidence sequences of a batch differ in length
    LengthMismatch { labels: usize, confidences: usize },
    /// Error occurred due to invalid input parameters
    ValidationError(String),
    /// Error occurred while loading the model artifact
    ModelError(String),
    /// Error occurred while making predictions
    PredictionError(String),
}

impl fmt::Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LengthMismatch { labels, confidences } => write!(
                f,
                "Length mismatch: {} labels but {} confidences",
                labels, confidences
            ),
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::ModelError(msg) => write!(f, "Model error: {}", msg),
            Self::PredictionError(msg) => write!(f, "Prediction error: {}", msg),
        }
    }
}

impl std::error::Error for ClassifierError {}
