use std::fmt;
use std::str::FromStr;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::error::ClassifierError;

/// Name reported for predictions that did not clear the threshold.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Outcome of a single language prediction.
///
/// Serializes as a `{"name": .., "score": ..}` record; [`Language::Unknown`]
/// becomes `{"name": "unknown", "score": 0.0}`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Language {
    /// A prediction that cleared the confidence threshold.
    Detected { name: String, score: f64 },
    /// The sentinel for predictions below the threshold. The classifier's
    /// own label and score are not kept.
    #[default]
    Unknown,
}

impl Language {
    pub fn detected(name: impl Into<String>, score: f64) -> Self {
        Self::Detected {
            name: name.into(),
            score,
        }
    }

    pub fn unknown() -> Self {
        Self::Unknown
    }

    /// The predicted language code, or `"unknown"`.
    pub fn name(&self) -> &str {
        match self {
            Self::Detected { name, .. } => name,
            Self::Unknown => UNKNOWN_LANGUAGE,
        }
    }

    /// Confidence in `[0.0, 1.0]`; always `0.0` for [`Language::Unknown`].
    pub fn score(&self) -> f64 {
        match self {
            Self::Detected { score, .. } => *score,
            Self::Unknown => 0.0,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    pub fn into_name(self) -> String {
        match self {
            Self::Detected { name, .. } => name,
            Self::Unknown => UNKNOWN_LANGUAGE.to_string(),
        }
    }

    /// Field names in record order.
    pub fn keys() -> &'static [LanguageField] {
        &LanguageField::ALL
    }

    /// Keyed access for record-style consumers.
    pub fn get(&self, field: LanguageField) -> FieldValue<'_> {
        match field {
            LanguageField::Name => FieldValue::Name(self.name()),
            LanguageField::Score => FieldValue::Score(self.score()),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Detected { name, score } => write!(f, "{} ({:.4})", name, score),
            Self::Unknown => f.write_str(UNKNOWN_LANGUAGE),
        }
    }
}

impl Serialize for Language {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut record = serializer.serialize_struct("Language", 2)?;
        record.serialize_field("name", self.name())?;
        record.serialize_field("score", &self.score())?;
        record.end()
    }
}

/// The fields of a [`Language`] record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LanguageField {
    Name,
    Score,
}

impl LanguageField {
    pub const ALL: [LanguageField; 2] = [LanguageField::Name, LanguageField::Score];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Score => "score",
        }
    }
}

impl fmt::Display for LanguageField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageField {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "score" => Ok(Self::Score),
            other => Err(ClassifierError::ValidationError(format!(
                "Unknown language field: {:?}",
                other
            ))),
        }
    }
}

/// Value of one [`LanguageField`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue<'a> {
    Name(&'a str),
    Score(f64),
}

impl<'a> FieldValue<'a> {
    pub fn as_name(&self) -> Option<&'a str> {
        match *self {
            Self::Name(name) => Some(name),
            Self::Score(_) => None,
        }
    }

    pub fn as_score(&self) -> Option<f64> {
        match *self {
            Self::Score(score) => Some(score),
            Self::Name(_) => None,
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Score(score) => write!(f, "{}", score),
        }
    }
}
