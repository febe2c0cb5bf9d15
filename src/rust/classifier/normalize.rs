//! Turns raw classifier output into [`Language`] values.
//!
//! fastText-style classifiers answer with prefixed labels (`__label__en`)
//! and probabilities wrapped in one-element arrays, either for a single text
//! or as two parallel sequences for a batch. Everything here is pure.

use std::cmp::Ordering;

use ndarray::{Array1, ArrayBase, Data, Dimension};

use super::error::ClassifierError;
use super::language::Language;

/// Prefix the classifier puts in front of every language code.
pub const LABEL_PREFIX: &str = "__label__";
/// Minimum confidence for a prediction to count as a named language.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// A confidence as produced by a classifier: a bare number or a container
/// holding exactly one number.
pub trait Confidence {
    fn scalar(&self) -> Result<f64, ClassifierError>;
}

impl Confidence for f32 {
    fn scalar(&self) -> Result<f64, ClassifierError> {
        Ok(f64::from(*self))
    }
}

impl Confidence for f64 {
    fn scalar(&self) -> Result<f64, ClassifierError> {
        Ok(*self)
    }
}

impl<S, D> Confidence for ArrayBase<S, D>
where
    S: Data,
    S::Elem: Copy + Into<f64>,
    D: Dimension,
{
    fn scalar(&self) -> Result<f64, ClassifierError> {
        single_value(self.iter().map(|&value| value.into()))
    }
}

impl<A: Copy + Into<f64>> Confidence for [A] {
    fn scalar(&self) -> Result<f64, ClassifierError> {
        single_value(self.iter().map(|&value| value.into()))
    }
}

impl<A: Copy + Into<f64>> Confidence for Vec<A> {
    fn scalar(&self) -> Result<f64, ClassifierError> {
        self.as_slice().scalar()
    }
}

impl<T: Confidence + ?Sized> Confidence for &T {
    fn scalar(&self) -> Result<f64, ClassifierError> {
        (**self).scalar()
    }
}

fn single_value<I: Iterator<Item = f64>>(mut values: I) -> Result<f64, ClassifierError> {
    match (values.next(), values.next()) {
        (Some(value), None) => Ok(value),
        (None, _) => Err(ClassifierError::ValidationError(
            "Confidence container is empty".into(),
        )),
        (Some(_), Some(_)) => Err(ClassifierError::ValidationError(format!(
            "Expected a single confidence value, got {}",
            2 + values.count()
        ))),
    }
}

/// A label as produced by a classifier: a bare string or a ranked list of
/// which only the first entry counts.
pub trait RawLabel {
    /// The top-ranked label, if there is one.
    fn top_label(&self) -> Option<&str>;
}

impl RawLabel for str {
    fn top_label(&self) -> Option<&str> {
        Some(self)
    }
}

impl RawLabel for String {
    fn top_label(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<S: AsRef<str>> RawLabel for [S] {
    fn top_label(&self) -> Option<&str> {
        self.first().map(|label| label.as_ref())
    }
}

impl<S: AsRef<str>, const N: usize> RawLabel for [S; N] {
    fn top_label(&self) -> Option<&str> {
        self.first().map(|label| label.as_ref())
    }
}

impl<S: AsRef<str>> RawLabel for Vec<S> {
    fn top_label(&self) -> Option<&str> {
        self.as_slice().top_label()
    }
}

impl<T: RawLabel + ?Sized> RawLabel for &T {
    fn top_label(&self) -> Option<&str> {
        (**self).top_label()
    }
}

/// Removes every occurrence of the classifier prefix from a raw label.
pub fn strip_label(raw: &str) -> String {
    raw.replace(LABEL_PREFIX, "")
}

// strict `<` rejects; equal to the threshold is accepted, NaN never is
fn clears(score: f64, threshold: f64) -> bool {
    matches!(
        score.partial_cmp(&threshold),
        Some(Ordering::Greater | Ordering::Equal)
    )
}

fn to_language<L: RawLabel + ?Sized>(
    label: &L,
    score: f64,
    threshold: f64,
) -> Result<Language, ClassifierError> {
    if !clears(score, threshold) {
        return Ok(Language::Unknown);
    }
    let raw = label
        .top_label()
        .ok_or_else(|| ClassifierError::ValidationError("Prediction has no label".into()))?;
    Ok(Language::detected(strip_label(raw), score))
}

/// Converts one `(label, confidence)` prediction.
///
/// Returns [`Language::Unknown`] when the confidence is below `threshold`.
///
/// # Example
/// ```
/// use luga::{normalize_one, Language};
/// use ndarray::array;
///
/// let language = normalize_one(&("__label__en", array![0.9827f32]), 0.5)?;
/// assert_eq!(language.name(), "en");
///
/// let language = normalize_one(&("__label__xx", array![0.12f32]), 0.5)?;
/// assert_eq!(language, Language::Unknown);
/// # Ok::<(), luga::ClassifierError>(())
/// ```
pub fn normalize_one<L, C>(prediction: &(L, C), threshold: f64) -> Result<Language, ClassifierError>
where
    L: RawLabel,
    C: Confidence,
{
    let (label, confidence) = prediction;
    to_language(label, confidence.scalar()?, threshold)
}

/// Converts parallel label and confidence sequences, one [`Language`] per
/// pair, in input order.
pub fn normalize_languages<L, C>(
    labels: &[L],
    confidences: &[C],
    threshold: f64,
) -> Result<Vec<Language>, ClassifierError>
where
    L: RawLabel,
    C: Confidence,
{
    if labels.len() != confidences.len() {
        return Err(ClassifierError::LengthMismatch {
            labels: labels.len(),
            confidences: confidences.len(),
        });
    }

    labels
        .iter()
        .zip(confidences)
        .map(|(label, confidence)| to_language(label, confidence.scalar()?, threshold))
        .collect()
}

/// Threshold and output shape for [`normalize_many`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub threshold: f64,
    /// Keep only the language codes.
    pub only_language: bool,
    /// Return an [`ndarray::Array1`] instead of a `Vec`.
    pub to_array: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            only_language: false,
            to_array: false,
        }
    }
}

impl BatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_only_language(mut self, only_language: bool) -> Self {
        self.only_language = only_language;
        self
    }

    pub fn with_to_array(mut self, to_array: bool) -> Self {
        self.to_array = to_array;
        self
    }
}

/// Result of [`normalize_many`], shaped by [`BatchOptions`].
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutput {
    /// Neither flag set.
    Languages(Vec<Language>),
    /// `only_language`.
    Names(Vec<String>),
    /// `to_array`.
    LanguageArray(Array1<Language>),
    /// `only_language` and `to_array`.
    NameArray(Array1<String>),
}

impl BatchOutput {
    fn project(languages: Vec<Language>, options: BatchOptions) -> Self {
        match (options.only_language, options.to_array) {
            (false, false) => Self::Languages(languages),
            (false, true) => Self::LanguageArray(Array1::from_vec(languages)),
            (true, to_array) => {
                let names: Vec<String> = languages.into_iter().map(Language::into_name).collect();
                if to_array {
                    Self::NameArray(Array1::from_vec(names))
                } else {
                    Self::Names(names)
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Languages(languages) => languages.len(),
            Self::Names(names) => names.len(),
            Self::LanguageArray(languages) => languages.len(),
            Self::NameArray(names) => names.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Language codes in input order, whatever the shape.
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Languages(languages) => languages.iter().map(Language::name).collect(),
            Self::LanguageArray(languages) => languages.iter().map(Language::name).collect(),
            Self::Names(names) => names.iter().map(String::as_str).collect(),
            Self::NameArray(names) => names.iter().map(String::as_str).collect(),
        }
    }

    /// The full [`Language`] values; `None` when scores were projected away.
    pub fn into_languages(self) -> Option<Vec<Language>> {
        match self {
            Self::Languages(languages) => Some(languages),
            Self::LanguageArray(languages) => Some(languages.to_vec()),
            Self::Names(_) | Self::NameArray(_) => None,
        }
    }

    pub fn into_names(self) -> Vec<String> {
        match self {
            Self::Languages(languages) => languages.into_iter().map(Language::into_name).collect(),
            Self::LanguageArray(languages) => {
                languages.iter().map(|language| language.name().to_string()).collect()
            }
            Self::Names(names) => names,
            Self::NameArray(names) => names.to_vec(),
        }
    }
}

/// Converts a batch of predictions and shapes the output.
///
/// # Example
/// ```
/// use luga::{normalize_many, BatchOptions};
/// use ndarray::array;
///
/// let labels = vec![vec!["__label__da"], vec!["__label__en"]];
/// let confidences = vec![array![0.998f32], array![0.12f32]];
/// let output = normalize_many(
///     &labels,
///     &confidences,
///     BatchOptions::new().with_only_language(true),
/// )?;
/// assert_eq!(output.into_names(), vec!["da", "unknown"]);
/// # Ok::<(), luga::ClassifierError>(())
/// ```
pub fn normalize_many<L, C>(
    labels: &[L],
    confidences: &[C],
    options: BatchOptions,
) -> Result<BatchOutput, ClassifierError>
where
    L: RawLabel,
    C: Confidence,
{
    let languages = normalize_languages(labels, confidences, options.threshold)?;
    Ok(BatchOutput::project(languages, options))
}

/// Parses one line of fastText `predict-prob` output such as
/// `__label__en 0.98237`. Only the first label/probability pair is kept.
pub fn parse_prediction_line(line: &str) -> Result<(String, f64), ClassifierError> {
    let mut parts = line.split_whitespace();
    let label = parts
        .next()
        .ok_or_else(|| ClassifierError::ValidationError("Empty prediction line".into()))?;
    let raw = parts.next().ok_or_else(|| {
        ClassifierError::ValidationError(format!("Missing probability in {:?}", line))
    })?;
    let score = raw
        .parse::<f64>()
        .map_err(|_| ClassifierError::ValidationError(format!("Invalid probability {:?}", raw)))?;
    Ok((label.to_string(), score))
}
