//! Rating labels.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A categorical rating as it appears in the training corpus.
///
/// Labels keep their original text (trimmed) so that a prediction prints
/// exactly what the corpus contained. They are totally ordered so that
/// classifier ties resolve the same way on every run:
///
/// - labels that parse as finite numbers sort numerically, and before any
///   non-numeric label;
/// - non-numeric labels sort lexicographically;
/// - numerically equal labels (`"5"`, `"5.0"`) fall back to text order.
///
/// ```
/// use rater::ml::label::RatingLabel;
///
/// let mut labels = vec![
///     RatingLabel::new("10"),
///     RatingLabel::new("good"),
///     RatingLabel::new("2"),
/// ];
/// labels.sort();
/// assert_eq!(labels, vec![
///     RatingLabel::new("2"),
///     RatingLabel::new("10"),
///     RatingLabel::new("good"),
/// ]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingLabel(String);

impl RatingLabel {
    /// Create a label from its text, trimming surrounding whitespace.
    pub fn new<S: AsRef<str>>(text: S) -> Self {
        RatingLabel(text.as_ref().trim().to_string())
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value of the label, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        self.0.parse::<f64>().ok().filter(|value| value.is_finite())
    }

    /// Whether the label text is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Ord for RatingLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a
                .partial_cmp(&b)
                .unwrap_or(Ordering::Equal)
                .then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for RatingLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RatingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RatingLabel {
    fn from(text: &str) -> Self {
        RatingLabel::new(text)
    }
}

impl From<String> for RatingLabel {
    fn from(text: String) -> Self {
        RatingLabel::new(text)
    }
}

impl From<i64> for RatingLabel {
    fn from(value: i64) -> Self {
        RatingLabel(value.to_string())
    }
}
