//! Error types for the rater library.
//!
//! All errors are represented by the [`RaterError`] enum. The core components
//! (vectorizer, classifier, predictor) only ever return these values to their
//! caller; turning them into a user-visible message and an exit status is the
//! job of the command layer.
//!
//! # Examples
//!
//! ```
//! use rater::error::{RaterError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(RaterError::not_fitted("CountVectorizer"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for rater operations.
#[derive(Error, Debug)]
pub enum RaterError {
    /// I/O errors (reading the corpus, reading or writing artifacts)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read operation was invoked on a component that has not been fitted,
    /// or a loaded artifact does not hold a usable fitted component.
    #[error("Not fitted: {0}")]
    NotFitted(String),

    /// The training corpus yielded no usable tokens.
    #[error("Empty corpus: {0}")]
    EmptyCorpus(String),

    /// The training data cannot support a classifier (e.g. a single label).
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Feature-space or sample-count disagreement.
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Corpus loading errors (missing columns, malformed rows)
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// Artifact encoding/decoding errors
    #[error("Artifact error: {0}")]
    Artifact(String),

    /// Invalid configuration values
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Bad command-line usage
    #[error("{0}")]
    Usage(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

}

/// Result type alias for operations that may fail with RaterError.
pub type Result<T> = std::result::Result<T, RaterError>;

impl RaterError {
    /// Create a new not-fitted error naming the component.
    pub fn not_fitted<S: Into<String>>(component: S) -> Self {
        RaterError::NotFitted(format!("{} has not been fitted", component.into()))
    }

    /// Create a new empty corpus error.
    pub fn empty_corpus<S: Into<String>>(msg: S) -> Self {
        RaterError::EmptyCorpus(msg.into())
    }

    /// Create a new insufficient data error.
    pub fn insufficient_data<S: Into<String>>(msg: S) -> Self {
        RaterError::InsufficientData(msg.into())
    }

    /// Create a new dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, found: usize) -> Self {
        RaterError::DimensionMismatch { expected, found }
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        RaterError::Analysis(msg.into())
    }

    /// Create a new corpus error.
    pub fn corpus<S: Into<String>>(msg: S) -> Self {
        RaterError::Corpus(msg.into())
    }

    /// Create a new artifact error.
    pub fn artifact<S: Into<String>>(msg: S) -> Self {
        RaterError::Artifact(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        RaterError::Config(msg.into())
    }

    /// Create a new usage error.
    pub fn usage<S: Into<String>>(msg: S) -> Self {
        RaterError::Usage(msg.into())
    }

    /// Whether this error reports bad command-line usage.
    pub fn is_usage(&self) -> bool {
        matches!(self, RaterError::Usage(_))
    }
}

impl From<csv::Error> for RaterError {
    fn from(err: csv::Error) -> Self {
        RaterError::Corpus(err.to_string())
    }
}

impl From<bincode::Error> for RaterError {
    fn from(err: bincode::Error) -> Self {
        RaterError::Artifact(err.to_string())
    }
}
