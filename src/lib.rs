//! # Rater
//!
//! Predicts a categorical rating for a free-text faculty review.
//!
//! ## Features
//!
//! - Bag-of-words [`CountVectorizer`] built on a pluggable analysis pipeline
//! - Multinomial [`LogisticRegression`] with deterministic training
//! - [`RatingPredictor`] pairing the two with a checked feature space
//! - CSV corpus loading, holdout evaluation and on-disk artifacts
//!
//! ```
//! use rater::{ClassifierConfig, RatingLabel, RatingPredictor, VectorizerConfig};
//!
//! let predictor = RatingPredictor::train(
//!     &["Great teacher, very clear", "Terrible, never available", "Okay but slow to reply"],
//!     &[RatingLabel::from(5), RatingLabel::from(1), RatingLabel::from(3)],
//!     &VectorizerConfig::default(),
//!     &ClassifierConfig::default(),
//! )
//! .unwrap();
//!
//! assert_eq!(predictor.predict("very clear and great").unwrap(), RatingLabel::from(5));
//! ```

pub mod analysis;
pub mod artifact;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod ml;

pub use artifact::ArtifactStore;
pub use config::RaterConfig;
pub use corpus::{Corpus, CorpusConfig};
pub use error::{RaterError, Result};
pub use ml::{
    ClassifierConfig, CountVectorizer, FeatureSpace, FeatureVector, LogisticRegression,
    RatingLabel, RatingPredictor, VectorizerConfig,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
