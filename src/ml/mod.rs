//! Machine learning for review rating prediction.
//!
//! Review text is turned into term-count vectors by a [`CountVectorizer`] and
//! classified by a multinomial [`LogisticRegression`]. [`RatingPredictor`]
//! pairs the two, and [`evaluation`] measures a predictor on held-out data.

pub mod classifier;
pub mod evaluation;
pub mod feature;
pub mod label;
pub mod pipeline;
pub mod vectorizer;

pub use classifier::{ClassifierConfig, LogisticRegression, TrainingStats};
pub use evaluation::{EvaluationReport, LabelStats, evaluate, holdout_split};
pub use feature::{FeatureSpace, FeatureVector, ensure_same_space};
pub use label::RatingLabel;
pub use pipeline::RatingPredictor;
pub use vectorizer::{CountVectorizer, StopWords, VectorizerConfig, Vocabulary};
