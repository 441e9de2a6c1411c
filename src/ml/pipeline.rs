//! Text-to-rating prediction pipeline.
//!
//! [`RatingPredictor`] owns a fitted [`CountVectorizer`] and a fitted
//! [`LogisticRegression`] that agree on the feature space. Construction is the
//! only place the pairing is checked; afterwards every prediction is a pure read.

use crate::error::{RaterError, Result};
use crate::ml::classifier::{ClassifierConfig, LogisticRegression, TrainingStats};
use crate::ml::feature::{FeatureSpace, ensure_same_space};
use crate::ml::label::RatingLabel;
use crate::ml::vectorizer::{CountVectorizer, VectorizerConfig};

/// A fitted vectorizer and classifier, checked to share one feature space.
#[derive(Debug, Clone)]
pub struct RatingPredictor {
    vectorizer: CountVectorizer,
    classifier: LogisticRegression,
}

impl RatingPredictor {
    /// Pair already-fitted components.
    ///
    /// Fails with [`RaterError::NotFitted`] if either component is unfit and
    /// with [`RaterError::DimensionMismatch`] if their widths differ.
    pub fn new(vectorizer: CountVectorizer, classifier: LogisticRegression) -> Result<Self> {
        ensure_same_space(&vectorizer, &classifier)?;
        Ok(RatingPredictor {
            vectorizer,
            classifier,
        })
    }

    /// Train fresh components on parallel `texts` / `labels`.
    pub fn train<S: AsRef<str>>(
        texts: &[S],
        labels: &[RatingLabel],
        vectorizer_config: &VectorizerConfig,
        classifier_config: &ClassifierConfig,
    ) -> Result<Self> {
        if texts.len() != labels.len() {
            return Err(RaterError::dimension_mismatch(texts.len(), labels.len()));
        }

        let mut vectorizer = CountVectorizer::new(vectorizer_config.clone())?;
        let features = vectorizer.fit_transform(texts)?;

        let mut classifier = LogisticRegression::new(classifier_config.clone())?;
        classifier.fit(&features, labels)?;

        Self::new(vectorizer, classifier)
    }

    /// Predict the rating of one review.
    pub fn predict(&self, text: &str) -> Result<RatingLabel> {
        let features = self.vectorizer.transform(text)?;
        self.classifier.predict(&features)
    }

    /// Predict the ratings of several reviews.
    pub fn predict_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<RatingLabel>> {
        texts.iter().map(|text| self.predict(text.as_ref())).collect()
    }

    /// Labels this predictor can return.
    pub fn labels(&self) -> &[RatingLabel] {
        // Construction guarantees a fitted classifier.
        self.classifier.classes().unwrap_or(&[])
    }

    /// Statistics of the classifier's training run, when it was trained in
    /// this process or persisted with them.
    pub fn training_stats(&self) -> Option<&TrainingStats> {
        self.classifier.training_stats()
    }

    /// The vectorizer.
    pub fn vectorizer(&self) -> &CountVectorizer {
        &self.vectorizer
    }

    /// The classifier.
    pub fn classifier(&self) -> &LogisticRegression {
        &self.classifier
    }

    /// Split into the two components.
    pub fn into_parts(self) -> (CountVectorizer, LogisticRegression) {
        (self.vectorizer, self.classifier)
    }
}

impl FeatureSpace for RatingPredictor {
    fn dimension(&self) -> Result<usize> {
        self.vectorizer.dimension()
    }
}
