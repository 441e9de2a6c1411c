//! Holdout splitting and accuracy evaluation.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::corpus::Corpus;
use crate::error::{RaterError, Result};
use crate::ml::label::RatingLabel;
use crate::ml::pipeline::RatingPredictor;

/// Split a corpus into `(train, test)` parts.
///
/// Records are shuffled with a generator seeded by `seed`, so the same corpus
/// and seed always give the same split. The test part receives
/// `round(len * test_ratio)` records, clamped so neither part is empty.
pub fn holdout_split(corpus: &Corpus, test_ratio: f64, seed: u64) -> Result<(Corpus, Corpus)> {
    if !(test_ratio > 0.0 && test_ratio < 1.0) {
        return Err(RaterError::invalid_config(format!(
            "holdout ratio must be between 0 and 1 (exclusive), got {test_ratio}"
        )));
    }
    if corpus.len() < 2 {
        return Err(RaterError::insufficient_data(format!(
            "holdout split needs at least 2 records, got {}",
            corpus.len()
        )));
    }

    let mut indices: Vec<usize> = (0..corpus.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = (corpus.len() as f64 * test_ratio).round() as usize;
    let test_len = test_len.clamp(1, corpus.len() - 1);
    let (test, train) = indices.split_at(test_len);

    Ok((corpus.subset(train), corpus.subset(test)))
}

/// Per-label counts of an evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelStats {
    /// Records whose true label is this one.
    pub support: usize,
    /// Of those, how many were predicted correctly.
    pub correct: usize,
    /// Records predicted as this label.
    pub predicted: usize,
}

impl LabelStats {
    /// Fraction of predictions of this label that were right.
    pub fn precision(&self) -> f64 {
        ratio(self.correct, self.predicted)
    }

    /// Fraction of records with this label that were found.
    pub fn recall(&self) -> f64 {
        ratio(self.correct, self.support)
    }
}

/// Result of evaluating a predictor on labeled reviews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub total: usize,
    pub correct: usize,
    pub accuracy: f64,
    pub per_label: BTreeMap<RatingLabel, LabelStats>,
    /// `confusion[actual][predicted]` counts.
    pub confusion: BTreeMap<RatingLabel, BTreeMap<RatingLabel, usize>>,
}

/// Evaluate `predictor` on parallel `texts` / `labels`.
pub fn evaluate<S: AsRef<str>>(
    predictor: &RatingPredictor,
    texts: &[S],
    labels: &[RatingLabel],
) -> Result<EvaluationReport> {
    if texts.len() != labels.len() {
        return Err(RaterError::dimension_mismatch(texts.len(), labels.len()));
    }
    if texts.is_empty() {
        return Err(RaterError::insufficient_data(
            "evaluation needs at least one labeled review",
        ));
    }

    let predictions = predictor.predict_batch(texts)?;

    let mut report = EvaluationReport {
        total: labels.len(),
        ..EvaluationReport::default()
    };
    for (actual, predicted) in labels.iter().zip(predictions) {
        let hit = *actual == predicted;
        if hit {
            report.correct += 1;
        }

        let stats = report.per_label.entry(actual.clone()).or_default();
        stats.support += 1;
        if hit {
            stats.correct += 1;
        }
        report.per_label.entry(predicted.clone()).or_default().predicted += 1;

        *report
            .confusion
            .entry(actual.clone())
            .or_default()
            .entry(predicted)
            .or_default() += 1;
    }
    report.accuracy = ratio(report.correct, report.total);

    log::info!(
        "Evaluated {} reviews: accuracy {:.4}",
        report.total,
        report.accuracy
    );
    Ok(report)
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
