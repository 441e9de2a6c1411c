//! Multinomial logistic regression over count features.
//!
//! The model holds one weight row and one bias per rating class and predicts
//! the class with the highest linear score `w_k · x + b_k`.
//!
//! # Training
//!
//! [`LogisticRegression::fit`] minimises
//!
//! ```text
//! (1/N) Σ_i cross_entropy(softmax(W x_i + b), y_i)  +  ||W||² / (2 · C · N)
//! ```
//!
//! by full-batch gradient descent with Armijo backtracking, starting from all
//! zeros. The bias is not regularised. Training stops after `max_iter`
//! iterations or once the largest gradient component drops below `tolerance`.
//! There is no randomness anywhere, so the same inputs always produce the same
//! parameters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{RaterError, Result};
use crate::ml::feature::{FeatureSpace, FeatureVector};
use crate::ml::label::RatingLabel;

/// Sufficient-decrease constant of the Armijo condition.
const ARMIJO_C: f64 = 1e-4;

/// Smallest step tried before the line search gives up.
const MIN_STEP: f64 = 1e-12;

/// Configuration for [`LogisticRegression`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Iteration cap.
    pub max_iter: usize,
    /// Stop when the largest gradient component falls below this value.
    pub tolerance: f64,
    /// Inverse L2 regularisation strength (C); smaller is stronger.
    pub regularization: f64,
    /// First step size tried by the line search.
    pub initial_step: f64,
    /// Factor the step shrinks by on each rejected line-search trial.
    pub backtracking: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        ClassifierConfig {
            max_iter: 1000,
            tolerance: 1e-4,
            regularization: 1.0,
            initial_step: 1.0,
            backtracking: 0.5,
        }
    }
}

impl ClassifierConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_iter == 0 {
            return Err(RaterError::invalid_config("max_iter must be at least 1"));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(RaterError::invalid_config(
                "tolerance must be a non-negative number",
            ));
        }
        if !self.regularization.is_finite() || self.regularization <= 0.0 {
            return Err(RaterError::invalid_config(
                "regularization must be a positive number",
            ));
        }
        if !self.initial_step.is_finite() || self.initial_step <= 0.0 {
            return Err(RaterError::invalid_config(
                "initial_step must be a positive number",
            ));
        }
        if !(self.backtracking > 0.0 && self.backtracking < 1.0) {
            return Err(RaterError::invalid_config(
                "backtracking must lie strictly between 0 and 1",
            ));
        }
        Ok(())
    }
}

/// Summary of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Gradient steps taken.
    pub iterations: usize,
    /// Objective value at the returned parameters.
    pub final_loss: f64,
    /// Whether the gradient tolerance was reached before the cap.
    pub converged: bool,
    /// Number of training samples.
    pub n_samples: usize,
    /// Width of the feature space.
    pub n_features: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Parameters {
    classes: Vec<RatingLabel>,
    /// Row-major `classes.len() × n_features` weights.
    weights: Vec<f64>,
    biases: Vec<f64>,
    n_features: usize,
}

impl Parameters {
    fn zeros(classes: Vec<RatingLabel>, n_features: usize) -> Self {
        let n_classes = classes.len();
        Parameters {
            classes,
            weights: vec![0.0; n_classes * n_features],
            biases: vec![0.0; n_classes],
            n_features,
        }
    }

    fn row(&self, class: usize) -> &[f64] {
        &self.weights[class * self.n_features..(class + 1) * self.n_features]
    }

    fn scores(&self, x: &FeatureVector) -> Vec<f64> {
        (0..self.classes.len())
            .map(|k| x.dot(self.row(k)) + self.biases[k])
            .collect()
    }

    fn check(&self) -> Result<()> {
        let unique: BTreeSet<&RatingLabel> = self.classes.iter().collect();
        if self.classes.len() < 2 || unique.len() != self.classes.len() {
            return Err(RaterError::artifact(
                "classifier needs at least two distinct classes",
            ));
        }
        if self.classes.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(RaterError::artifact("classifier classes must be sorted"));
        }
        if self.biases.len() != self.classes.len() {
            return Err(RaterError::dimension_mismatch(
                self.classes.len(),
                self.biases.len(),
            ));
        }
        if self.weights.len() != self.classes.len() * self.n_features {
            return Err(RaterError::dimension_mismatch(
                self.classes.len() * self.n_features,
                self.weights.len(),
            ));
        }
        Ok(())
    }
}

/// Gradient of the objective, laid out like [`Parameters`].
struct Gradient {
    weights: Vec<f64>,
    biases: Vec<f64>,
}

impl Gradient {
    fn max_abs(&self) -> f64 {
        self.weights
            .iter()
            .chain(self.biases.iter())
            .fold(0.0_f64, |acc, g| acc.max(g.abs()))
    }

    fn squared_norm(&self) -> f64 {
        self.weights
            .iter()
            .chain(self.biases.iter())
            .map(|g| g * g)
            .sum()
    }
}

/// Training problem: features, class indices and the L2 coefficient.
struct Objective<'a> {
    x: &'a [FeatureVector],
    targets: Vec<usize>,
    lambda: f64,
}

impl Objective<'_> {
    fn loss(&self, params: &Parameters) -> f64 {
        let n = self.x.len() as f64;
        let data_loss: f64 = self
            .x
            .iter()
            .zip(&self.targets)
            .map(|(x, &target)| {
                let scores = params.scores(x);
                log_sum_exp(&scores) - scores[target]
            })
            .sum();
        let penalty: f64 = params.weights.iter().map(|w| w * w).sum();

        data_loss / n + 0.5 * self.lambda * penalty
    }

    fn gradient(&self, params: &Parameters) -> Gradient {
        let n = self.x.len() as f64;
        let d = params.n_features;
        let mut grad = Gradient {
            weights: params.weights.iter().map(|w| self.lambda * w).collect(),
            biases: vec![0.0; params.classes.len()],
        };

        for (x, &target) in self.x.iter().zip(&self.targets) {
            let probabilities = softmax(&params.scores(x));
            for (k, p) in probabilities.into_iter().enumerate() {
                let residual = (p - if k == target { 1.0 } else { 0.0 }) / n;
                grad.biases[k] += residual;
                for (j, value) in x.iter() {
                    grad.weights[k * d + j] += residual * value;
                }
            }
        }
        grad
    }

    fn step(params: &Parameters, grad: &Gradient, step: f64) -> Parameters {
        Parameters {
            classes: params.classes.clone(),
            weights: params
                .weights
                .iter()
                .zip(&grad.weights)
                .map(|(w, g)| w - step * g)
                .collect(),
            biases: params
                .biases
                .iter()
                .zip(&grad.biases)
                .map(|(b, g)| b - step * g)
                .collect(),
            n_features: params.n_features,
        }
    }
}

fn log_sum_exp(scores: &[f64]) -> f64 {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    max + scores.iter().map(|s| (s - max).exp()).sum::<f64>().ln()
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

/// Serialized form of a [`LogisticRegression`]; parameters are checked on load.
#[derive(Serialize, Deserialize)]
struct ClassifierState {
    config: ClassifierConfig,
    parameters: Option<Parameters>,
    stats: Option<TrainingStats>,
}

/// Multi-class linear classifier trained by maximum likelihood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClassifierState", into = "ClassifierState")]
pub struct LogisticRegression {
    config: ClassifierConfig,
    parameters: Option<Parameters>,
    stats: Option<TrainingStats>,
}

impl LogisticRegression {
    /// Create an unfitted classifier from a configuration.
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        config.validate()?;
        Ok(LogisticRegression {
            config,
            parameters: None,
            stats: None,
        })
    }

    /// Create an unfitted classifier with the default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ClassifierConfig::default())
    }

    /// The configuration this classifier was built with.
    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Whether [`fit`](Self::fit) has succeeded.
    pub fn is_fitted(&self) -> bool {
        self.parameters.is_some()
    }

    fn parameters(&self) -> Result<&Parameters> {
        self.parameters
            .as_ref()
            .ok_or_else(|| RaterError::not_fitted("LogisticRegression"))
    }

    /// Labels the classifier can predict, in ascending order.
    pub fn classes(&self) -> Result<&[RatingLabel]> {
        Ok(&self.parameters()?.classes)
    }

    /// Statistics of the last successful fit.
    pub fn training_stats(&self) -> Option<&TrainingStats> {
        self.stats.as_ref()
    }

    /// Bias of every class, paired with its label.
    pub fn intercepts(&self) -> Result<Vec<(RatingLabel, f64)>> {
        let params = self.parameters()?;
        Ok(params
            .classes
            .iter()
            .cloned()
            .zip(params.biases.iter().copied())
            .collect())
    }

    /// Fit the model.
    ///
    /// `x` and `y` must have the same, non-zero length, every vector must have
    /// the same dimension, and `y` must contain at least two distinct labels.
    pub fn fit(&mut self, x: &[FeatureVector], y: &[RatingLabel]) -> Result<&TrainingStats> {
        if x.len() != y.len() {
            return Err(RaterError::dimension_mismatch(x.len(), y.len()));
        }
        let n_features = match x.first() {
            Some(first) => first.len(),
            None => {
                return Err(RaterError::insufficient_data(
                    "cannot fit a classifier on zero samples",
                ));
            }
        };
        if let Some(bad) = x.iter().find(|v| v.len() != n_features) {
            return Err(RaterError::dimension_mismatch(n_features, bad.len()));
        }

        let classes: Vec<RatingLabel> = y
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if classes.len() < 2 {
            return Err(RaterError::insufficient_data(format!(
                "need at least 2 distinct labels, found {}",
                classes.len()
            )));
        }

        let targets = y
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();
        let objective = Objective {
            x,
            targets,
            lambda: 1.0 / (self.config.regularization * x.len() as f64),
        };

        let mut params = Parameters::zeros(classes, n_features);
        let mut loss = objective.loss(&params);
        let mut grad = objective.gradient(&params);
        let mut step = self.config.initial_step;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.config.max_iter {
            if grad.max_abs() < self.config.tolerance {
                converged = true;
                break;
            }

            let decrease = ARMIJO_C * grad.squared_norm();
            let accepted = loop {
                let candidate = Objective::step(&params, &grad, step);
                let candidate_loss = objective.loss(&candidate);
                if candidate_loss <= loss - step * decrease {
                    break Some((candidate, candidate_loss));
                }
                step *= self.config.backtracking;
                if step < MIN_STEP {
                    break None;
                }
            };

            let Some((candidate, candidate_loss)) = accepted else {
                log::debug!("Line search stalled at iteration {iterations}, loss {loss:.6}");
                break;
            };

            params = candidate;
            loss = candidate_loss;
            grad = objective.gradient(&params);
            iterations += 1;
            // Let the step grow back after a successful trial.
            step = (step / self.config.backtracking).min(self.config.initial_step);

            if iterations % 100 == 0 {
                log::debug!("Iteration {iterations}: loss {loss:.6}");
            }
        }
        if !converged && grad.max_abs() < self.config.tolerance {
            converged = true;
        }

        log::info!(
            "Fitted {} classes over {} features from {} samples in {} iterations, loss {:.6}{}",
            params.classes.len(),
            n_features,
            x.len(),
            iterations,
            loss,
            if converged { "" } else { " (not converged)" }
        );

        self.parameters = Some(params);
        Ok(&*self.stats.insert(TrainingStats {
            iterations,
            final_loss: loss,
            converged,
            n_samples: x.len(),
            n_features,
        }))
    }

    fn checked_parameters(&self, x: &FeatureVector) -> Result<&Parameters> {
        let params = self.parameters()?;
        if x.len() != params.n_features {
            return Err(RaterError::dimension_mismatch(params.n_features, x.len()));
        }
        Ok(params)
    }

    /// Raw per-class scores, in ascending label order.
    pub fn decision_function(&self, x: &FeatureVector) -> Result<Vec<(RatingLabel, f64)>> {
        let params = self.checked_parameters(x)?;
        Ok(params
            .classes
            .iter()
            .cloned()
            .zip(params.scores(x))
            .collect())
    }

    /// Predict the label with the highest score.
    ///
    /// Equal scores resolve to the lowest label in [`RatingLabel`] order.
    pub fn predict(&self, x: &FeatureVector) -> Result<RatingLabel> {
        let params = self.checked_parameters(x)?;
        let scores = params.scores(x);

        let mut best = 0;
        for (k, score) in scores.iter().enumerate().skip(1) {
            if *score > scores[best] {
                best = k;
            }
        }
        Ok(params.classes[best].clone())
    }

    /// Predict a batch of vectors.
    pub fn predict_batch(&self, x: &[FeatureVector]) -> Result<Vec<RatingLabel>> {
        x.iter().map(|v| self.predict(v)).collect()
    }
}

impl FeatureSpace for LogisticRegression {
    fn dimension(&self) -> Result<usize> {
        Ok(self.parameters()?.n_features)
    }
}

impl TryFrom<ClassifierState> for LogisticRegression {
    type Error = RaterError;

    fn try_from(state: ClassifierState) -> Result<Self> {
        state.config.validate()?;
        if let Some(params) = &state.parameters {
            params.check()?;
        }
        Ok(LogisticRegression {
            config: state.config,
            parameters: state.parameters,
            stats: state.stats,
        })
    }
}

impl From<LogisticRegression> for ClassifierState {
    fn from(classifier: LogisticRegression) -> Self {
        ClassifierState {
            config: classifier.config,
            parameters: classifier.parameters,
            stats: classifier.stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[i64]) -> Vec<RatingLabel> {
        values.iter().map(|&v| RatingLabel::from(v)).collect()
    }

    fn toy_problem() -> (Vec<FeatureVector>, Vec<RatingLabel>) {
        let x = vec![
            FeatureVector::from_dense(&[2.0, 0.0, 0.0]),
            FeatureVector::from_dense(&[1.0, 0.0, 0.0]),
            FeatureVector::from_dense(&[0.0, 2.0, 0.0]),
            FeatureVector::from_dense(&[0.0, 1.0, 0.0]),
            FeatureVector::from_dense(&[0.0, 0.0, 3.0]),
        ];
        (x, labels(&[5, 5, 1, 1, 3]))
    }

    #[test]
    fn test_fit_and_predict() {
        let (x, y) = toy_problem();
        let mut classifier = LogisticRegression::with_defaults().unwrap();
        let stats = classifier.fit(&x, &y).unwrap().clone();

        assert_eq!(stats.n_samples, 5);
        assert_eq!(stats.n_features, 3);
        assert!(stats.iterations > 0);
        assert!(stats.final_loss.is_finite());

        let expected = labels(&[1, 3, 5]);
        assert_eq!(classifier.classes().unwrap(), expected.as_slice());

        let predict = |dense: &[f64]| {
            classifier
                .predict(&FeatureVector::from_dense(dense))
                .unwrap()
        };
        assert_eq!(predict(&[1.0, 0.0, 0.0]), RatingLabel::from(5));
        assert_eq!(predict(&[0.0, 1.0, 0.0]), RatingLabel::from(1));
        assert_eq!(predict(&[0.0, 0.0, 3.0]), RatingLabel::from(3));
    }

    #[test]
    fn test_with_defaults_is_unfitted() {
        let classifier = LogisticRegression::with_defaults().unwrap();
        assert!(!classifier.is_fitted());
        assert!(classifier.training_stats().is_none());
        assert_eq!(classifier.config(), &ClassifierConfig::default());
    }

    #[test]
    fn test_training_reduces_loss() {
        let (x, y) = toy_problem();
        let mut classifier = LogisticRegression::with_defaults().unwrap();
        let stats = classifier.fit(&x, &y).unwrap();

        // Loss at the zero initialisation is ln(3).
        assert!(stats.final_loss < 3.0_f64.ln());
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = toy_problem();
        let mut a = LogisticRegression::with_defaults().unwrap();
        let mut b = LogisticRegression::with_defaults().unwrap();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_iteration_cap() {
        let (x, y) = toy_problem();
        let config = ClassifierConfig {
            max_iter: 3,
            tolerance: 0.0,
            ..ClassifierConfig::default()
        };
        let mut classifier = LogisticRegression::new(config).unwrap();
        let stats = classifier.fit(&x, &y).unwrap();

        assert!(stats.iterations <= 3);
        assert!(!stats.converged);
    }

    #[test]
    fn test_single_label_is_insufficient() {
        let x = vec![
            FeatureVector::from_dense(&[1.0, 0.0]),
            FeatureVector::from_dense(&[0.0, 1.0]),
        ];
        let mut classifier = LogisticRegression::with_defaults().unwrap();
        assert!(matches!(
            classifier.fit(&x, &labels(&[4, 4])),
            Err(RaterError::InsufficientData(_))
        ));
        assert!(matches!(
            classifier.fit(&[], &[]),
            Err(RaterError::InsufficientData(_))
        ));
        assert!(!classifier.is_fitted());
    }

    #[test]
    fn test_dimension_mismatches() {
        let mut classifier = LogisticRegression::with_defaults().unwrap();

        let x = vec![FeatureVector::from_dense(&[1.0, 0.0])];
        assert!(matches!(
            classifier.fit(&x, &labels(&[1, 2])),
            Err(RaterError::DimensionMismatch {
                expected: 1,
                found: 2
            })
        ));

        let x = vec![
            FeatureVector::from_dense(&[1.0, 0.0]),
            FeatureVector::from_dense(&[1.0, 0.0, 0.0]),
        ];
        assert!(matches!(
            classifier.fit(&x, &labels(&[1, 2])),
            Err(RaterError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        ));

        let (x, y) = toy_problem();
        classifier.fit(&x, &y).unwrap();
        assert!(matches!(
            classifier.predict(&FeatureVector::zeros(4)),
            Err(RaterError::DimensionMismatch {
                expected: 3,
                found: 4
            })
        ));
    }

    #[test]
    fn test_predict_before_fit() {
        let classifier = LogisticRegression::with_defaults().unwrap();
        assert!(matches!(
            classifier.predict(&FeatureVector::zeros(3)),
            Err(RaterError::NotFitted(_))
        ));
        assert!(matches!(classifier.classes(), Err(RaterError::NotFitted(_))));
        assert!(matches!(classifier.dimension(), Err(RaterError::NotFitted(_))));
    }

    #[test]
    fn test_tie_breaks_to_lowest_label() {
        // Mirror-image classes: the zero vector scores both identically.
        let x = vec![
            FeatureVector::from_dense(&[1.0, 0.0]),
            FeatureVector::from_dense(&[0.0, 1.0]),
        ];
        let y = vec![RatingLabel::new("good"), RatingLabel::new("bad")];
        let mut classifier = LogisticRegression::with_defaults().unwrap();
        classifier.fit(&x, &y).unwrap();

        let scores = classifier.decision_function(&FeatureVector::zeros(2)).unwrap();
        assert_eq!(scores[0].1, scores[1].1);
        assert_eq!(
            classifier.predict(&FeatureVector::zeros(2)).unwrap(),
            RatingLabel::new("bad")
        );
    }

    #[test]
    fn test_zero_vector_follows_intercepts() {
        let x = vec![
            FeatureVector::from_dense(&[1.0, 0.0, 0.0, 0.0]),
            FeatureVector::from_dense(&[0.0, 1.0, 0.0, 0.0]),
            FeatureVector::from_dense(&[0.0, 0.0, 1.0, 0.0]),
            FeatureVector::from_dense(&[0.0, 0.0, 0.0, 1.0]),
        ];
        let y = labels(&[4, 4, 4, 2]);
        let mut classifier = LogisticRegression::with_defaults().unwrap();
        classifier.fit(&x, &y).unwrap();

        let intercepts = classifier.intercepts().unwrap();
        assert!(intercepts[1].1 > intercepts[0].1);
        assert_eq!(
            classifier.predict(&FeatureVector::zeros(4)).unwrap(),
            RatingLabel::from(4)
        );
    }

    #[test]
    fn test_serde_round_trip() {
        let (x, y) = toy_problem();
        let mut classifier = LogisticRegression::with_defaults().unwrap();
        classifier.fit(&x, &y).unwrap();

        let bytes = bincode::serialize(&classifier).unwrap();
        let restored: LogisticRegression = bincode::deserialize(&bytes).unwrap();

        assert_eq!(restored, classifier);
        for v in &x {
            assert_eq!(restored.predict(v).unwrap(), classifier.predict(v).unwrap());
        }
    }

    #[test]
    fn test_invalid_config() {
        for config in [
            ClassifierConfig {
                max_iter: 0,
                ..ClassifierConfig::default()
            },
            ClassifierConfig {
                regularization: 0.0,
                ..ClassifierConfig::default()
            },
            ClassifierConfig {
                backtracking: 1.0,
                ..ClassifierConfig::default()
            },
        ] {
            assert!(matches!(
                LogisticRegression::new(config),
                Err(RaterError::Config(_))
            ));
        }
    }
}
