//! Output formatting for CLI commands.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::cli::args::{OutputFormat, RaterArgs};
use crate::error::Result;
use crate::ml::evaluation::EvaluationReport;
use crate::ml::label::RatingLabel;

/// Result structure for training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub corpus: String,
    pub samples: usize,
    pub labels: Vec<RatingLabel>,
    pub vocabulary_size: usize,
    pub iterations: usize,
    pub converged: bool,
    pub final_loss: f64,
    pub model_dir: String,
    /// Accuracy on the held-out part, when one was requested.
    pub holdout: Option<EvaluationReport>,
}

/// Result structure for a single prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub rating: RatingLabel,
}

/// Result structure for the sample check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    pub text: String,
    pub rating: RatingLabel,
}

/// Result structure for evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub corpus: String,
    #[serde(flatten)]
    pub report: EvaluationReport,
}

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    /// Render for a terminal. `verbosity` follows [`RaterArgs::verbosity`].
    fn render_human(&self, verbosity: u8) -> String;
}

impl HumanOutput for TrainingSummary {
    fn render_human(&self, verbosity: u8) -> String {
        let mut out = String::from("Training complete. Model saved!");
        if let Some(report) = &self.holdout {
            let _ = write!(
                out,
                "\nHoldout accuracy: {:.4} ({}/{})",
                report.accuracy, report.correct, report.total
            );
        }
        if verbosity >= 2 {
            let labels: Vec<&str> = self.labels.iter().map(RatingLabel::as_str).collect();
            let _ = write!(out, "\nCorpus: {} ({} reviews)", self.corpus, self.samples);
            let _ = write!(out, "\nLabels: {}", labels.join(", "));
            let _ = write!(out, "\nVocabulary: {} terms", self.vocabulary_size);
            let _ = write!(
                out,
                "\nIterations: {}{}",
                self.iterations,
                if self.converged { "" } else { " (not converged)" }
            );
            let _ = write!(out, "\nFinal loss: {:.6}", self.final_loss);
            let _ = write!(out, "\nArtifacts: {}", self.model_dir);
        }
        out
    }
}

impl HumanOutput for PredictionResult {
    fn render_human(&self, _verbosity: u8) -> String {
        self.rating.to_string()
    }
}

impl HumanOutput for CheckResult {
    fn render_human(&self, verbosity: u8) -> String {
        if verbosity >= 2 {
            format!("Review: {}\nPredicted rating: {}", self.text, self.rating)
        } else {
            format!("Predicted rating: {}", self.rating)
        }
    }
}

impl HumanOutput for EvaluationResult {
    fn render_human(&self, verbosity: u8) -> String {
        let report = &self.report;
        let mut out = format!(
            "Evaluated {} reviews from {}\nAccuracy: {:.4} ({}/{})",
            report.total, self.corpus, report.accuracy, report.correct, report.total
        );

        out.push_str("\n\nLabel     Support  Precision  Recall");
        for (label, stats) in &report.per_label {
            let _ = write!(
                out,
                "\n{:<9} {:>7}  {:>9.4}  {:>6.4}",
                label.as_str(),
                stats.support,
                stats.precision(),
                stats.recall()
            );
        }

        if verbosity >= 2 {
            let labels: Vec<&RatingLabel> = report.per_label.keys().collect();
            out.push_str("\n\nConfusion (rows: actual, columns: predicted)\n         ");
            for label in &labels {
                let _ = write!(out, " {:>6}", label.as_str());
            }
            for actual in &labels {
                let _ = write!(out, "\n{:<9}", actual.as_str());
                for predicted in &labels {
                    let count = report
                        .confusion
                        .get(*actual)
                        .and_then(|row| row.get(*predicted))
                        .copied()
                        .unwrap_or(0);
                    let _ = write!(out, " {count:>6}");
                }
            }
        }
        out
    }
}

/// Render a result in the requested format.
pub fn render_result<T: Serialize + HumanOutput>(
    result: &T,
    format: OutputFormat,
    pretty: bool,
    verbosity: u8,
) -> Result<String> {
    match format {
        OutputFormat::Human => Ok(result.render_human(verbosity)),
        OutputFormat::Json => {
            let json = if pretty {
                serde_json::to_string_pretty(result)?
            } else {
                serde_json::to_string(result)?
            };
            Ok(json)
        }
    }
}

/// Print a result to stdout in the format selected by `args`.
pub fn output_result<T: Serialize + HumanOutput>(result: &T, args: &RaterArgs) -> Result<()> {
    let rendered = render_result(result, args.output_format, args.pretty, args.verbosity())?;
    println!("{rendered}");
    Ok(())
}
