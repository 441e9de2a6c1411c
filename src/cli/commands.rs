//! Command implementations for the rater CLI.
//!
//! Only this layer deals with paths and configuration files. Inference is done
//! by [`predict_text`], which takes an already loaded [`RatingPredictor`].

use crate::artifact::ArtifactStore;
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::RaterConfig;
use crate::corpus::Corpus;
use crate::error::{RaterError, Result};
use crate::ml::evaluation::{evaluate, holdout_split};
use crate::ml::feature::FeatureSpace;
use crate::ml::label::RatingLabel;
use crate::ml::pipeline::RatingPredictor;

/// Message for a missing or empty review.
pub const NO_REVIEW_TEXT: &str = "No review text provided";

/// Execute a CLI command.
pub fn execute_command(args: RaterArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args.clone(), &args),
        Command::Predict(predict_args) => predict(predict_args.clone(), &args),
        Command::Evaluate(evaluate_args) => evaluate_model(evaluate_args.clone(), &args),
        Command::Check(check_args) => check(check_args.clone(), &args),
    }
}

/// Build the effective configuration: file (or defaults), then global flags.
pub fn resolve_config(args: &RaterArgs) -> Result<RaterConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from {}", path.display());
            RaterConfig::from_json_file(path)?
        }
        None => RaterConfig::default(),
    };
    if let Some(model_dir) = &args.model_dir {
        config.model_dir = model_dir.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Predict the rating of `text` with a loaded predictor.
///
/// Empty input is a usage error and never reaches the model. Any other text,
/// including whitespace, is predicted.
pub fn predict_text(predictor: &RatingPredictor, text: &str) -> Result<RatingLabel> {
    if text.is_empty() {
        return Err(RaterError::usage(NO_REVIEW_TEXT));
    }
    predictor.predict(text)
}

/// Train on the configured corpus and save both artifacts.
///
/// With `holdout = Some((ratio, seed))` the model is trained on the remaining
/// part of the corpus and its accuracy on the held-out part is reported.
pub fn run_training(config: &RaterConfig, holdout: Option<(f64, u64)>) -> Result<TrainingSummary> {
    let corpus = Corpus::from_csv_path(&config.corpus.path, &config.corpus)?;
    if corpus.is_empty() {
        return Err(RaterError::empty_corpus(format!(
            "{} contains no labeled reviews",
            config.corpus.path.display()
        )));
    }

    let (train_set, test_set) = match holdout {
        Some((ratio, seed)) => {
            let (train_set, test_set) = holdout_split(&corpus, ratio, seed)?;
            log::info!(
                "Holding out {} of {} reviews (seed {seed})",
                test_set.len(),
                corpus.len()
            );
            (train_set, Some(test_set))
        }
        None => (corpus, None),
    };

    let predictor = RatingPredictor::train(
        train_set.texts(),
        train_set.labels(),
        &config.vectorizer,
        &config.classifier,
    )?;

    let report = match &test_set {
        Some(test_set) => Some(evaluate(&predictor, test_set.texts(), test_set.labels())?),
        None => None,
    };

    ArtifactStore::new(&config.model_dir).save_predictor(&predictor)?;

    let (iterations, converged, final_loss) = predictor
        .training_stats()
        .map(|stats| (stats.iterations, stats.converged, stats.final_loss))
        .unwrap_or_default();

    Ok(TrainingSummary {
        corpus: config.corpus.path.display().to_string(),
        samples: train_set.len(),
        labels: predictor.labels().to_vec(),
        vocabulary_size: predictor.dimension()?,
        iterations,
        converged,
        final_loss,
        model_dir: config.model_dir.display().to_string(),
        holdout: report,
    })
}

/// Train and save a model.
fn train(args: TrainArgs, cli_args: &RaterArgs) -> Result<()> {
    let mut config = resolve_config(cli_args)?;
    if let Some(corpus) = args.corpus {
        config.corpus.path = corpus;
    }
    if let Some(text_column) = args.text_column {
        config.corpus.text_column = text_column;
    }
    if let Some(label_column) = args.label_column {
        config.corpus.label_column = label_column;
    }
    if let Some(max_iter) = args.max_iter {
        config.classifier.max_iter = max_iter;
    }
    if let Some(min_df) = args.min_df {
        config.vectorizer.min_df = min_df;
    }
    config.validate()?;

    let summary = run_training(&config, args.holdout.map(|ratio| (ratio, args.seed)))?;
    output_result(&summary, cli_args)
}

/// Predict the rating of one review.
fn predict(args: PredictArgs, cli_args: &RaterArgs) -> Result<()> {
    let text = args.text.unwrap_or_default();
    if text.is_empty() {
        return Err(RaterError::usage(NO_REVIEW_TEXT));
    }

    let config = resolve_config(cli_args)?;
    let predictor = ArtifactStore::new(&config.model_dir).load_predictor()?;
    let rating = predict_text(&predictor, &text)?;

    output_result(&PredictionResult { rating }, cli_args)
}

/// Evaluate the saved model on a labeled CSV.
fn evaluate_model(args: EvaluateArgs, cli_args: &RaterArgs) -> Result<()> {
    let config = resolve_config(cli_args)?;
    let path = args.corpus.unwrap_or_else(|| config.corpus.path.clone());

    let corpus = Corpus::from_csv_path(&path, &config.corpus)?;
    let predictor = ArtifactStore::new(&config.model_dir).load_predictor()?;
    let report = evaluate(&predictor, corpus.texts(), corpus.labels())?;

    output_result(
        &EvaluationResult {
            corpus: path.display().to_string(),
            report,
        },
        cli_args,
    )
}

/// Run a sample review through the saved model.
fn check(args: CheckArgs, cli_args: &RaterArgs) -> Result<()> {
    let config = resolve_config(cli_args)?;
    let predictor = ArtifactStore::new(&config.model_dir).load_predictor()?;
    let rating = predict_text(&predictor, &args.text)?;

    output_result(
        &CheckResult {
            text: args.text,
            rating,
        },
        cli_args,
    )
}
