//! Integration tests for persisting and reloading fitted components.

use std::fs;

use tempfile::TempDir;

use rater::artifact::{ArtifactStore, MODEL_FILE, VECTORIZER_FILE};
use rater::error::{RaterError, Result};
use rater::ml::*;

fn train(texts: &[&str], labels: &[i64]) -> Result<RatingPredictor> {
    let labels: Vec<RatingLabel> = labels.iter().map(|&l| RatingLabel::from(l)).collect();
    RatingPredictor::train(
        texts,
        &labels,
        &VectorizerConfig::default(),
        &ClassifierConfig::default(),
    )
}

#[test]
fn test_reloaded_components_predict_identically() -> Result<()> {
    let dir = TempDir::new()?;
    let store = ArtifactStore::new(dir.path());
    let predictor = train(
        &[
            "Great teacher, very clear",
            "Terrible, never available",
            "Okay but slow to reply",
            "Clear slides and great examples",
        ],
        &[5, 1, 3, 5],
    )?;

    let vectorizer_path = store.save_vectorizer(predictor.vectorizer())?;
    let model_path = store.save_classifier(predictor.classifier())?;
    assert_eq!(vectorizer_path, dir.path().join(VECTORIZER_FILE));
    assert_eq!(model_path, dir.path().join(MODEL_FILE));

    let vectorizer = store.load_vectorizer()?;
    let classifier = store.load_classifier()?;
    let probes = [
        "great examples",
        "never replies",
        "",
        "okay",
        "clear but slow, terrible",
    ];
    for probe in probes {
        assert_eq!(
            vectorizer.transform(probe)?,
            predictor.vectorizer().transform(probe)?
        );
    }

    let reloaded = RatingPredictor::new(vectorizer, classifier)?;
    assert_eq!(reloaded.predict_batch(&probes)?, predictor.predict_batch(&probes)?);
    assert_eq!(reloaded.labels(), predictor.labels());

    Ok(())
}

#[test]
fn test_load_mismatched_pair() -> Result<()> {
    let dir_a = TempDir::new()?;
    let dir_b = TempDir::new()?;
    let store_a = ArtifactStore::new(dir_a.path());
    let store_b = ArtifactStore::new(dir_b.path());

    store_a.save_predictor(&train(&["good clear", "bad"], &[5, 1])?)?;
    let wide = train(&["excellent lectures", "poor grading policy"], &[5, 1])?;
    store_b.save_predictor(&wide)?;

    // Vectorizer with 3 terms, classifier trained on 5.
    fs::copy(store_b.model_path(), store_a.model_path())?;
    let err = store_a.load_predictor().unwrap_err();
    assert!(matches!(
        err,
        RaterError::DimensionMismatch {
            expected: 5,
            found: 3
        }
    ));

    Ok(())
}

#[test]
fn test_swapped_files_are_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let store = ArtifactStore::new(dir.path());
    store.save_predictor(&train(&["good clear", "bad"], &[5, 1])?)?;

    let vectorizer_bytes = fs::read(store.vectorizer_path())?;
    let model_bytes = fs::read(store.model_path())?;
    fs::write(store.vectorizer_path(), model_bytes)?;
    fs::write(store.model_path(), vectorizer_bytes)?;

    assert!(matches!(
        store.load_vectorizer(),
        Err(RaterError::NotFitted(_))
    ));
    assert!(matches!(
        store.load_classifier(),
        Err(RaterError::NotFitted(_))
    ));

    Ok(())
}

#[test]
fn test_missing_artifacts() -> Result<()> {
    let dir = TempDir::new()?;
    let store = ArtifactStore::new(dir.path().join("nothing-here"));

    assert!(!store.exists());
    assert!(matches!(
        store.load_predictor(),
        Err(RaterError::Artifact(_))
    ));

    Ok(())
}

#[test]
fn test_save_overwrites_previous_model() -> Result<()> {
    let dir = TempDir::new()?;
    let store = ArtifactStore::new(dir.path());

    store.save_predictor(&train(&["good clear", "bad"], &[5, 1])?)?;
    let replacement = train(&["fair", "awful", "superb"], &[3, 1, 5])?;
    store.save_predictor(&replacement)?;

    let loaded = store.load_predictor()?;
    assert_eq!(loaded.labels(), replacement.labels());
    assert_eq!(loaded.dimension()?, 3);

    // Only the two artifacts remain; temporary files were renamed away.
    let mut names: Vec<String> = fs::read_dir(dir.path())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<_>>()?;
    names.sort();
    assert_eq!(names, vec![MODEL_FILE.to_string(), VECTORIZER_FILE.to_string()]);

    Ok(())
}
