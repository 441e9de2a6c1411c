//! On-disk storage of fitted components.
//!
//! A model directory holds two files, [`VECTORIZER_FILE`] and [`MODEL_FILE`].
//! Each is a bincode-encoded [`Envelope`] that records what it contains and
//! when it was written, wrapping the bincode-encoded component itself.
//! Files are written to a temporary file in the same directory and then
//! renamed into place, so a reader never sees a half-written artifact.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::{RaterError, Result};
use crate::ml::classifier::LogisticRegression;
use crate::ml::pipeline::RatingPredictor;
use crate::ml::vectorizer::CountVectorizer;

/// File name of the persisted vectorizer.
pub const VECTORIZER_FILE: &str = "vectorizer.bin";

/// File name of the persisted classifier.
pub const MODEL_FILE: &str = "model.bin";

/// What an artifact file contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArtifactKind {
    Vectorizer,
    Classifier,
}

impl ArtifactKind {
    fn component(self) -> &'static str {
        match self {
            ArtifactKind::Vectorizer => "CountVectorizer",
            ArtifactKind::Classifier => "LogisticRegression",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    kind: ArtifactKind,
    trained_at: DateTime<Utc>,
    payload: Vec<u8>,
}

/// A directory of persisted components.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Store rooted at `dir`. Nothing is touched until the first save.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        ArtifactStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn vectorizer_path(&self) -> PathBuf {
        self.dir.join(VECTORIZER_FILE)
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    /// Whether both artifacts are present.
    pub fn exists(&self) -> bool {
        self.vectorizer_path().is_file() && self.model_path().is_file()
    }

    /// Persist a fitted vectorizer and return the path written.
    pub fn save_vectorizer(&self, vectorizer: &CountVectorizer) -> Result<PathBuf> {
        if !vectorizer.is_fitted() {
            return Err(RaterError::not_fitted(ArtifactKind::Vectorizer.component()));
        }
        let path = self.vectorizer_path();
        self.write(&path, ArtifactKind::Vectorizer, vectorizer)?;
        Ok(path)
    }

    /// Persist a fitted classifier and return the path written.
    pub fn save_classifier(&self, classifier: &LogisticRegression) -> Result<PathBuf> {
        if !classifier.is_fitted() {
            return Err(RaterError::not_fitted(ArtifactKind::Classifier.component()));
        }
        let path = self.model_path();
        self.write(&path, ArtifactKind::Classifier, classifier)?;
        Ok(path)
    }

    /// Persist both components of a predictor.
    pub fn save_predictor(&self, predictor: &RatingPredictor) -> Result<()> {
        self.save_vectorizer(predictor.vectorizer())?;
        self.save_classifier(predictor.classifier())?;
        Ok(())
    }

    /// Load the persisted vectorizer.
    pub fn load_vectorizer(&self) -> Result<CountVectorizer> {
        let vectorizer: CountVectorizer =
            self.read(&self.vectorizer_path(), ArtifactKind::Vectorizer)?;
        if !vectorizer.is_fitted() {
            return Err(RaterError::not_fitted(ArtifactKind::Vectorizer.component()));
        }
        Ok(vectorizer)
    }

    /// Load the persisted classifier.
    pub fn load_classifier(&self) -> Result<LogisticRegression> {
        let classifier: LogisticRegression =
            self.read(&self.model_path(), ArtifactKind::Classifier)?;
        if !classifier.is_fitted() {
            return Err(RaterError::not_fitted(ArtifactKind::Classifier.component()));
        }
        Ok(classifier)
    }

    /// Load both components and pair them.
    pub fn load_predictor(&self) -> Result<RatingPredictor> {
        let vectorizer = self.load_vectorizer()?;
        let classifier = self.load_classifier()?;
        RatingPredictor::new(vectorizer, classifier)
    }

    fn write<T: Serialize>(&self, path: &Path, kind: ArtifactKind, value: &T) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let envelope = Envelope {
            kind,
            trained_at: Utc::now(),
            payload: bincode::serialize(value)?,
        };

        let temp_file = NamedTempFile::new_in(&self.dir)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file());
            bincode::serialize_into(&mut writer, &envelope)?;
            writer.flush()?;
        }
        temp_file.persist(path).map_err(|e| e.error)?;

        log::info!("Saved {:?} to {}", kind, path.display());
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, path: &Path, kind: ArtifactKind) -> Result<T> {
        let file = File::open(path).map_err(|e| {
            RaterError::artifact(format!(
                "Cannot open {}: {e}; train a model first",
                path.display()
            ))
        })?;
        let envelope: Envelope = bincode::deserialize_from(BufReader::new(file))?;

        if envelope.kind != kind {
            return Err(RaterError::NotFitted(format!(
                "{} expected a {:?} artifact, found {:?}",
                path.display(),
                kind,
                envelope.kind
            )));
        }

        let value = bincode::deserialize(&envelope.payload)?;
        log::info!(
            "Loaded {:?} from {} (trained at {})",
            kind,
            path.display(),
            envelope.trained_at.to_rfc3339()
        );
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::classifier::ClassifierConfig;
    use crate::ml::label::RatingLabel;
    use crate::ml::vectorizer::VectorizerConfig;
    use tempfile::TempDir;

    fn predictor() -> RatingPredictor {
        RatingPredictor::train(
            &["Great teacher, very clear", "Terrible, never available"],
            &[RatingLabel::from(5), RatingLabel::from(1)],
            &VectorizerConfig::default(),
            &ClassifierConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path().join("ml"));
        assert!(!store.exists());

        let predictor = predictor();
        store.save_predictor(&predictor).unwrap();
        assert!(store.exists());

        let loaded = store.load_predictor().unwrap();
        assert_eq!(
            loaded.vectorizer().vocabulary().unwrap(),
            predictor.vectorizer().vocabulary().unwrap()
        );
        assert_eq!(loaded.classifier(), predictor.classifier());
        assert_eq!(
            loaded.predict("very clear").unwrap(),
            predictor.predict("very clear").unwrap()
        );
    }

    #[test]
    fn test_refuses_to_save_unfitted() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());

        let vectorizer = CountVectorizer::with_defaults().unwrap();
        assert!(matches!(
            store.save_vectorizer(&vectorizer),
            Err(RaterError::NotFitted(_))
        ));
        assert!(matches!(
            store.save_classifier(&LogisticRegression::with_defaults().unwrap()),
            Err(RaterError::NotFitted(_))
        ));
        assert!(!store.vectorizer_path().exists());
    }

    #[test]
    fn test_wrong_kind_is_not_fitted() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.save_predictor(&predictor()).unwrap();

        fs::copy(store.model_path(), store.vectorizer_path()).unwrap();
        assert!(matches!(
            store.load_vectorizer(),
            Err(RaterError::NotFitted(_))
        ));
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        assert!(matches!(
            store.load_classifier(),
            Err(RaterError::Artifact(_))
        ));

        fs::write(store.model_path(), b"not an artifact").unwrap();
        assert!(matches!(
            store.load_classifier(),
            Err(RaterError::Artifact(_))
        ));
    }
}
