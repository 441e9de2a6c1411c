//! Application configuration.
//!
//! Every section has defaults, so a configuration file only needs the values
//! it changes:
//! ```json
//! {
//!   "corpus": { "path": "data/reviews.csv" },
//!   "classifier": { "max_iter": 500 },
//!   "model_dir": "models"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::corpus::CorpusConfig;
use crate::error::{RaterError, Result};
use crate::ml::classifier::ClassifierConfig;
use crate::ml::vectorizer::VectorizerConfig;

/// Default directory for persisted artifacts.
pub const DEFAULT_MODEL_DIR: &str = "ml";

/// Configuration for training and inference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaterConfig {
    pub corpus: CorpusConfig,
    pub vectorizer: VectorizerConfig,
    pub classifier: ClassifierConfig,
    /// Directory holding `vectorizer.bin` and `model.bin`.
    pub model_dir: PathBuf,
}

impl Default for RaterConfig {
    fn default() -> Self {
        RaterConfig {
            corpus: CorpusConfig::default(),
            vectorizer: VectorizerConfig::default(),
            classifier: ClassifierConfig::default(),
            model_dir: PathBuf::from(DEFAULT_MODEL_DIR),
        }
    }
}

impl RaterConfig {
    /// Read a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RaterError::invalid_config(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: RaterConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<()> {
        self.corpus.validate()?;
        self.vectorizer.validate()?;
        self.classifier.validate()?;
        if self.model_dir.as_os_str().is_empty() {
            return Err(RaterError::invalid_config("model_dir must not be empty"));
        }
        Ok(())
    }
}
