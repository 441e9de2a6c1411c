//! Labeled review corpus and its CSV loader.
//!
//! The training data is a CSV file with a header row. One column holds the
//! review text and another the rating:
//! ```csv
//! review_text,rating
//! "Great teacher, very clear",5
//! "Terrible, never available",1
//! ```

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::error::{RaterError, Result};
use crate::ml::label::RatingLabel;

/// Where the corpus lives and how to read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Path of the CSV file.
    pub path: PathBuf,
    /// Header of the review text column.
    pub text_column: String,
    /// Header of the rating column.
    pub label_column: String,
    /// Field delimiter.
    pub delimiter: char,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        CorpusConfig {
            path: PathBuf::from("data/faculty_reviews.csv"),
            text_column: "review_text".to_string(),
            label_column: "rating".to_string(),
            delimiter: ',',
        }
    }
}

impl CorpusConfig {
    /// Check the configuration for values the loader cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.text_column.trim().is_empty() {
            return Err(RaterError::invalid_config("text_column must not be empty"));
        }
        if self.label_column.trim().is_empty() {
            return Err(RaterError::invalid_config("label_column must not be empty"));
        }
        if self.text_column == self.label_column {
            return Err(RaterError::invalid_config(format!(
                "text_column and label_column are both '{}'",
                self.text_column
            )));
        }
        if !self.delimiter.is_ascii() {
            return Err(RaterError::invalid_config(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            )));
        }
        Ok(())
    }
}

/// Parallel sequences of review texts and their ratings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    texts: Vec<String>,
    labels: Vec<RatingLabel>,
}

impl Corpus {
    /// Build a corpus from parallel sequences of equal length.
    pub fn new(texts: Vec<String>, labels: Vec<RatingLabel>) -> Result<Self> {
        if texts.len() != labels.len() {
            return Err(RaterError::dimension_mismatch(texts.len(), labels.len()));
        }
        Ok(Corpus { texts, labels })
    }

    /// Build a corpus from `(text, label)` pairs.
    pub fn from_records<I, S, L>(records: I) -> Self
    where
        I: IntoIterator<Item = (S, L)>,
        S: Into<String>,
        L: Into<RatingLabel>,
    {
        let (texts, labels) = records
            .into_iter()
            .map(|(text, label)| (text.into(), label.into()))
            .unzip();
        Corpus { texts, labels }
    }

    /// Load a corpus from a CSV file.
    pub fn from_csv_path<P: AsRef<Path>>(path: P, config: &CorpusConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            RaterError::corpus(format!("Failed to open {}: {e}", path.display()))
        })?;
        let corpus = Self::from_reader(file, config)?;
        log::info!("Loaded {} reviews from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    /// Load a corpus from any CSV source.
    ///
    /// Rows with an empty rating are skipped. Rows with an empty review are
    /// kept; they simply contribute no terms.
    pub fn from_reader<R: Read>(reader: R, config: &CorpusConfig) -> Result<Self> {
        config.validate()?;

        let mut reader = ReaderBuilder::new()
            .delimiter(config.delimiter as u8)
            .trim(csv::Trim::All)
            .has_headers(true)
            .from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| RaterError::corpus(format!("Failed to read CSV headers: {e}")))?
            .clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|header| header == name)
                .ok_or_else(|| RaterError::corpus(format!("CSV has no '{name}' column")))
        };
        let text_index = column(&config.text_column)?;
        let label_index = column(&config.label_column)?;

        let mut texts = Vec::new();
        let mut labels = Vec::new();
        for (row, record) in reader.records().enumerate() {
            // Row 1 is the header.
            let line = row + 2;
            let record = record
                .map_err(|e| RaterError::corpus(format!("Malformed record at row {line}: {e}")))?;

            let label = RatingLabel::new(record.get(label_index).unwrap_or_default());
            if label.is_empty() {
                log::warn!("Skipping row {line}: empty '{}'", config.label_column);
                continue;
            }
            texts.push(record.get(text_index).unwrap_or_default().to_string());
            labels.push(label);
        }

        Ok(Corpus { texts, labels })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    /// Whether the corpus has no records.
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Review texts.
    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// Ratings, parallel to [`texts`](Self::texts).
    pub fn labels(&self) -> &[RatingLabel] {
        &self.labels
    }

    /// Iterate over `(text, label)` records.
    pub fn records(&self) -> impl Iterator<Item = (&str, &RatingLabel)> {
        self.texts
            .iter()
            .map(String::as_str)
            .zip(self.labels.iter())
    }

    /// Distinct ratings in ascending order.
    pub fn distinct_labels(&self) -> Vec<RatingLabel> {
        self.labels
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// The records at `indices`, in that order.
    ///
    /// Indices past the end are ignored.
    pub fn subset(&self, indices: &[usize]) -> Corpus {
        let (texts, labels) = indices
            .iter()
            .filter(|&&index| index < self.len())
            .map(|&index| (self.texts[index].clone(), self.labels[index].clone()))
            .unzip();
        Corpus { texts, labels }
    }
}
