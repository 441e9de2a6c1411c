//! Count vectorizer for review text.
//!
//! Turns free text into a sparse [`FeatureVector`] of term counts over a
//! vocabulary learned once at fit time.
//!
//! # Tokenization
//!
//! Text is analysed by a [`PipelineAnalyzer`] built from the
//! [`VectorizerConfig`]:
//!
//! 1. [`RegexTokenizer`] with `token_pattern` (default `(?u)\b\w\w+\b`, so
//!    single characters and punctuation are dropped),
//! 2. [`LowercaseFilter`] when `lowercase` is set (the default),
//! 3. [`StopFilter`] when `stop_words` is set,
//! 4. word n-grams for every `n` in `ngram_range`, joined by a single space.
//!
//! The analyzer is not persisted: it is rebuilt from the configuration when a
//! vectorizer is deserialized, so fit and transform always tokenize alike.
//!
//! # Example
//!
//! ```
//! use rater::ml::vectorizer::CountVectorizer;
//!
//! let mut vectorizer = CountVectorizer::with_defaults().unwrap();
//! vectorizer.fit(&["Great teacher, very clear", "Never available"]).unwrap();
//!
//! let features = vectorizer.transform("very very clear").unwrap();
//! let very = vectorizer.vocabulary().unwrap().index_of("very").unwrap();
//! assert_eq!(features.get(very), 2.0);
//! assert_eq!(features.len(), vectorizer.vocabulary().unwrap().len());
//! ```

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer};
use crate::analysis::token_filter::{LowercaseFilter, StopFilter};
use crate::analysis::tokenizer::RegexTokenizer;
use crate::analysis::tokenizer::regex::DEFAULT_TOKEN_PATTERN;
use crate::error::{RaterError, Result};
use crate::ml::feature::{FeatureSpace, FeatureVector};

/// Stop-word handling for the vectorizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWords {
    /// Built-in English list.
    English,
    /// Caller-provided list, matched after lowercasing.
    Custom(Vec<String>),
}

/// Configuration for [`CountVectorizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Regex whose matches become tokens.
    pub token_pattern: String,
    /// Lowercase tokens before counting.
    pub lowercase: bool,
    /// Optional stop-word removal.
    pub stop_words: Option<StopWords>,
    /// Inclusive range of word n-gram sizes.
    pub ngram_range: (usize, usize),
    /// Minimum number of documents a term must occur in to be kept.
    pub min_df: usize,
    /// Keep only the most frequent terms across the corpus.
    pub max_features: Option<usize>,
    /// Record presence (1.0) instead of counts.
    pub binary: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        VectorizerConfig {
            token_pattern: DEFAULT_TOKEN_PATTERN.to_string(),
            lowercase: true,
            stop_words: None,
            ngram_range: (1, 1),
            min_df: 1,
            max_features: None,
            binary: false,
        }
    }
}

impl VectorizerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(RaterError::invalid_config(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({min_n}, {max_n})"
            )));
        }
        if self.min_df == 0 {
            return Err(RaterError::invalid_config("min_df must be at least 1"));
        }
        if self.max_features == Some(0) {
            return Err(RaterError::invalid_config("max_features must be at least 1"));
        }
        Ok(())
    }

    /// Build the analysis pipeline described by this configuration.
    pub fn build_analyzer(&self) -> Result<Arc<dyn Analyzer>> {
        let tokenizer = Arc::new(RegexTokenizer::with_pattern(&self.token_pattern)?);
        let mut analyzer = PipelineAnalyzer::new(tokenizer).with_name("count_vectorizer");

        if self.lowercase {
            analyzer = analyzer.add_filter(Arc::new(LowercaseFilter::new()));
        }
        match &self.stop_words {
            Some(StopWords::English) => {
                analyzer = analyzer.add_filter(Arc::new(StopFilter::new()));
            }
            Some(StopWords::Custom(words)) => {
                let words = words.iter().map(|w| {
                    if self.lowercase {
                        w.to_lowercase()
                    } else {
                        w.clone()
                    }
                });
                analyzer = analyzer.add_filter(Arc::new(StopFilter::from_words(words)));
            }
            None => {}
        }

        Ok(Arc::new(analyzer))
    }
}

/// The frozen term → index mapping of a fitted vectorizer.
///
/// Terms are stored in sorted order and term `i` has index `i`, so indices are
/// contiguous from zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Vocabulary {
    terms: Vec<String>,
    index: AHashMap<String, usize>,
}

impl Vocabulary {
    fn from_sorted_terms(terms: Vec<String>) -> Self {
        let index = terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();
        Vocabulary { terms, index }
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the vocabulary has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Index assigned to `term`.
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// Term stored at `index`.
    pub fn term(&self, index: usize) -> Option<&str> {
        self.terms.get(index).map(String::as_str)
    }

    /// Terms in index order.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Iterate over `(term, index)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.terms
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.as_str(), idx))
    }
}

impl TryFrom<Vec<String>> for Vocabulary {
    type Error = RaterError;

    fn try_from(terms: Vec<String>) -> Result<Self> {
        if terms.is_empty() {
            return Err(RaterError::artifact("vocabulary must not be empty"));
        }
        if terms.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(RaterError::artifact(
                "vocabulary terms must be unique and sorted",
            ));
        }
        Ok(Vocabulary::from_sorted_terms(terms))
    }
}

impl From<Vocabulary> for Vec<String> {
    fn from(vocabulary: Vocabulary) -> Self {
        vocabulary.terms
    }
}

/// Serialized form of a [`CountVectorizer`]; the analyzer is rebuilt on load.
#[derive(Serialize, Deserialize)]
struct VectorizerState {
    config: VectorizerConfig,
    vocabulary: Option<Vocabulary>,
}

/// Bag-of-words count vectorizer.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "VectorizerState", into = "VectorizerState")]
pub struct CountVectorizer {
    config: VectorizerConfig,
    analyzer: Arc<dyn Analyzer>,
    vocabulary: Option<Vocabulary>,
}

impl std::fmt::Debug for CountVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountVectorizer")
            .field("config", &self.config)
            .field("analyzer", &self.analyzer.name())
            .field(
                "vocabulary_size",
                &self.vocabulary.as_ref().map(Vocabulary::len),
            )
            .finish()
    }
}

impl CountVectorizer {
    /// Create an unfitted vectorizer from a configuration.
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        config.validate()?;
        let analyzer = config.build_analyzer()?;
        Ok(CountVectorizer {
            config,
            analyzer,
            vocabulary: None,
        })
    }

    /// Create an unfitted vectorizer with the default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(VectorizerConfig::default())
    }

    /// The configuration this vectorizer was built with.
    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    /// Whether [`fit`](Self::fit) has succeeded.
    pub fn is_fitted(&self) -> bool {
        self.vocabulary.is_some()
    }

    /// The fitted vocabulary.
    pub fn vocabulary(&self) -> Result<&Vocabulary> {
        self.vocabulary
            .as_ref()
            .ok_or_else(|| RaterError::not_fitted("CountVectorizer"))
    }

    /// Index of `term` in the fitted vocabulary; `Ok(None)` when unseen.
    pub fn index_of(&self, term: &str) -> Result<Option<usize>> {
        Ok(self.vocabulary()?.index_of(term))
    }

    /// Tokenize `text` into the terms this vectorizer counts.
    pub fn analyze(&self, text: &str) -> Result<Vec<String>> {
        let tokens: Vec<String> = self
            .analyzer
            .analyze(text)?
            .map(|token| token.text)
            .collect();

        let (min_n, max_n) = self.config.ngram_range;
        if (min_n, max_n) == (1, 1) {
            return Ok(tokens);
        }

        let mut terms = Vec::new();
        for n in min_n..=max_n {
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        Ok(terms)
    }

    /// Learn the vocabulary from a corpus.
    ///
    /// Fails with [`RaterError::EmptyCorpus`] when the corpus yields no usable
    /// terms, either because it has no tokens at all or because `min_df` /
    /// `max_features` pruned everything. The previous state is kept on failure.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<&Vocabulary> {
        let mut term_frequency: AHashMap<String, usize> = AHashMap::new();
        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();

        for doc in corpus {
            let terms = self.analyze(doc.as_ref())?;
            let unique: AHashSet<&String> = terms.iter().collect();
            for term in unique {
                *document_frequency.entry(term.clone()).or_insert(0) += 1;
            }
            for term in terms {
                *term_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if term_frequency.is_empty() {
            return Err(RaterError::empty_corpus(format!(
                "{} documents contain no usable tokens",
                corpus.len()
            )));
        }

        let mut kept: Vec<(String, usize)> = term_frequency
            .into_iter()
            .filter(|(term, _)| {
                document_frequency.get(term).copied().unwrap_or(0) >= self.config.min_df
            })
            .collect();

        if let Some(max_features) = self.config.max_features {
            if kept.len() > max_features {
                kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
                kept.truncate(max_features);
            }
        }

        if kept.is_empty() {
            return Err(RaterError::empty_corpus(format!(
                "no terms remain after pruning with min_df = {}",
                self.config.min_df
            )));
        }

        let mut terms: Vec<String> = kept.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        log::info!(
            "Fitted vocabulary of {} terms over {} documents",
            terms.len(),
            corpus.len()
        );

        Ok(&*self.vocabulary.insert(Vocabulary::from_sorted_terms(terms)))
    }

    /// Encode `text` as term counts over the fitted vocabulary.
    ///
    /// Out-of-vocabulary terms are ignored; text with no known term yields the
    /// zero vector.
    pub fn transform(&self, text: &str) -> Result<FeatureVector> {
        let vocabulary = self.vocabulary()?;

        let counts = self
            .analyze(text)?
            .iter()
            .filter_map(|term| vocabulary.index_of(term))
            .map(|idx| (idx, 1.0))
            .collect::<Vec<_>>();

        let mut features = FeatureVector::from_counts(vocabulary.len(), counts)?;
        if self.config.binary {
            features = FeatureVector::from_counts(
                vocabulary.len(),
                features.iter().map(|(idx, _)| (idx, 1.0)),
            )?;
        }
        Ok(features)
    }

    /// Encode several texts.
    pub fn transform_batch<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<FeatureVector>> {
        texts.iter().map(|text| self.transform(text.as_ref())).collect()
    }

    /// Fit on `corpus` and encode it.
    pub fn fit_transform<S: AsRef<str>>(&mut self, corpus: &[S]) -> Result<Vec<FeatureVector>> {
        self.fit(corpus)?;
        self.transform_batch(corpus)
    }
}

impl FeatureSpace for CountVectorizer {
    fn dimension(&self) -> Result<usize> {
        Ok(self.vocabulary()?.len())
    }
}

impl TryFrom<VectorizerState> for CountVectorizer {
    type Error = RaterError;

    fn try_from(state: VectorizerState) -> Result<Self> {
        let mut vectorizer = CountVectorizer::new(state.config)?;
        vectorizer.vocabulary = state.vocabulary;
        Ok(vectorizer)
    }
}

impl From<CountVectorizer> for VectorizerState {
    fn from(vectorizer: CountVectorizer) -> Self {
        VectorizerState {
            config: vectorizer.config,
            vocabulary: vectorizer.vocabulary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(corpus: &[&str]) -> CountVectorizer {
        let mut vectorizer = CountVectorizer::with_defaults().unwrap();
        vectorizer.fit(corpus).unwrap();
        vectorizer
    }

    #[test]
    fn test_count_vectorizer() {
        let vectorizer = fitted(&[
            "Great teacher, very clear",
            "Terrible, never available",
            "Okay but slow to reply",
        ]);

        let vocabulary = vectorizer.vocabulary().unwrap();
        assert_eq!(vocabulary.len(), 12);
        assert_eq!(vocabulary.term(0), Some("available"));
        assert_eq!(vocabulary.index_of("great"), Some(3));

        let features = vectorizer.transform("Great, GREAT and clear").unwrap();
        assert_eq!(features.len(), 12);
        assert_eq!(features.get(3), 2.0);
        assert_eq!(features.get(vocabulary.index_of("clear").unwrap()), 1.0);
        assert_eq!(features.nnz(), 2);
    }

    #[test]
    fn test_vocabulary_indices_are_contiguous_and_sorted() {
        let vectorizer = fitted(&["zeta alpha mid", "alpha beta"]);
        let vocabulary = vectorizer.vocabulary().unwrap();

        let pairs: Vec<(&str, usize)> = vocabulary.iter().collect();
        assert_eq!(
            pairs,
            vec![("alpha", 0), ("beta", 1), ("mid", 2), ("zeta", 3)]
        );
    }

    #[test]
    fn test_each_term_hits_its_own_index() {
        let vectorizer = fitted(&["clear lectures", "rude and late"]);
        let vocabulary = vectorizer.vocabulary().unwrap();

        for (term, idx) in vocabulary.iter() {
            let features = vectorizer.transform(term).unwrap();
            assert_eq!(features.nnz(), 1);
            assert_eq!(features.get(idx), 1.0);
        }
    }

    #[test]
    fn test_out_of_vocabulary_and_empty_text() {
        let vectorizer = fitted(&["clear lectures"]);

        let features = vectorizer.transform("completely unseen words").unwrap();
        assert_eq!(features.len(), 2);
        assert!(features.is_zero());

        let features = vectorizer.transform("").unwrap();
        assert_eq!(features.len(), 2);
        assert!(features.is_zero());
    }

    #[test]
    fn test_transform_before_fit() {
        let vectorizer = CountVectorizer::with_defaults().unwrap();
        assert!(!vectorizer.is_fitted());
        assert!(matches!(
            vectorizer.transform("anything"),
            Err(RaterError::NotFitted(_))
        ));
        assert!(matches!(vectorizer.dimension(), Err(RaterError::NotFitted(_))));
    }

    #[test]
    fn test_fit_empty_corpus() {
        let mut vectorizer = CountVectorizer::with_defaults().unwrap();

        let empty: [&str; 0] = [];
        assert!(matches!(
            vectorizer.fit(&empty),
            Err(RaterError::EmptyCorpus(_))
        ));
        assert!(matches!(
            vectorizer.fit(&["", "a b c", "!!"]),
            Err(RaterError::EmptyCorpus(_))
        ));
        assert!(!vectorizer.is_fitted());
    }

    #[test]
    fn test_failed_refit_keeps_vocabulary() {
        let mut vectorizer = fitted(&["clear lectures"]);
        assert!(vectorizer.fit(&[""]).is_err());
        assert_eq!(vectorizer.dimension().unwrap(), 2);
    }

    #[test]
    fn test_stop_words_and_case() {
        let config = VectorizerConfig {
            stop_words: Some(StopWords::English),
            ..VectorizerConfig::default()
        };
        let mut vectorizer = CountVectorizer::new(config).unwrap();
        vectorizer.fit(&["The lectures are CLEAR"]).unwrap();

        assert_eq!(
            vectorizer.vocabulary().unwrap().terms(),
            &["clear", "lectures"]
        );
    }

    #[test]
    fn test_custom_stop_words_are_lowercased() {
        let config = VectorizerConfig {
            stop_words: Some(StopWords::Custom(vec!["Professor".to_string()])),
            ..VectorizerConfig::default()
        };
        let mut vectorizer = CountVectorizer::new(config).unwrap();
        vectorizer.fit(&["professor was kind"]).unwrap();

        assert_eq!(vectorizer.vocabulary().unwrap().terms(), &["kind", "was"]);
    }

    #[test]
    fn test_bigrams() {
        let config = VectorizerConfig {
            ngram_range: (1, 2),
            ..VectorizerConfig::default()
        };
        let mut vectorizer = CountVectorizer::new(config).unwrap();
        vectorizer.fit(&["very clear notes"]).unwrap();

        assert_eq!(
            vectorizer.vocabulary().unwrap().terms(),
            &["clear", "clear notes", "notes", "very", "very clear"]
        );
        assert_eq!(
            vectorizer.analyze("Very clear").unwrap(),
            vec!["very", "clear", "very clear"]
        );
    }

    #[test]
    fn test_min_df_and_max_features() {
        let config = VectorizerConfig {
            min_df: 2,
            ..VectorizerConfig::default()
        };
        let mut vectorizer = CountVectorizer::new(config).unwrap();
        vectorizer
            .fit(&["clear kind", "clear rude", "late kind clear"])
            .unwrap();
        assert_eq!(vectorizer.vocabulary().unwrap().terms(), &["clear", "kind"]);

        let config = VectorizerConfig {
            max_features: Some(1),
            ..VectorizerConfig::default()
        };
        let mut vectorizer = CountVectorizer::new(config).unwrap();
        vectorizer
            .fit(&["clear kind", "clear rude", "late kind clear"])
            .unwrap();
        assert_eq!(vectorizer.vocabulary().unwrap().terms(), &["clear"]);

        let config = VectorizerConfig {
            min_df: 5,
            ..VectorizerConfig::default()
        };
        let mut vectorizer = CountVectorizer::new(config).unwrap();
        assert!(matches!(
            vectorizer.fit(&["clear kind"]),
            Err(RaterError::EmptyCorpus(_))
        ));
    }

    #[test]
    fn test_binary_counts() {
        let config = VectorizerConfig {
            binary: true,
            ..VectorizerConfig::default()
        };
        let mut vectorizer = CountVectorizer::new(config).unwrap();
        vectorizer.fit(&["good good good"]).unwrap();

        let features = vectorizer.transform("good good").unwrap();
        assert_eq!(features.get(0), 1.0);
    }

    #[test]
    fn test_invalid_config() {
        let config = VectorizerConfig {
            ngram_range: (2, 1),
            ..VectorizerConfig::default()
        };
        assert!(matches!(
            CountVectorizer::new(config),
            Err(RaterError::Config(_))
        ));

        let config = VectorizerConfig {
            token_pattern: "(".to_string(),
            ..VectorizerConfig::default()
        };
        assert!(matches!(
            CountVectorizer::new(config),
            Err(RaterError::Analysis(_))
        ));
    }

    #[test]
    fn test_serde_round_trip_rebuilds_analyzer() {
        let vectorizer = fitted(&["Great teacher, very clear", "never available"]);

        let bytes = bincode::serialize(&vectorizer).unwrap();
        let restored: CountVectorizer = bincode::deserialize(&bytes).unwrap();

        assert_eq!(
            restored.vocabulary().unwrap(),
            vectorizer.vocabulary().unwrap()
        );
        assert_eq!(
            restored.transform("VERY clear, never").unwrap(),
            vectorizer.transform("VERY clear, never").unwrap()
        );
    }

    #[test]
    fn test_unsorted_vocabulary_is_rejected() {
        let bytes = bincode::serialize(&vec!["b".to_string(), "a".to_string()]).unwrap();
        assert!(bincode::deserialize::<Vocabulary>(&bytes).is_err());
    }

    #[test]
    fn test_empty_vocabulary_is_rejected() {
        assert!(matches!(
            Vocabulary::try_from(Vec::<String>::new()),
            Err(RaterError::Artifact(_))
        ));

        let mut vectorizer = fitted(&["Great teacher, very clear"]);
        vectorizer.vocabulary = Some(Vocabulary::from_sorted_terms(Vec::new()));
        let bytes = bincode::serialize(&vectorizer).unwrap();
        let err = bincode::deserialize::<CountVectorizer>(&bytes).unwrap_err();
        assert!(err.to_string().contains("vocabulary must not be empty"));
    }

    #[test]
    fn test_with_defaults_is_unfitted() {
        let vectorizer = CountVectorizer::with_defaults().unwrap();
        assert!(!vectorizer.is_fitted());
        assert_eq!(vectorizer.config(), &VectorizerConfig::default());
    }
}
