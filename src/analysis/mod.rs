//! Text analysis for review text.
//!
//! Raw review text is turned into a stream of normalized terms before it is
//! counted by the vectorizer. The pipeline is the classic
//! tokenizer → token filters chain:
//!
//! ```text
//! "Great teacher, VERY clear!"
//!        ↓ RegexTokenizer  (\b\w\w+\b)
//! ["Great", "teacher", "VERY", "clear"]
//!        ↓ LowercaseFilter
//! ["great", "teacher", "very", "clear"]
//!        ↓ StopFilter (optional)
//! ```
//!
//! The same analyzer instance must be used at fit and at transform time, which
//! is why the vectorizer rebuilds it from its serialized configuration rather
//! than persisting it.

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, PipelineAnalyzer};
pub use token::{Token, TokenStream};
pub use token_filter::{Filter, LowercaseFilter, StopFilter};
pub use tokenizer::{RegexTokenizer, Tokenizer};
