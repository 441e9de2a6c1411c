//! Token filter implementations for token transformation.
//!
//! Filters receive the token stream produced by a tokenizer and produce a new
//! stream, modifying or dropping tokens on the way.
//!
//! ```text
//! Tokenizer → Lowercase → Stop Words → Vectorizer
//! ```

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

pub mod lowercase;
pub mod stop;

pub use lowercase::LowercaseFilter;
pub use stop::StopFilter;
