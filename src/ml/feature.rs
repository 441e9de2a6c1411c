//! Feature vectors and the feature-space contract.
//!
//! The vectorizer produces [`FeatureVector`]s over its vocabulary and the
//! classifier consumes them. Both sides implement [`FeatureSpace`] so that a
//! pairing of the two can be checked up front instead of failing on the first
//! prediction.

use serde::{Deserialize, Serialize};

use crate::error::{RaterError, Result};

/// A component that produces or consumes vectors of a fixed width.
pub trait FeatureSpace {
    /// Width of the feature space.
    ///
    /// Fails with [`RaterError::NotFitted`] while the component is unfit,
    /// since the width is only known after fitting.
    fn dimension(&self) -> Result<usize>;
}

/// Check that two feature spaces have the same width and return it.
pub fn ensure_same_space(
    produced: &dyn FeatureSpace,
    consumed: &dyn FeatureSpace,
) -> Result<usize> {
    let expected = consumed.dimension()?;
    let found = produced.dimension()?;
    if expected != found {
        return Err(RaterError::dimension_mismatch(expected, found));
    }
    Ok(expected)
}

/// A sparse numeric vector of fixed dimension.
///
/// Only non-zero entries are stored, sorted by index. [`len`](Self::len)
/// always reports the full dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    dimension: usize,
    entries: Vec<(usize, f64)>,
}

impl FeatureVector {
    /// The all-zero vector of the given dimension.
    pub fn zeros(dimension: usize) -> Self {
        FeatureVector {
            dimension,
            entries: Vec::new(),
        }
    }

    /// Build a vector from `(index, value)` pairs.
    ///
    /// Values for repeated indices are summed and zero sums are dropped. An
    /// index outside the dimension is a [`RaterError::DimensionMismatch`].
    pub fn from_counts<I>(dimension: usize, counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, f64)>,
    {
        let mut pairs: Vec<(usize, f64)> = counts.into_iter().collect();
        if let Some(&(index, _)) = pairs.iter().find(|(index, _)| *index >= dimension) {
            return Err(RaterError::dimension_mismatch(dimension, index + 1));
        }
        pairs.sort_by_key(|(index, _)| *index);

        let mut entries: Vec<(usize, f64)> = Vec::with_capacity(pairs.len());
        for (index, value) in pairs {
            match entries.last_mut() {
                Some((last, sum)) if *last == index => *sum += value,
                _ => entries.push((index, value)),
            }
        }
        entries.retain(|(_, value)| *value != 0.0);

        Ok(FeatureVector { dimension, entries })
    }

    /// Build a vector from a dense slice.
    pub fn from_dense(values: &[f64]) -> Self {
        let entries = values
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0.0)
            .map(|(index, value)| (index, *value))
            .collect();

        FeatureVector {
            dimension: values.len(),
            entries,
        }
    }

    /// The dimension of the vector.
    pub fn len(&self) -> usize {
        self.dimension
    }

    /// Whether the vector has dimension zero.
    pub fn is_empty(&self) -> bool {
        self.dimension == 0
    }

    /// Number of non-zero entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Whether every entry is zero.
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value at `index` (zero when absent or out of range).
    pub fn get(&self, index: usize) -> f64 {
        self.entries
            .binary_search_by_key(&index, |(i, _)| *i)
            .map(|pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    /// Iterate over the non-zero `(index, value)` entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.entries.iter().copied()
    }

    /// Dense copy of the vector.
    pub fn to_dense(&self) -> Vec<f64> {
        let mut dense = vec![0.0; self.dimension];
        for (index, value) in self.iter() {
            dense[index] = value;
        }
        dense
    }

    /// Dot product with a dense weight row of the same dimension.
    pub fn dot(&self, weights: &[f64]) -> f64 {
        debug_assert_eq!(weights.len(), self.dimension);
        self.iter().map(|(index, value)| weights[index] * value).sum()
    }
}
