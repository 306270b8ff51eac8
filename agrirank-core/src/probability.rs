//! Per-request class probabilities produced by a classifier.

use thiserror::Error;

/// Errors returned by [`ProbabilityVector::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProbabilityVectorError {
    /// No probabilities were supplied.
    #[error("probability vector must not be empty")]
    Empty,
    /// A probability was NaN, infinite or negative.
    #[error("probability at class {index} is invalid: {value}")]
    Invalid {
        /// Offending class index.
        index: usize,
        /// Offending value.
        value: f64,
    },
}

/// Class-index to probability mapping.
///
/// Index `i` refers to label `i` of the classifier's
/// [`LabelEncoder`](crate::LabelEncoder). Values are finite and non-negative;
/// they are not required to sum to one.
///
/// # Examples
/// ```
/// use agrirank_core::ProbabilityVector;
///
/// let probs = ProbabilityVector::new(vec![0.2, 0.8])?;
/// assert_eq!(probs.len(), 2);
/// assert_eq!(probs.get(1), Some(0.8));
/// # Ok::<(), agrirank_core::ProbabilityVectorError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityVector(Vec<f64>);

impl ProbabilityVector {
    /// Validate and wrap class probabilities.
    ///
    /// # Errors
    /// Returns [`ProbabilityVectorError`] when `values` is empty or holds a
    /// non-finite or negative entry.
    pub fn new(values: Vec<f64>) -> Result<Self, ProbabilityVectorError> {
        if values.is_empty() {
            return Err(ProbabilityVectorError::Empty);
        }
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(ProbabilityVectorError::Invalid { index, value });
        }
        Ok(Self(values))
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; construction rejects empty vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Probability for `index`, if in range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    /// Borrow the raw values.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rejects_empty() {
        assert_eq!(
            ProbabilityVector::new(Vec::new()),
            Err(ProbabilityVectorError::Empty)
        );
    }

    #[rstest]
    #[case(vec![0.5, f64::NAN], 1)]
    #[case(vec![-0.1, 0.5], 0)]
    #[case(vec![0.1, 0.2, f64::INFINITY], 2)]
    fn rejects_invalid_entries(#[case] values: Vec<f64>, #[case] expected_index: usize) {
        let err = ProbabilityVector::new(values).expect_err("invalid entry");
        assert!(matches!(
            err,
            ProbabilityVectorError::Invalid { index, .. } if index == expected_index
        ));
    }

    #[rstest]
    fn accepts_zero_and_negative_zero() {
        let probs = ProbabilityVector::new(vec![0.0, -0.0, 1.0]).expect("valid vector");
        assert_eq!(probs.len(), 3);
    }
}
