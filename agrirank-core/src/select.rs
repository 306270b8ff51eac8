//! Shortlist the most probable classes.

use crate::{ClassifierError, CropLabel, LabelEncoder, ProbabilityVector};

/// Return the indices of the `k` most probable classes.
///
/// Indices are ordered by descending probability; equal probabilities keep
/// ascending index order. `k` is capped at the number of classes and the
/// input is left untouched.
///
/// # Examples
/// ```
/// use agrirank_core::{ProbabilityVector, select_top_k};
///
/// let probs = ProbabilityVector::new(vec![0.1, 0.4, 0.4, 0.1])?;
/// assert_eq!(select_top_k(&probs, 3), vec![1, 2, 0]);
/// assert_eq!(select_top_k(&probs, 10).len(), 4);
/// # Ok::<(), agrirank_core::ProbabilityVectorError>(())
/// ```
#[must_use]
pub fn select_top_k(probabilities: &ProbabilityVector, k: usize) -> Vec<usize> {
    let values = probabilities.as_slice();
    let mut indices: Vec<usize> = (0..values.len()).collect();
    indices.sort_by(|&a, &b| {
        let pa = values.get(a).copied().unwrap_or_default();
        let pb = values.get(b).copied().unwrap_or_default();
        pb.total_cmp(&pa).then(a.cmp(&b))
    });
    indices.truncate(k.min(values.len()));
    indices
}

/// Return the `k` most probable labels with their probabilities.
///
/// # Errors
/// Returns [`ClassifierError::LabelMismatch`] when `labels` and
/// `probabilities` differ in length.
pub fn select_top_k_labels(
    probabilities: &ProbabilityVector,
    labels: &LabelEncoder,
    k: usize,
) -> Result<Vec<(CropLabel, f64)>, ClassifierError> {
    let mismatch = || ClassifierError::LabelMismatch {
        probabilities: probabilities.len(),
        labels: labels.len(),
    };
    if probabilities.len() != labels.len() {
        return Err(mismatch());
    }
    select_top_k(probabilities, k)
        .into_iter()
        .map(|index| {
            let label = labels.label(index).ok_or_else(mismatch)?;
            let probability = probabilities.get(index).ok_or_else(mismatch)?;
            Ok((label.clone(), probability))
        })
        .collect()
}
