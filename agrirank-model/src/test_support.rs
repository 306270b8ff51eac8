//! Small deterministic models for tests, gated behind `test-support`.
#![forbid(unsafe_code)]

use agrirank_core::FEATURE_COUNT;

use crate::ModelParameters;

/// Class priors of [`reference_parameters`], in class-index order.
pub const REFERENCE_PRIORS: [(&str, f64); 6] = [
    ("rice", 0.30),
    ("wheat", 0.25),
    ("banana", 0.20),
    ("pulses", 0.15),
    ("maize", 0.06),
    ("coffee", 0.04),
];

/// Parameters whose predictions ignore the readings and reproduce
/// [`REFERENCE_PRIORS`]: every weight is zero and each bias is the log of
/// its prior, so the softmax returns the priors themselves.
#[must_use]
pub fn reference_parameters() -> ModelParameters {
    ModelParameters {
        labels: REFERENCE_PRIORS
            .iter()
            .map(|(name, _)| (*name).to_owned())
            .collect(),
        feature_means: vec![0.0; FEATURE_COUNT],
        feature_scales: vec![1.0; FEATURE_COUNT],
        weights: vec![vec![0.0; FEATURE_COUNT]; REFERENCE_PRIORS.len()],
        biases: REFERENCE_PRIORS.iter().map(|(_, prior)| prior.ln()).collect(),
    }
}
