//! Serialisable model parameters.
#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

/// Trained parameters of a multinomial logistic crop model.
///
/// Row `c` of `weights` and entry `c` of `biases` belong to `labels[c]`.
/// Readings are standardised as `(x - feature_means) / feature_scales`
/// before the logits are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Crop names in class-index order.
    pub labels: Vec<String>,
    /// Per-feature mean used for standardisation.
    pub feature_means: Vec<f64>,
    /// Per-feature scale used for standardisation; never zero.
    pub feature_scales: Vec<f64>,
    /// One weight row per class, one column per feature.
    pub weights: Vec<Vec<f64>>,
    /// One bias per class.
    pub biases: Vec<f64>,
}
