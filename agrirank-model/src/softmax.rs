//! Softmax classifier over standardised soil and climate readings.
#![forbid(unsafe_code)]

use agrirank_core::{
    ClassifierError, CropClassifier, CropLabel, FEATURE_COUNT, FEATURE_NAMES, FeatureVector,
    LabelEncoder, ProbabilityVector,
};

use crate::{ModelParameters, ModelValidationError};

type FeatureRow = [f64; FEATURE_COUNT];

/// Multinomial logistic classifier implementing [`CropClassifier`].
///
/// Construction validates every parameter, so prediction only fails when
/// extreme readings overflow the logits.
///
/// # Examples
/// ```
/// use agrirank_core::{CropClassifier, FeatureVector};
/// use agrirank_model::{ModelParameters, SoftmaxClassifier};
///
/// let parameters = ModelParameters {
///     labels: vec!["rice".into(), "coffee".into()],
///     feature_means: vec![0.0; 7],
///     feature_scales: vec![1.0; 7],
///     weights: vec![vec![0.0; 7], vec![0.0; 7]],
///     biases: vec![1.0, 0.0],
/// };
/// let model = SoftmaxClassifier::from_parameters(parameters)?;
/// let features = FeatureVector::try_from(&[90.0, 42.0, 43.0, 21.0, 82.0, 6.5, 200.0][..])?;
/// let probabilities = model.predict(&features)?;
/// assert!(probabilities.get(0) > probabilities.get(1));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SoftmaxClassifier {
    labels: LabelEncoder,
    means: FeatureRow,
    scales: FeatureRow,
    weights: Vec<FeatureRow>,
    biases: Vec<f64>,
}

impl SoftmaxClassifier {
    /// Validate `parameters` and build a classifier.
    ///
    /// # Errors
    /// Returns [`ModelValidationError`] when labels are blank or repeated,
    /// shapes disagree with the label or feature counts, a value is not
    /// finite, or a feature scale is zero.
    pub fn from_parameters(parameters: ModelParameters) -> Result<Self, ModelValidationError> {
        let ModelParameters {
            labels,
            feature_means,
            feature_scales,
            weights,
            biases,
        } = parameters;

        let labels = LabelEncoder::new(
            labels
                .iter()
                .map(CropLabel::new)
                .collect::<Result<Vec<_>, _>>()?,
        )?;
        let means = feature_row("feature_means", &feature_means)?;
        ensure_finite("feature_means", means.iter())?;
        let scales = feature_row("feature_scales", &feature_scales)?;
        ensure_finite("feature_scales", scales.iter())?;
        if let Some((feature, _)) = FEATURE_NAMES
            .into_iter()
            .zip(scales)
            .find(|(_, scale)| *scale == 0.0)
        {
            return Err(ModelValidationError::ZeroScale { feature });
        }

        ensure_per_class("weights", labels.len(), weights.len())?;
        ensure_per_class("biases", labels.len(), biases.len())?;
        let weights = weights
            .iter()
            .map(|row| feature_row("weights", row))
            .collect::<Result<Vec<_>, _>>()?;
        ensure_finite("weights", weights.iter().flatten())?;
        ensure_finite("biases", biases.iter())?;

        Ok(Self {
            labels,
            means,
            scales,
            weights,
            biases,
        })
    }

    /// Export the parameters this classifier was built from.
    #[must_use]
    pub fn to_parameters(&self) -> ModelParameters {
        ModelParameters {
            labels: self.labels.iter().map(ToString::to_string).collect(),
            feature_means: self.means.to_vec(),
            feature_scales: self.scales.to_vec(),
            weights: self.weights.iter().map(|row| row.to_vec()).collect(),
            biases: self.biases.clone(),
        }
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "standardisation and dot products are floating-point by nature"
    )]
    fn logits(&self, features: &FeatureVector) -> Vec<f64> {
        let mut standardised = [0.0; FEATURE_COUNT];
        for (slot, ((value, mean), scale)) in standardised.iter_mut().zip(
            features
                .as_array()
                .iter()
                .zip(&self.means)
                .zip(&self.scales),
        ) {
            *slot = (value - mean) / scale;
        }
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| {
                row.iter()
                    .zip(&standardised)
                    .map(|(weight, x)| weight * x)
                    .sum::<f64>()
                    + bias
            })
            .collect()
    }
}

/// Convert logits to probabilities, shifting by the maximum logit so the
/// largest exponent is `exp(0)`.
#[expect(
    clippy::float_arithmetic,
    reason = "softmax normalisation divides by the sum of exponentials"
)]
pub(crate) fn softmax(logits: &[f64]) -> Result<Vec<f64>, ClassifierError> {
    if logits.iter().any(|logit| !logit.is_finite()) {
        return Err(ClassifierError::Inference {
            reason: String::from("logits overflowed for the supplied readings"),
        });
    }
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exponentials: Vec<f64> = logits.iter().map(|logit| (logit - max).exp()).collect();
    let total: f64 = exponentials.iter().sum();
    Ok(exponentials.into_iter().map(|e| e / total).collect())
}

fn feature_row(field: &'static str, values: &[f64]) -> Result<FeatureRow, ModelValidationError> {
    let row: FeatureRow =
        values
            .try_into()
            .map_err(|_| ModelValidationError::FeatureDimension {
                field,
                expected: FEATURE_COUNT,
                found: values.len(),
            })?;
    Ok(row)
}

const fn ensure_per_class(
    field: &'static str,
    expected: usize,
    found: usize,
) -> Result<(), ModelValidationError> {
    if expected == found {
        Ok(())
    } else {
        Err(ModelValidationError::ClassDimension {
            field,
            expected,
            found,
        })
    }
}

fn ensure_finite<'a>(
    field: &'static str,
    values: impl Iterator<Item = &'a f64>,
) -> Result<(), ModelValidationError> {
    match values.enumerate().find(|(_, value)| !value.is_finite()) {
        Some((index, _)) => Err(ModelValidationError::NonFinite { field, index }),
        None => Ok(()),
    }
}

impl CropClassifier for SoftmaxClassifier {
    fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    fn predict(&self, features: &FeatureVector) -> Result<ProbabilityVector, ClassifierError> {
        let probabilities = softmax(&self.logits(features))?;
        ProbabilityVector::new(probabilities).map_err(|err| ClassifierError::Inference {
            reason: err.to_string(),
        })
    }
}

