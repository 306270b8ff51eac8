//! Crop classifier interface and the label-index contract.
//!
//! A [`CropClassifier`] maps a [`FeatureVector`] to a [`ProbabilityVector`]
//! whose index `i` is the class at position `i` of the classifier's
//! [`LabelEncoder`].

use std::collections::HashSet;

use thiserror::Error;

use crate::{CropLabel, FeatureVector, ProbabilityVector};

/// Errors raised by classifiers and by label mapping.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// The model could not be reached or was never loaded.
    #[error("classifier unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause.
        reason: String,
    },
    /// Inference ran but produced no usable output.
    #[error("classifier inference failed: {reason}")]
    Inference {
        /// Human-readable cause.
        reason: String,
    },
    /// The probability vector and the label encoder disagree in length.
    #[error("classifier produced {probabilities} probabilities for {labels} labels")]
    LabelMismatch {
        /// Length of the probability vector.
        probabilities: usize,
        /// Number of labels known to the encoder.
        labels: usize,
    },
}

/// Errors returned by [`LabelEncoder::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelEncoderError {
    /// No labels were supplied.
    #[error("label encoder must contain at least one label")]
    Empty,
    /// The same canonical label appeared twice.
    #[error("label '{label}' appears more than once")]
    Duplicate {
        /// The repeated label.
        label: CropLabel,
    },
}

/// Ordered list of distinct crop labels.
///
/// # Examples
/// ```
/// use agrirank_core::{CropLabel, LabelEncoder};
///
/// let encoder = LabelEncoder::from_names(["rice", "wheat"])?;
/// assert_eq!(encoder.label(1).map(CropLabel::as_str), Some("wheat"));
/// assert_eq!(encoder.index_of(&CropLabel::new("Rice")?), Some(0));
/// # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "Vec<CropLabel>", into = "Vec<CropLabel>")
)]
pub struct LabelEncoder {
    labels: Vec<CropLabel>,
}

impl LabelEncoder {
    /// Build an encoder from labels in class-index order.
    ///
    /// # Errors
    /// Returns [`LabelEncoderError`] for an empty list or a duplicate label.
    pub fn new(labels: Vec<CropLabel>) -> Result<Self, LabelEncoderError> {
        if labels.is_empty() {
            return Err(LabelEncoderError::Empty);
        }
        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if !seen.insert(label) {
                return Err(LabelEncoderError::Duplicate {
                    label: label.clone(),
                });
            }
        }
        Ok(Self { labels })
    }

    /// Build an encoder from raw names.
    ///
    /// # Errors
    /// Fails on a blank name as well as for the reasons listed on
    /// [`LabelEncoder::new`].
    pub fn from_names<I, S>(names: I) -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let labels = names
            .into_iter()
            .map(CropLabel::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(labels)?)
    }

    /// Number of classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always `false`; construction rejects empty encoders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label for a class index.
    #[must_use]
    pub fn label(&self, index: usize) -> Option<&CropLabel> {
        self.labels.get(index)
    }

    /// Class index for a label.
    #[must_use]
    pub fn index_of(&self, label: &CropLabel) -> Option<usize> {
        self.labels.iter().position(|candidate| candidate == label)
    }

    /// Iterate over labels in class-index order.
    pub fn iter(&self) -> std::slice::Iter<'_, CropLabel> {
        self.labels.iter()
    }
}

impl TryFrom<Vec<CropLabel>> for LabelEncoder {
    type Error = LabelEncoderError;

    fn try_from(labels: Vec<CropLabel>) -> Result<Self, Self::Error> {
        Self::new(labels)
    }
}

impl From<LabelEncoder> for Vec<CropLabel> {
    fn from(encoder: LabelEncoder) -> Self {
        encoder.labels
    }
}

impl<'a> IntoIterator for &'a LabelEncoder {
    type Item = &'a CropLabel;
    type IntoIter = std::slice::Iter<'a, CropLabel>;

    fn into_iter(self) -> Self::IntoIter {
        self.labels.iter()
    }
}

/// Predict crop suitability from soil and climate readings.
///
/// Implementations must be deterministic for fixed parameters and thread-safe
/// (`Send` + `Sync`) so one classifier can serve concurrent requests. The
/// returned vector must have exactly [`LabelEncoder::len`] entries.
///
/// # Examples
/// ```rust
/// use agrirank_core::{
///     ClassifierError, CropClassifier, FeatureVector, LabelEncoder, ProbabilityVector,
/// };
///
/// struct Uniform(LabelEncoder);
///
/// impl CropClassifier for Uniform {
///     fn labels(&self) -> &LabelEncoder {
///         &self.0
///     }
///
///     fn predict(&self, _features: &FeatureVector) -> Result<ProbabilityVector, ClassifierError> {
///         ProbabilityVector::new(vec![0.5, 0.5]).map_err(|err| ClassifierError::Inference {
///             reason: err.to_string(),
///         })
///     }
/// }
///
/// let classifier = Uniform(LabelEncoder::from_names(["rice", "wheat"]).expect("labels"));
/// let features = FeatureVector::try_from(&[90.0, 42.0, 43.0, 21.0, 82.0, 6.5, 200.0][..])
///     .expect("valid readings");
/// let probs = classifier.predict(&features).expect("prediction");
/// assert_eq!(probs.len(), classifier.labels().len());
/// ```
pub trait CropClassifier: Send + Sync {
    /// Labels in class-index order.
    fn labels(&self) -> &LabelEncoder;

    /// Return one probability per class for `features`.
    ///
    /// # Errors
    /// Returns [`ClassifierError`] when the model is unavailable or inference
    /// fails.
    fn predict(&self, features: &FeatureVector) -> Result<ProbabilityVector, ClassifierError>;
}

impl<C: CropClassifier + ?Sized> CropClassifier for Box<C> {
    fn labels(&self) -> &LabelEncoder {
        (**self).labels()
    }

    fn predict(&self, features: &FeatureVector) -> Result<ProbabilityVector, ClassifierError> {
        (**self).predict(features)
    }
}
