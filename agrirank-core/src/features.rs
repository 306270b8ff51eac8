//! Validated soil and climate readings fed to the classifier.
//!
//! Readings are checked once at the boundary; downstream components receive a
//! [`FeatureVector`] and never re-validate.

use thiserror::Error;

/// Number of readings in a [`FeatureVector`].
pub const FEATURE_COUNT: usize = 7;

/// Feature names in classifier input order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "nitrogen",
    "phosphorus",
    "potassium",
    "temperature",
    "humidity",
    "ph",
    "rainfall",
];

/// Inclusive bounds per feature; `None` means unbounded on that side.
const FEATURE_BOUNDS: [(Option<f64>, Option<f64>); FEATURE_COUNT] = [
    (Some(0.0), None),
    (Some(0.0), None),
    (Some(0.0), None),
    (None, None),
    (Some(0.0), Some(100.0)),
    (Some(0.0), Some(14.0)),
    (Some(0.0), None),
];

/// Errors raised while validating readings.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureVectorError {
    /// The caller supplied the wrong number of readings.
    #[error("expected {expected} readings, found {found}")]
    WrongDimension {
        /// Required number of readings.
        expected: usize,
        /// Number of readings supplied.
        found: usize,
    },
    /// A reading was NaN or infinite.
    #[error("{feature} must be a finite number")]
    NonFinite {
        /// Name of the offending feature.
        feature: &'static str,
    },
    /// A reading fell outside its physical range.
    #[error("{feature} = {value} is outside the accepted range {}", describe_range(.min, .max))]
    OutOfRange {
        /// Name of the offending feature.
        feature: &'static str,
        /// Value supplied.
        value: f64,
        /// Inclusive lower bound, if any.
        min: Option<f64>,
        /// Inclusive upper bound, if any.
        max: Option<f64>,
    },
}

fn describe_range(min: &Option<f64>, max: &Option<f64>) -> String {
    match (*min, *max) {
        (Some(lo), Some(hi)) => format!("{lo}..={hi}"),
        (Some(lo), None) => format!(">= {lo}"),
        (None, Some(hi)) => format!("<= {hi}"),
        (None, None) => String::from("(unbounded)"),
    }
}

/// Raw readings with named fields, as accepted from request payloads.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoilReadings {
    /// Nitrogen content of the soil (kg/ha).
    pub nitrogen: f64,
    /// Phosphorus content of the soil (kg/ha).
    pub phosphorus: f64,
    /// Potassium content of the soil (kg/ha).
    pub potassium: f64,
    /// Mean air temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Soil pH.
    pub ph: f64,
    /// Rainfall in millimetres.
    pub rainfall: f64,
}

impl SoilReadings {
    const fn to_array(self) -> [f64; FEATURE_COUNT] {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }
}

/// Immutable, validated classifier input in [`FEATURE_NAMES`] order.
///
/// # Examples
/// ```
/// use agrirank_core::{FeatureVector, SoilReadings};
///
/// let readings = SoilReadings {
///     nitrogen: 90.0,
///     phosphorus: 42.0,
///     potassium: 43.0,
///     temperature: 21.0,
///     humidity: 82.0,
///     ph: 6.5,
///     rainfall: 200.0,
/// };
/// let features = FeatureVector::try_from(readings)?;
/// assert_eq!(features.as_array()[5], 6.5);
///
/// assert!(FeatureVector::try_from(&[1.0, 2.0][..]).is_err());
/// # Ok::<(), agrirank_core::FeatureVectorError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    fn validate(values: [f64; FEATURE_COUNT]) -> Result<Self, FeatureVectorError> {
        for ((&value, feature), (min, max)) in
            values.iter().zip(FEATURE_NAMES).zip(FEATURE_BOUNDS)
        {
            if !value.is_finite() {
                return Err(FeatureVectorError::NonFinite { feature });
            }
            let below = min.is_some_and(|lo| value < lo);
            let above = max.is_some_and(|hi| value > hi);
            if below || above {
                return Err(FeatureVectorError::OutOfRange {
                    feature,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(Self(values))
    }

    /// Borrow the readings in classifier input order.
    #[must_use]
    pub const fn as_array(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    /// Iterate over `(name, value)` pairs.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.into_iter().zip(self.0.iter().copied())
    }
}

impl TryFrom<SoilReadings> for FeatureVector {
    type Error = FeatureVectorError;

    fn try_from(readings: SoilReadings) -> Result<Self, Self::Error> {
        Self::validate(readings.to_array())
    }
}

impl TryFrom<&[f64]> for FeatureVector {
    type Error = FeatureVectorError;

    fn try_from(values: &[f64]) -> Result<Self, Self::Error> {
        let array: [f64; FEATURE_COUNT] =
            values
                .try_into()
                .map_err(|_| FeatureVectorError::WrongDimension {
                    expected: FEATURE_COUNT,
                    found: values.len(),
                })?;
        Self::validate(array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn readings() -> SoilReadings {
        SoilReadings {
            nitrogen: 90.0,
            phosphorus: 42.0,
            potassium: 43.0,
            temperature: 21.0,
            humidity: 82.0,
            ph: 6.5,
            rainfall: 200.0,
        }
    }

    #[rstest]
    fn named_and_slice_forms_agree(readings: SoilReadings) {
        let named = FeatureVector::try_from(readings).expect("valid readings");
        let ordered = [90.0, 42.0, 43.0, 21.0, 82.0, 6.5, 200.0];
        let sliced = FeatureVector::try_from(&ordered[..]).expect("valid readings");
        assert_eq!(named, sliced);
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(8)]
    fn rejects_wrong_dimension(#[case] len: usize) {
        let values = vec![1.0; len];
        let err = FeatureVector::try_from(values.as_slice()).expect_err("wrong length");
        assert_eq!(
            err,
            FeatureVectorError::WrongDimension {
                expected: FEATURE_COUNT,
                found: len
            }
        );
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn rejects_non_finite(mut readings: SoilReadings, #[case] bad: f64) {
        readings.temperature = bad;
        let err = FeatureVector::try_from(readings).expect_err("non-finite reading");
        assert_eq!(
            err,
            FeatureVectorError::NonFinite {
                feature: "temperature"
            }
        );
    }

    #[rstest]
    fn rejects_negative_nitrogen(mut readings: SoilReadings) {
        readings.nitrogen = -1.0;
        let err = FeatureVector::try_from(readings).expect_err("negative nitrogen");
        assert!(matches!(
            err,
            FeatureVectorError::OutOfRange {
                feature: "nitrogen",
                ..
            }
        ));
    }

    #[rstest]
    #[case(-0.1)]
    #[case(14.1)]
    fn rejects_ph_outside_scale(mut readings: SoilReadings, #[case] ph: f64) {
        readings.ph = ph;
        let err = FeatureVector::try_from(readings).expect_err("pH out of range");
        assert!(err.to_string().contains("0..=14"), "message: {err}");
    }

    #[rstest]
    #[case(0.0)]
    #[case(100.0)]
    fn accepts_humidity_bounds(mut readings: SoilReadings, #[case] humidity: f64) {
        readings.humidity = humidity;
        assert!(FeatureVector::try_from(readings).is_ok());
    }

    #[rstest]
    fn accepts_sub_zero_temperature(mut readings: SoilReadings) {
        readings.temperature = -5.0;
        assert!(FeatureVector::try_from(readings).is_ok());
    }

    #[rstest]
    fn named_pairs_follow_input_order(readings: SoilReadings) {
        let features = FeatureVector::try_from(readings).expect("valid readings");
        let names: Vec<_> = features.named().map(|(name, _)| name).collect();
        assert_eq!(names, FEATURE_NAMES);
    }
}
