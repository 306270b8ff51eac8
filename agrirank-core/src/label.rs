//! Canonical, case-insensitive names for crops and soils.
//!
//! Every label comparison in the engine goes through these newtypes so that
//! `"Rice"`, `"rice"` and `" RICE "` all refer to the same crop.

use std::fmt;

use thiserror::Error;

/// Errors returned when constructing a [`CropLabel`] or [`SoilType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CropLabelError {
    /// The label was empty after trimming whitespace.
    #[error("label must not be empty")]
    Empty,
}

fn canonicalise(raw: &str) -> Result<String, CropLabelError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CropLabelError::Empty);
    }
    Ok(trimmed.to_lowercase())
}

/// A crop name in canonical (trimmed, lowercase) form.
///
/// # Examples
/// ```
/// use agrirank_core::CropLabel;
///
/// let label = CropLabel::new(" Rice ")?;
/// assert_eq!(label.as_str(), "rice");
/// assert_eq!(label, CropLabel::new("RICE")?);
/// # Ok::<(), agrirank_core::CropLabelError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct CropLabel(String);

impl CropLabel {
    /// Validate and canonicalise a crop name.
    ///
    /// # Errors
    /// Returns [`CropLabelError::Empty`] when `raw` is blank.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CropLabelError> {
        canonicalise(raw.as_ref()).map(Self)
    }

    /// Borrow the canonical name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CropLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for CropLabel {
    type Err = CropLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CropLabel {
    type Error = CropLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CropLabel> for String {
    fn from(label: CropLabel) -> Self {
        label.0
    }
}

impl AsRef<str> for CropLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A soil classification in canonical form, e.g. `"sandy loam"`.
///
/// Soils only appear in `GROWS_IN` facts; the ranking pipeline never reads
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct SoilType(String);

impl SoilType {
    /// Validate and canonicalise a soil name.
    ///
    /// # Errors
    /// Returns [`CropLabelError::Empty`] when `raw` is blank.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CropLabelError> {
        canonicalise(raw.as_ref()).map(Self)
    }

    /// Borrow the canonical name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for SoilType {
    type Error = CropLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SoilType> for String {
    fn from(soil: SoilType) -> Self {
        soil.0
    }
}
