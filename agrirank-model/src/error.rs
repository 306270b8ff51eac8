//! Error types raised while validating, loading or writing crop models.
#![forbid(unsafe_code)]

use agrirank_core::{CropLabelError, LabelEncoderError};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Model parameters that cannot form a usable classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelValidationError {
    /// A class label was blank.
    #[error("model label is invalid")]
    Label(#[from] CropLabelError),
    /// The label list was empty or repeated a label.
    #[error("model labels are invalid")]
    Labels(#[from] LabelEncoderError),
    /// A per-feature vector did not hold one value per feature.
    #[error("{field} has {found} entries, expected one per feature ({expected})")]
    FeatureDimension {
        /// Offending parameter.
        field: &'static str,
        /// Required length.
        expected: usize,
        /// Actual length.
        found: usize,
    },
    /// A per-class parameter did not hold one entry per label.
    #[error("{field} has {found} rows, expected one per class ({expected})")]
    ClassDimension {
        /// Offending parameter.
        field: &'static str,
        /// Required length.
        expected: usize,
        /// Actual length.
        found: usize,
    },
    /// A parameter was NaN or infinite.
    #[error("{field} contains a non-finite value at position {index}")]
    NonFinite {
        /// Offending parameter.
        field: &'static str,
        /// Flattened position of the value.
        index: usize,
    },
    /// A feature scale was zero, which would divide by zero.
    #[error("scale for feature {feature} must be non-zero")]
    ZeroScale {
        /// Feature name.
        feature: &'static str,
    },
}

/// Errors raised while loading `crop_model.bin`.
#[derive(Debug, Error)]
pub enum ModelLoadError {
    /// The artefact could not be opened.
    #[error("failed to open crop model at {path}")]
    Open {
        /// Requested artefact path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// The artefact could not be decoded.
    #[error("failed to decode crop model at {path}")]
    Decode {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Source error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// The artefact does not start with the model magic bytes.
    #[error("{path} is not a crop model (magic {found:?})")]
    BadMagic {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Bytes found in place of the magic.
        found: [u8; 4],
    },
    /// The artefact uses a format version this build cannot read.
    #[error("crop model at {path} has format version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Version recorded in the artefact.
        found: u16,
        /// Version supported by this build.
        expected: u16,
    },
    /// The decoded parameters are inconsistent.
    #[error("crop model at {path} is invalid")]
    Invalid {
        /// Artefact path.
        path: Utf8PathBuf,
        /// Validation failure.
        #[source]
        source: ModelValidationError,
    },
}

/// Errors raised while writing `crop_model.bin`.
#[derive(Debug, Error)]
pub enum ModelWriteError {
    /// The parameters were rejected before anything was written.
    #[error("refusing to write invalid crop model to {path}")]
    Invalid {
        /// Target artefact path.
        path: Utf8PathBuf,
        /// Validation failure.
        #[source]
        source: ModelValidationError,
    },
    /// The artefact or its directory could not be created.
    #[error("failed to create crop model at {path}")]
    Create {
        /// Target artefact path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// Encoding the parameters failed.
    #[error("failed to encode crop model into {path}")]
    Encode {
        /// Target artefact path.
        path: Utf8PathBuf,
        /// Source error from `bincode`.
        #[source]
        source: bincode::Error,
    },
    /// Flushing buffered output failed.
    #[error("failed to flush crop model to {path}")]
    Flush {
        /// Target artefact path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
}
