//! Reading and writing the `crop_model.bin` artefact.
//!
//! The file holds a bincode-encoded header (`AGRM` magic and a format
//! version) followed by the bincode-encoded [`ModelParameters`].
#![forbid(unsafe_code)]

use std::io::{BufReader, BufWriter, Write};

use bincode::Options;
use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};

use agrirank_core::CropClassifier;
use agrirank_fs::{create_artefact, open_artefact};

use crate::{ModelLoadError, ModelParameters, ModelWriteError, SoftmaxClassifier};

/// File name of the model inside an artefacts directory.
pub const DEFAULT_MODEL_FILE: &str = "crop_model.bin";
/// Magic bytes opening every model artefact.
pub const MODEL_MAGIC: [u8; 4] = *b"AGRM";
/// Artefact format version written and accepted by this build.
pub const MODEL_FORMAT_VERSION: u16 = 1;

/// Upper bound on bytes decoded from a single artefact section.
const MAX_SECTION_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Debug, Serialize, Deserialize)]
struct ArtefactHeader {
    magic: [u8; 4],
    version: u16,
}

/// Bincode options used for model artefacts.
#[must_use]
pub fn model_bincode_options() -> impl bincode::Options {
    bincode::DefaultOptions::new().with_limit(MAX_SECTION_BYTES)
}

/// Load and validate a model artefact.
///
/// # Errors
/// Returns [`ModelLoadError`] when the file cannot be read or decoded, the
/// header does not match, or the parameters fail validation.
pub fn load_model_file(path: &Utf8Path) -> Result<SoftmaxClassifier, ModelLoadError> {
    let file = open_artefact(path).map_err(|source| ModelLoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = BufReader::new(file);
    let decode = |source| ModelLoadError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let header: ArtefactHeader = model_bincode_options()
        .deserialize_from(&mut reader)
        .map_err(decode)?;
    if header.magic != MODEL_MAGIC {
        return Err(ModelLoadError::BadMagic {
            path: path.to_path_buf(),
            found: header.magic,
        });
    }
    if header.version != MODEL_FORMAT_VERSION {
        return Err(ModelLoadError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: header.version,
            expected: MODEL_FORMAT_VERSION,
        });
    }

    let parameters: ModelParameters = model_bincode_options()
        .deserialize_from(&mut reader)
        .map_err(decode)?;
    let model =
        SoftmaxClassifier::from_parameters(parameters).map_err(|source| ModelLoadError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        "loaded crop model from {path} ({} classes)",
        model.labels().len()
    );
    Ok(model)
}

/// Validate `parameters` and persist them as a model artefact.
///
/// The parent directory is created when missing. Nothing is written when
/// validation fails.
///
/// # Errors
/// Returns [`ModelWriteError`] when validation, file creation, encoding or
/// flushing fails.
pub fn write_model_file(
    path: &Utf8Path,
    parameters: &ModelParameters,
) -> Result<(), ModelWriteError> {
    SoftmaxClassifier::from_parameters(parameters.clone()).map_err(|source| {
        ModelWriteError::Invalid {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let file = create_artefact(path).map_err(|source| ModelWriteError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    let encode = |source| ModelWriteError::Encode {
        path: path.to_path_buf(),
        source,
    };
    let header = ArtefactHeader {
        magic: MODEL_MAGIC,
        version: MODEL_FORMAT_VERSION,
    };
    model_bincode_options()
        .serialize_into(&mut writer, &header)
        .map_err(encode)?;
    model_bincode_options()
        .serialize_into(&mut writer, parameters)
        .map_err(encode)?;
    writer.flush().map_err(|source| ModelWriteError::Flush {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "wrote crop model with {} classes to {path}",
        parameters.labels.len()
    );
    Ok(())
}
