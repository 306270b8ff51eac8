//! Inference-only crop classifier for agrirank.
//!
//! [`SoftmaxClassifier`] is a multinomial logistic model: readings are
//! standardised with stored means and scales, each class gets a logit
//! `w·x + b`, and a numerically stable softmax turns the logits into a
//! [`ProbabilityVector`](agrirank_core::ProbabilityVector). It implements
//! [`CropClassifier`](agrirank_core::CropClassifier) so the hybrid
//! recommender can use it directly.
//!
//! Trained parameters live in a `bincode` artefact (`crop_model.bin`) with a
//! short header: the magic bytes `AGRM` and a format version. Training is not
//! part of this crate; [`write_model_file`] exists so external tooling and
//! tests can produce artefacts in the expected format.
//!
//! # Examples
//!
//! ```no_run
//! use agrirank_core::CropClassifier;
//! use camino::Utf8Path;
//! use agrirank_model::load_model_file;
//!
//! let model = load_model_file(Utf8Path::new("artefacts/crop_model.bin"))
//!     .expect("load crop model");
//! println!("{} crop classes", model.labels().len());
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod artefact;
mod error;
mod parameters;
mod softmax;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use artefact::{
    DEFAULT_MODEL_FILE, MODEL_FORMAT_VERSION, MODEL_MAGIC, load_model_file, model_bincode_options,
    write_model_file,
};
pub use error::{ModelLoadError, ModelValidationError, ModelWriteError};
pub use parameters::ModelParameters;
pub use softmax::SoftmaxClassifier;
