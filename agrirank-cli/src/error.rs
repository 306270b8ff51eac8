//! Error types emitted by the agrirank CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use agrirank_core::{RecommendError, SqliteFactStoreError};
use agrirank_data::{LoadGraphError, WriteGraphError};
use agrirank_model::ModelLoadError;
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors emitted by the agrirank CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// An option was supplied with a value the command cannot use.
    #[error("invalid value for --{field}: {reason}")]
    InvalidArgument {
        field: &'static str,
        reason: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the recommendation request file failed.
    #[error("failed to open recommendation request at {path:?}: {source}")]
    OpenRequest {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Request JSON could not be decoded.
    #[error("failed to parse recommendation request JSON at {path:?}: {source}")]
    ParseRequest {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Loading the crop model artefact failed.
    #[error(transparent)]
    LoadModel(#[from] Box<ModelLoadError>),
    /// Opening the fact store failed.
    #[error(transparent)]
    OpenFactStore(#[from] Box<SqliteFactStoreError>),
    /// The recommendation pipeline rejected the request or a dependency failed.
    #[error("recommendation for {path:?} failed: {source}")]
    Recommend {
        path: Utf8PathBuf,
        #[source]
        source: RecommendError,
    },
    /// Reading a fact graph definition failed.
    #[error(transparent)]
    LoadGraph(#[from] Box<LoadGraphError>),
    /// The built-in reference catalogue could not be assembled.
    #[error("reference catalogue is invalid: {0}")]
    ReferenceCatalogue(#[source] agrirank_core::CropLabelError),
    /// Writing the fact graph failed.
    #[error(transparent)]
    WriteGraph(#[from] Box<WriteGraphError>),
    /// Serialising command output failed.
    #[error("failed to serialise command output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write command output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
