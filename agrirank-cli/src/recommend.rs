//! Recommend command implementation for the agrirank CLI.

use std::io::{BufReader, Write};
use std::time::Duration;

use agrirank_core::{
    CropClassifier, DEFAULT_QUERY_DEADLINE, FactStore, HybridRecommender, MAX_QUERY_DEADLINE,
    RecommendQuery, RecommendationResult, RetryPolicy, RetryingFactStore, SqliteFactStore,
};
use agrirank_data::DEFAULT_FACTS_FILE;
use agrirank_fs::open_artefact;
use agrirank_model::{DEFAULT_MODEL_FILE, load_model_file};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ARTEFACTS_DIR, ARG_FACT_RETRIES, ARG_FACT_TIMEOUT_MS, ARG_FACTS, ARG_MODEL, ARG_REQUEST,
    ARG_TOP_K, CliError, ENV_REQUEST,
};

/// CLI arguments for the `recommend` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Rank crops for a JSON-encoded request by loading the crop \
                 model (crop_model.bin) and querying the fact store \
                 (facts.db) for rotation and season rules.",
    about = "Recommend crops for a request"
)]
#[ortho_config(prefix = "AGRIRANK")]
pub(crate) struct RecommendArgs {
    /// Path to a JSON file containing the request.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) request_path: Option<Utf8PathBuf>,
    /// Directory containing the default artefact filenames.
    #[arg(long = ARG_ARTEFACTS_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) artefacts_dir: Option<Utf8PathBuf>,
    /// Override the path to the crop model (`crop_model.bin`).
    #[arg(long = ARG_MODEL, value_name = "path")]
    #[serde(default)]
    pub(crate) model: Option<Utf8PathBuf>,
    /// Override the path to the SQLite fact store (`facts.db`).
    #[arg(long = ARG_FACTS, value_name = "path")]
    #[serde(default)]
    pub(crate) facts: Option<Utf8PathBuf>,
    /// Shortlist length; overrides `top_k` in the request.
    #[arg(long = ARG_TOP_K, value_name = "n")]
    #[serde(default)]
    pub(crate) top_k: Option<usize>,
    /// Deadline for each fact-store query, in milliseconds.
    #[arg(long = ARG_FACT_TIMEOUT_MS, value_name = "ms")]
    #[serde(default)]
    pub(crate) fact_timeout_ms: Option<u64>,
    /// Retries after a timed-out or unavailable fact query.
    #[arg(long = ARG_FACT_RETRIES, value_name = "n")]
    #[serde(default)]
    pub(crate) fact_retries: Option<u32>,
}

impl RecommendArgs {
    pub(crate) fn into_config(self) -> Result<RecommendConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecommendConfig::try_from(merged)
    }
}

/// Resolved `recommend` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecommendConfig {
    /// Path to the JSON request file.
    pub(crate) request_path: Utf8PathBuf,
    /// Path to the crop model artefact.
    pub(crate) model: Utf8PathBuf,
    /// Path to the SQLite fact store.
    pub(crate) facts: Utf8PathBuf,
    /// Shortlist override applied to the request.
    pub(crate) top_k: Option<usize>,
    /// Per-query fact-store deadline.
    pub(crate) fact_deadline: Duration,
    /// Retry policy for transient fact-store failures.
    pub(crate) retry: RetryPolicy,
}

impl RecommendConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing(&self.request_path, ARG_REQUEST)?;
        require_existing(&self.model, ARG_MODEL)?;
        require_existing(&self.facts, ARG_FACTS)?;
        Ok(())
    }
}

pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match agrirank_fs::is_regular_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => match agrirank_fs::artefact_exists(path) {
            Ok(true) => Err(CliError::SourcePathNotFile {
                field,
                path: path.to_path_buf(),
            }),
            Ok(false) => Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            }),
            Err(source) => Err(inspect_error(path, field, source)),
        },
        Err(source) => Err(inspect_error(path, field, source)),
    }
}

fn inspect_error(path: &Utf8Path, field: &'static str, source: std::io::Error) -> CliError {
    CliError::InspectSourcePath {
        field,
        path: path.to_path_buf(),
        source,
    }
}

impl TryFrom<RecommendArgs> for RecommendConfig {
    type Error = CliError;

    fn try_from(args: RecommendArgs) -> Result<Self, Self::Error> {
        let request_path = args.request_path.ok_or(CliError::MissingArgument {
            field: ARG_REQUEST,
            env: ENV_REQUEST,
        })?;

        let artefacts_dir = args.artefacts_dir.unwrap_or_else(|| Utf8PathBuf::from("."));
        let model = args
            .model
            .unwrap_or_else(|| artefacts_dir.join(DEFAULT_MODEL_FILE));
        let facts = args
            .facts
            .unwrap_or_else(|| artefacts_dir.join(DEFAULT_FACTS_FILE));

        let fact_deadline = match args.fact_timeout_ms {
            Some(0) => {
                return Err(CliError::InvalidArgument {
                    field: ARG_FACT_TIMEOUT_MS,
                    reason: "the deadline must be at least one millisecond",
                });
            }
            Some(millis) => Duration::from_millis(millis),
            None => DEFAULT_QUERY_DEADLINE,
        };
        if fact_deadline > MAX_QUERY_DEADLINE {
            return Err(CliError::InvalidArgument {
                field: ARG_FACT_TIMEOUT_MS,
                reason: "the deadline must not exceed 2147483647 milliseconds",
            });
        }
        let mut retry = RetryPolicy::default();
        if let Some(max_retries) = args.fact_retries {
            retry.max_retries = max_retries;
        }

        Ok(Self {
            request_path,
            model,
            facts,
            top_k: args.top_k,
            fact_deadline,
            retry,
        })
    }
}

/// A classifier and fact store ready to serve one invocation.
pub(crate) struct RecommendPipeline {
    pub(crate) recommender: HybridRecommender<Box<dyn CropClassifier>>,
    pub(crate) store: Box<dyn FactStore>,
}

/// Builds the pipeline for the current recommend invocation.
pub(super) trait RecommendPipelineBuilder {
    fn build(&self, config: &RecommendConfig) -> Result<RecommendPipeline, CliError>;
}

pub(super) struct DefaultRecommendPipelineBuilder;

impl RecommendPipelineBuilder for DefaultRecommendPipelineBuilder {
    fn build(&self, config: &RecommendConfig) -> Result<RecommendPipeline, CliError> {
        let classifier: Box<dyn CropClassifier> =
            Box::new(load_model_file(&config.model).map_err(Box::new)?);
        let store = SqliteFactStore::open_with_deadline(
            config.facts.as_std_path(),
            config.fact_deadline,
        )
        .map_err(Box::new)?;
        Ok(RecommendPipeline {
            recommender: HybridRecommender::new(classifier),
            store: Box::new(RetryingFactStore::new(store, config.retry)),
        })
    }
}

pub(super) fn run_recommend(args: RecommendArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    let builder = DefaultRecommendPipelineBuilder;
    run_recommend_with(args, &builder, &mut stdout)
}

pub(super) fn run_recommend_with(
    args: RecommendArgs,
    builder: &dyn RecommendPipelineBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let result = execute_recommend(args, builder)?;
    write_recommendations(writer, &result)
}

fn execute_recommend(
    args: RecommendArgs,
    builder: &dyn RecommendPipelineBuilder,
) -> Result<RecommendationResult, CliError> {
    let config = resolve_recommend_config(args)?;
    let mut query = load_request(&config.request_path)?;
    if let Some(top_k) = config.top_k {
        query.top_k = Some(top_k);
    }
    let pipeline = builder.build(&config)?;
    pipeline
        .recommender
        .recommend_query(query, pipeline.store.as_ref())
        .map_err(|source| CliError::Recommend {
            path: config.request_path.clone(),
            source,
        })
}

fn resolve_recommend_config(args: RecommendArgs) -> Result<RecommendConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

/// Loads a JSON-encoded [`RecommendQuery`] from disk.
pub(super) fn load_request(path: &Utf8Path) -> Result<RecommendQuery, CliError> {
    let file = open_artefact(path).map_err(|source| CliError::OpenRequest {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|source| CliError::ParseRequest {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_json<T: Serialize>(writer: &mut dyn Write, value: &T) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

fn write_recommendations(
    writer: &mut dyn Write,
    result: &RecommendationResult,
) -> Result<(), CliError> {
    write_json(writer, result)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RecommendConfig, CliError> {
    let merged = RecommendArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RecommendConfig::try_from(merged)
}
