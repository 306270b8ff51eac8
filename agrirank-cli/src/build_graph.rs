//! Build-graph command: write the agronomic fact graph to SQLite.

use std::io::Write;

use agrirank_core::FactGraph;
use agrirank_data::{DEFAULT_FACTS_FILE, load_graph_definition, reference_graph, write_fact_graph};
use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::recommend::{require_existing, write_json};
use crate::{ARG_DEFINITION, ARG_OUTPUT, CliError};

/// CLI arguments for the `build-graph` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Write crops, seasons, soils and their relations to the \
                 SQLite fact store. The built-in reference catalogue is used \
                 unless a JSON graph definition is supplied. Existing rows \
                 are kept, so rebuilding is idempotent.",
    about = "Write the fact graph to SQLite"
)]
#[ortho_config(prefix = "AGRIRANK")]
pub(crate) struct BuildGraphArgs {
    /// Destination database; defaults to `facts.db` in the working directory.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// JSON graph definition to write instead of the reference catalogue.
    #[arg(long = ARG_DEFINITION, value_name = "path")]
    #[serde(default)]
    pub(crate) definition: Option<Utf8PathBuf>,
}

impl BuildGraphArgs {
    pub(crate) fn into_config(self) -> Result<BuildGraphConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        Ok(BuildGraphConfig::from(merged))
    }
}

/// Resolved `build-graph` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BuildGraphConfig {
    pub(crate) output: Utf8PathBuf,
    pub(crate) definition: Option<Utf8PathBuf>,
}

impl BuildGraphConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        match &self.definition {
            Some(definition) => require_existing(definition, ARG_DEFINITION),
            None => Ok(()),
        }
    }

    fn load_graph(&self) -> Result<FactGraph, CliError> {
        match &self.definition {
            Some(definition) => Ok(load_graph_definition(definition).map_err(Box::new)?),
            None => reference_graph().map_err(CliError::ReferenceCatalogue),
        }
    }
}

impl From<BuildGraphArgs> for BuildGraphConfig {
    fn from(args: BuildGraphArgs) -> Self {
        Self {
            output: args
                .output
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_FACTS_FILE)),
            definition: args.definition,
        }
    }
}

/// Summary printed after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct BuildGraphReport {
    pub(crate) output: Utf8PathBuf,
    pub(crate) nodes_inserted: usize,
    pub(crate) facts_inserted: usize,
}

pub(super) fn run_build_graph(args: BuildGraphArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_build_graph_with(args, &mut stdout)
}

pub(super) fn run_build_graph_with(
    args: BuildGraphArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = execute_build_graph(&config)?;
    write_json(writer, &report)
}

pub(super) fn execute_build_graph(config: &BuildGraphConfig) -> Result<BuildGraphReport, CliError> {
    config.validate_sources()?;
    let graph = config.load_graph()?;
    let summary = write_fact_graph(&config.output, &graph).map_err(Box::new)?;
    Ok(BuildGraphReport {
        output: config.output.clone(),
        nodes_inserted: summary.nodes_inserted,
        facts_inserted: summary.facts_inserted,
    })
}
