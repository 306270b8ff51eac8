//! Command-line interface for the agrirank crop recommender.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod build_graph;
mod error;
mod recommend;

use build_graph::{BuildGraphArgs, run_build_graph};
pub use error::CliError;
use recommend::{RecommendArgs, run_recommend};

pub(crate) const ARG_REQUEST: &str = "request";
pub(crate) const ARG_ARTEFACTS_DIR: &str = "artefacts-dir";
pub(crate) const ARG_MODEL: &str = "model";
pub(crate) const ARG_FACTS: &str = "facts";
pub(crate) const ARG_TOP_K: &str = "top-k";
pub(crate) const ARG_FACT_TIMEOUT_MS: &str = "fact-timeout-ms";
pub(crate) const ARG_FACT_RETRIES: &str = "fact-retries";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ARG_DEFINITION: &str = "definition";
pub(crate) const ENV_REQUEST: &str = "AGRIRANK_CMDS_RECOMMEND_REQUEST_PATH";

/// Run the agrirank CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments or configuration are invalid, an
/// artefact cannot be read or written, or the recommendation fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Recommend(args) => run_recommend(args),
        Command::BuildGraph(args) => run_build_graph(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "agrirank",
    about = "Hybrid crop recommendations from soil readings and agronomic facts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rank crops for a JSON recommendation request.
    Recommend(RecommendArgs),
    /// Write the agronomic fact graph to SQLite.
    BuildGraph(BuildGraphArgs),
}

#[cfg(test)]
mod tests;
