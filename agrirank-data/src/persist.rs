//! Writing fact graphs to the SQLite fact store.
#![forbid(unsafe_code)]

use agrirank_core::{FactGraph, PersistFactsError, PersistSummary, persist_fact_graph};
use agrirank_fs::ensure_parent_dir;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use rusqlite::Connection;
use thiserror::Error;

/// File name of the fact store inside an artefacts directory.
pub const DEFAULT_FACTS_FILE: &str = "facts.db";

/// Errors raised while writing `facts.db`.
#[derive(Debug, Error)]
pub enum WriteGraphError {
    /// The parent directory could not be created.
    #[error("failed to create parent directory for {path}")]
    CreateDirectory {
        /// Target database path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// The database could not be opened or created.
    #[error("failed to open SQLite database at {path}")]
    Open {
        /// Target database path.
        path: Utf8PathBuf,
        /// Source error from `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// Creating the schema or inserting rows failed.
    #[error("failed to write fact graph to {path}")]
    Persist {
        /// Target database path.
        path: Utf8PathBuf,
        /// Persistence failure.
        #[source]
        source: PersistFactsError,
    },
}

/// Write `graph` to the SQLite database at `path`.
///
/// The database and its parent directory are created when missing. Existing
/// rows are kept; only new nodes and facts are inserted, all inside one
/// transaction.
///
/// # Errors
/// Returns [`WriteGraphError`] when the directory, database or rows cannot be
/// written.
pub fn write_fact_graph(
    path: &Utf8Path,
    graph: &FactGraph,
) -> Result<PersistSummary, WriteGraphError> {
    ensure_parent_dir(path).map_err(|source| WriteGraphError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })?;
    let mut connection =
        Connection::open(path.as_std_path()).map_err(|source| WriteGraphError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    let summary =
        persist_fact_graph(&mut connection, graph).map_err(|source| WriteGraphError::Persist {
            path: path.to_path_buf(),
            source,
        })?;
    info!(
        "wrote fact graph to {path}: {} new nodes, {} new facts",
        summary.nodes_inserted, summary.facts_inserted
    );
    Ok(summary)
}
