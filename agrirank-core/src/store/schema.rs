//! SQLite layout of the fact graph and idempotent persistence.
//!
//! Nodes live in `fact_nodes(kind, name)` and facts in
//! `fact_edges(relation, source, target)`. Every name is stored lowercase,
//! so readers compare canonical labels with plain equality.

use rusqlite::{Connection, OptionalExtension, Transaction};
use thiserror::Error;

use crate::FactGraph;

/// Version recorded in `fact_schema_version`.
pub const FACT_SCHEMA_VERSION: i64 = 1;

/// Tables a readable fact graph must contain.
pub(crate) const REQUIRED_TABLES: [&str; 3] = ["fact_nodes", "fact_edges", "fact_schema_version"];

/// Errors raised while creating the schema or writing facts.
#[derive(Debug, Error)]
pub enum PersistFactsError {
    /// A schema or write statement failed.
    #[error("failed to {operation}")]
    Sqlite {
        /// Step that failed.
        operation: &'static str,
        /// Source error from `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The database already holds a different schema version.
    #[error("fact schema version {found} is not supported (expected {expected})")]
    UnsupportedVersion {
        /// Version found on disk.
        found: i64,
        /// Version this build writes.
        expected: i64,
    },
}

/// Rows written by [`persist_fact_graph`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    /// Nodes inserted by this call.
    pub nodes_inserted: usize,
    /// Facts inserted by this call.
    pub facts_inserted: usize,
}

fn sqlite_step(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> PersistFactsError {
    move |source| PersistFactsError::Sqlite { operation, source }
}

/// Create the fact tables when missing and check the stored version.
///
/// # Errors
/// Returns [`PersistFactsError`] when a statement fails or the stored version
/// differs from [`FACT_SCHEMA_VERSION`].
pub fn initialise_fact_schema(connection: &mut Connection) -> Result<(), PersistFactsError> {
    let transaction = connection
        .transaction()
        .map_err(sqlite_step("begin schema transaction"))?;
    create_tables(&transaction)?;
    ensure_schema_version(&transaction)?;
    transaction
        .commit()
        .map_err(sqlite_step("commit schema transaction"))
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), PersistFactsError> {
    transaction
        .execute_batch(
            "CREATE TABLE IF NOT EXISTS fact_schema_version (
                version INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS fact_nodes (
                kind TEXT NOT NULL CHECK (kind IN ('crop', 'season', 'soil')),
                name TEXT NOT NULL CHECK (length(trim(name)) > 0 AND name = lower(name)),
                PRIMARY KEY (kind, name)
            ) WITHOUT ROWID;
            CREATE TABLE IF NOT EXISTS fact_edges (
                relation TEXT NOT NULL
                    CHECK (relation IN ('ROTATION_WITH', 'SUITABLE_FOR', 'GROWS_IN')),
                source TEXT NOT NULL CHECK (source = lower(source)),
                target TEXT NOT NULL CHECK (target = lower(target)),
                PRIMARY KEY (relation, source, target)
            ) WITHOUT ROWID;
            CREATE INDEX IF NOT EXISTS idx_fact_edges_target
                ON fact_edges(relation, target, source);",
        )
        .map_err(sqlite_step("create fact tables"))
}

fn ensure_schema_version(transaction: &Transaction<'_>) -> Result<(), PersistFactsError> {
    let found: Option<i64> = transaction
        .query_row("SELECT version FROM fact_schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(sqlite_step("read schema version"))?;
    match found {
        Some(version) if version == FACT_SCHEMA_VERSION => Ok(()),
        Some(version) => Err(PersistFactsError::UnsupportedVersion {
            found: version,
            expected: FACT_SCHEMA_VERSION,
        }),
        None => transaction
            .execute(
                "INSERT INTO fact_schema_version (version) VALUES (?1)",
                [FACT_SCHEMA_VERSION],
            )
            .map(|_| ())
            .map_err(sqlite_step("record schema version")),
    }
}

/// Write every node and fact of `graph`, skipping rows already present.
///
/// The schema is created first when missing. All rows are written inside one
/// transaction, so a failure leaves the database unchanged.
///
/// # Errors
/// Returns [`PersistFactsError`] when the schema cannot be initialised or a
/// write fails.
///
/// # Examples
/// ```
/// use agrirank_core::{CropLabel, Fact, FactGraph, Season, persist_fact_graph};
/// use rusqlite::Connection;
///
/// let mut graph = FactGraph::new();
/// graph.add_fact(Fact::SuitableFor {
///     crop: CropLabel::new("Wheat").expect("label"),
///     season: Season::Rabi,
/// });
///
/// let mut conn = Connection::open_in_memory().expect("open in-memory database");
/// let first = persist_fact_graph(&mut conn, &graph).expect("persist facts");
/// assert_eq!(first.facts_inserted, 1);
/// let second = persist_fact_graph(&mut conn, &graph).expect("persist facts again");
/// assert_eq!(second.facts_inserted, 0);
/// ```
pub fn persist_fact_graph(
    connection: &mut Connection,
    graph: &FactGraph,
) -> Result<PersistSummary, PersistFactsError> {
    initialise_fact_schema(connection)?;

    let transaction = connection
        .transaction()
        .map_err(sqlite_step("begin persistence transaction"))?;
    let mut summary = PersistSummary::default();
    {
        let mut insert_node = transaction
            .prepare_cached("INSERT OR IGNORE INTO fact_nodes (kind, name) VALUES (?1, ?2)")
            .map_err(sqlite_step("prepare insert node"))?;
        let mut insert_edge = transaction
            .prepare_cached(
                "INSERT OR IGNORE INTO fact_edges (relation, source, target) VALUES (?1, ?2, ?3)",
            )
            .map_err(sqlite_step("prepare insert fact"))?;

        for node in graph.nodes() {
            summary.nodes_inserted += insert_node
                .execute((node.kind.as_str(), node.name.as_str()))
                .map_err(sqlite_step("insert node"))?;
        }
        for fact in graph.facts() {
            let (source, target) = fact.endpoints();
            summary.facts_inserted += insert_edge
                .execute((fact.relation().as_str(), source, target))
                .map_err(sqlite_step("insert fact"))?;
        }
    }
    transaction
        .commit()
        .map_err(sqlite_step("commit persistence transaction"))?;

    Ok(summary)
}
