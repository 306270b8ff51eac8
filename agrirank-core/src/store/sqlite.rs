//! SQLite-backed fact store.
//!
//! Each [`SqliteFactStore`] owns one read-only connection, so a store value is
//! a session: callers open one per request (or per worker) and the connection
//! is released when the value drops.

use std::{
    collections::HashSet,
    fmt,
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use rusqlite::{Connection, ErrorCode, OpenFlags, OptionalExtension, params_from_iter};
use thiserror::Error;

use super::schema::{FACT_SCHEMA_VERSION, REQUIRED_TABLES};
use super::{FactStore, FactStoreError};
use crate::{CropLabel, RelationKind, Season};

/// Deadline applied to each query unless configured otherwise.
pub const DEFAULT_QUERY_DEADLINE: Duration = Duration::from_secs(2);

/// Longest accepted deadline. SQLite stores the busy timeout as an `i32` of
/// milliseconds.
pub const MAX_QUERY_DEADLINE: Duration = Duration::from_millis(i32::MAX as u64);

/// SQLite limits bound parameters per statement to 999 by default. Batched
/// queries chunk their `IN` lists to remain below that ceiling.
const SQLITE_MAX_VARIABLE_NUMBER: usize = 999;

/// Parameters bound ahead of the `IN` list in batched queries.
const FIXED_BATCH_PARAMETERS: usize = 2;

/// Virtual-machine steps between deadline checks.
const PROGRESS_CHECK_INTERVAL: i32 = 1_000;

/// Error raised when opening a fact database.
#[derive(Debug, Error)]
pub enum SqliteFactStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open fact database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// The database lacks one of the fact tables.
    #[error("fact database at {path} has no `{table}` table")]
    MissingTable {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Name of the missing table.
        table: &'static str,
    },
    /// The database was written by an incompatible schema version.
    #[error("fact database at {path} uses schema version {found}, expected {expected}")]
    UnsupportedVersion {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Version stored in the database.
        found: i64,
        /// Version this build reads.
        expected: i64,
    },
    /// The per-query deadline exceeds [`MAX_QUERY_DEADLINE`].
    #[error("query deadline of {deadline:?} exceeds the maximum of {max:?}")]
    InvalidDeadline {
        /// Requested deadline.
        deadline: Duration,
        /// Longest deadline SQLite can honour.
        max: Duration,
    },
    /// A statement run while validating the database failed.
    #[error("failed to {operation} in fact database at {path}")]
    Database {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Step that failed.
        operation: &'static str,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
}

/// Read-only [`FactStore`] over a `facts.db` SQLite file.
///
/// # Examples
/// ```no_run
/// use agrirank_core::{CropLabel, FactStore, Season, SqliteFactStore};
///
/// let store = SqliteFactStore::open("artefacts/facts.db").expect("open fact store");
/// let wheat = CropLabel::new("wheat").expect("label");
/// let suited = store.season_suitable(&wheat, Season::Rabi).expect("query");
/// println!("wheat suits rabi: {suited}");
/// ```
pub struct SqliteFactStore {
    connection: Connection,
    path: PathBuf,
    deadline: Duration,
}

impl fmt::Debug for SqliteFactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteFactStore")
            .field("path", &self.path)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

impl SqliteFactStore {
    /// Open a store with [`DEFAULT_QUERY_DEADLINE`].
    ///
    /// # Errors
    /// Returns [`SqliteFactStoreError`] when the file cannot be opened or does
    /// not hold a fact graph.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteFactStoreError> {
        Self::open_with_deadline(path, DEFAULT_QUERY_DEADLINE)
    }

    /// Open a store whose queries each run under `deadline`.
    ///
    /// # Errors
    /// Returns [`SqliteFactStoreError::InvalidDeadline`] when `deadline` is
    /// longer than [`MAX_QUERY_DEADLINE`], and other [`SqliteFactStoreError`]
    /// variants when the file cannot be opened or does not hold a fact graph.
    pub fn open_with_deadline<P: AsRef<Path>>(
        path: P,
        deadline: Duration,
    ) -> Result<Self, SqliteFactStoreError> {
        if deadline > MAX_QUERY_DEADLINE {
            return Err(SqliteFactStoreError::InvalidDeadline {
                deadline,
                max: MAX_QUERY_DEADLINE,
            });
        }
        let path = path.as_ref();
        let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|source| SqliteFactStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        verify_schema(&connection, path)?;

        Ok(Self {
            connection,
            path: path.to_path_buf(),
            deadline,
        })
    }

    /// Per-query deadline.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Location of the backing database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_deadline<T>(
        &self,
        operation: &'static str,
        query: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, FactStoreError> {
        let _guard = DeadlineGuard::arm(&self.connection, self.deadline)
            .map_err(|err| classify(operation, self.deadline, err))?;
        query(&self.connection).map_err(|err| classify(operation, self.deadline, err))
    }

    fn batched_lookup(
        &self,
        operation: &'static str,
        sql_prefix: &str,
        relation: RelationKind,
        anchor: &str,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        let mut found = HashSet::new();
        let chunk_size = SQLITE_MAX_VARIABLE_NUMBER - FIXED_BATCH_PARAMETERS;
        for chunk in candidates.chunks(chunk_size) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("{sql_prefix} IN ({placeholders})");
            let names: Vec<String> = self.with_deadline(operation, |connection| {
                let mut statement = connection.prepare_cached(&sql)?;
                let parameters = [relation.as_str(), anchor]
                    .into_iter()
                    .chain(chunk.iter().map(CropLabel::as_str));
                let rows = statement.query_map(params_from_iter(parameters), |row| row.get(0))?;
                rows.collect()
            })?;
            found.extend(
                chunk
                    .iter()
                    .filter(|candidate| names.iter().any(|name| name == candidate.as_str()))
                    .cloned(),
            );
        }
        Ok(found)
    }
}

impl FactStore for SqliteFactStore {
    fn rotation_exists(
        &self,
        previous: &CropLabel,
        candidate: &CropLabel,
    ) -> Result<bool, FactStoreError> {
        self.with_deadline("rotation lookup", |connection| {
            connection
                .prepare_cached(
                    "SELECT EXISTS(
                        SELECT 1 FROM fact_edges
                        WHERE relation = ?1 AND source = ?2 AND target = ?3
                    )",
                )?
                .query_row(
                    (
                        RelationKind::RotationWith.as_str(),
                        previous.as_str(),
                        candidate.as_str(),
                    ),
                    |row| row.get(0),
                )
        })
    }

    fn season_suitable(&self, crop: &CropLabel, season: Season) -> Result<bool, FactStoreError> {
        self.with_deadline("season lookup", |connection| {
            connection
                .prepare_cached(
                    "SELECT EXISTS(
                        SELECT 1 FROM fact_edges
                        WHERE relation = ?1 AND source = ?2 AND target = ?3
                    )",
                )?
                .query_row(
                    (
                        RelationKind::SuitableFor.as_str(),
                        crop.as_str(),
                        season.as_str(),
                    ),
                    |row| row.get(0),
                )
        })
    }

    fn compatible_successors(
        &self,
        previous: &CropLabel,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        self.batched_lookup(
            "batched rotation lookup",
            "SELECT target FROM fact_edges WHERE relation = ?1 AND source = ?2 AND target",
            RelationKind::RotationWith,
            previous.as_str(),
            candidates,
        )
    }

    fn crops_suitable_for(
        &self,
        season: Season,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        self.batched_lookup(
            "batched season lookup",
            "SELECT source FROM fact_edges WHERE relation = ?1 AND target = ?2 AND source",
            RelationKind::SuitableFor,
            season.as_str(),
            candidates,
        )
    }
}

/// Arms the busy timeout and progress-handler interrupt for one query and
/// removes the interrupt when dropped.
struct DeadlineGuard<'conn> {
    connection: &'conn Connection,
}

impl<'conn> DeadlineGuard<'conn> {
    fn arm(connection: &'conn Connection, deadline: Duration) -> rusqlite::Result<Self> {
        connection.busy_timeout(deadline)?;
        // An expiry past the clock's range can never be reached.
        if let Some(expires) = Instant::now().checked_add(deadline) {
            connection.progress_handler(
                PROGRESS_CHECK_INTERVAL,
                Some(move || Instant::now() >= expires),
            );
        }
        Ok(Self { connection })
    }
}

impl Drop for DeadlineGuard<'_> {
    fn drop(&mut self) {
        self.connection.progress_handler(0, None::<fn() -> bool>);
    }
}

fn classify(operation: &'static str, deadline: Duration, err: rusqlite::Error) -> FactStoreError {
    match err.sqlite_error_code() {
        Some(
            ErrorCode::OperationInterrupted | ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked,
        ) => FactStoreError::Timeout {
            operation,
            deadline,
        },
        Some(
            ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::NotADatabase
            | ErrorCode::DatabaseCorrupt,
        ) => FactStoreError::Unavailable {
            reason: err.to_string(),
        },
        _ => FactStoreError::Query {
            operation,
            source: Box::new(err),
        },
    }
}

fn verify_schema(connection: &Connection, path: &Path) -> Result<(), SqliteFactStoreError> {
    let database_error = |operation: &'static str| {
        move |source: rusqlite::Error| SqliteFactStoreError::Database {
            path: path.to_path_buf(),
            operation,
            source,
        }
    };

    for table in REQUIRED_TABLES {
        let present = connection
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
                [table],
                |_| Ok(()),
            )
            .optional()
            .map_err(database_error("inspect schema"))?
            .is_some();
        if !present {
            return Err(SqliteFactStoreError::MissingTable {
                path: path.to_path_buf(),
                table,
            });
        }
    }

    let found: Option<i64> = connection
        .query_row("SELECT version FROM fact_schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .optional()
        .map_err(database_error("read schema version"))?;
    match found {
        Some(version) if version == FACT_SCHEMA_VERSION => Ok(()),
        Some(version) => Err(SqliteFactStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: version,
            expected: FACT_SCHEMA_VERSION,
        }),
        None => Err(SqliteFactStoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: 0,
            expected: FACT_SCHEMA_VERSION,
        }),
    }
}
