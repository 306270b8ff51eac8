//! Fact-graph population for the agrirank recommender.
//!
//! Responsibilities:
//! - Provide the reference agronomic catalogue (rotations, seasons, soils).
//! - Read graph definitions from JSON files.
//! - Write a [`FactGraph`](agrirank_core::FactGraph) to the SQLite fact store
//!   read by [`SqliteFactStore`](agrirank_core::SqliteFactStore).
//!
//! Boundaries:
//! - Ranking rules live in `agrirank-core`; this crate only moves facts.
//! - Writes are idempotent, so rebuilding an existing `facts.db` is safe.

#![forbid(unsafe_code)]

mod catalogue;
mod definition;
mod persist;

pub use catalogue::{REFERENCE_ROTATIONS, REFERENCE_SEASONS, REFERENCE_SOILS, reference_graph};
pub use definition::{GraphDefinition, LoadGraphError, load_graph_definition};
pub use persist::{DEFAULT_FACTS_FILE, WriteGraphError, write_fact_graph};
