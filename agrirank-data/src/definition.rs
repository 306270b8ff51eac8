//! JSON graph definitions.
//!
//! A definition lists facts in the same shape [`Fact`] serialises to, plus
//! optional crops and soils that have no facts yet:
//!
//! ```json
//! {
//!   "crops": ["millet"],
//!   "facts": [
//!     { "relation": "rotation_with", "previous": "rice", "next": "wheat" },
//!     { "relation": "suitable_for", "crop": "wheat", "season": "rabi" },
//!     { "relation": "grows_in", "crop": "wheat", "soil": "loamy" }
//!   ]
//! }
//! ```
#![forbid(unsafe_code)]

use std::io::BufReader;

use agrirank_core::{CropLabel, Fact, FactGraph, NodeKind, SoilType};
use agrirank_fs::open_artefact;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a graph definition.
#[derive(Debug, Error)]
pub enum LoadGraphError {
    /// The definition file could not be opened.
    #[error("failed to open graph definition at {path}")]
    Open {
        /// Requested definition path.
        path: Utf8PathBuf,
        /// Source error from std I/O.
        #[source]
        source: std::io::Error,
    },
    /// The definition is not valid JSON or names an unknown relation,
    /// season or blank label.
    #[error("failed to parse graph definition at {path}")]
    Parse {
        /// Definition path.
        path: Utf8PathBuf,
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
}

/// Serialisable description of a fact graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDefinition {
    /// Crops registered even when no fact mentions them.
    #[serde(default)]
    pub crops: Vec<CropLabel>,
    /// Soils registered even when no fact mentions them.
    #[serde(default)]
    pub soils: Vec<SoilType>,
    /// Facts to write.
    #[serde(default)]
    pub facts: Vec<Fact>,
}

impl GraphDefinition {
    /// Build the graph the definition describes.
    #[must_use]
    pub fn into_graph(self) -> FactGraph {
        let mut graph: FactGraph = self.facts.into_iter().collect();
        for crop in &self.crops {
            graph.add_node(NodeKind::Crop, crop.as_str());
        }
        for soil in &self.soils {
            graph.add_node(NodeKind::Soil, soil.as_str());
        }
        graph
    }
}

impl From<&FactGraph> for GraphDefinition {
    fn from(graph: &FactGraph) -> Self {
        Self {
            crops: Vec::new(),
            soils: Vec::new(),
            facts: graph.facts().cloned().collect(),
        }
    }
}

/// Read a JSON graph definition from `path`.
///
/// # Errors
/// Returns [`LoadGraphError`] when the file cannot be opened or parsed.
pub fn load_graph_definition(path: &Utf8Path) -> Result<FactGraph, LoadGraphError> {
    let file = open_artefact(path).map_err(|source| LoadGraphError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let definition: GraphDefinition = serde_json::from_reader(BufReader::new(file)).map_err(
        |source| LoadGraphError::Parse {
            path: path.to_path_buf(),
            source,
        },
    )?;
    let graph = definition.into_graph();
    info!(
        "read {} facts over {} nodes from {path}",
        graph.fact_count(),
        graph.node_count()
    );
    Ok(graph)
}
