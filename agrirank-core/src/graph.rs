//! Agronomic facts and the in-memory graph they form.
//!
//! A [`FactGraph`] is the unit written to and described by fact stores: a set
//! of typed nodes (crops, seasons, soils) and the [`Fact`] edges between
//! them. Adding a fact registers both of its endpoints.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use crate::{CropLabel, Season, SoilType};

/// Relationship kinds understood by the engine.
///
/// Kinds are bound as query parameters; they are never interpolated into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelationKind {
    /// `(crop)-[:ROTATION_WITH]->(crop)`: the target is a good successor.
    RotationWith,
    /// `(crop)-[:SUITABLE_FOR]->(season)`.
    SuitableFor,
    /// `(crop)-[:GROWS_IN]->(soil)`. Written but not read by the ranking path.
    GrowsIn,
}

/// Error returned when parsing an unknown relationship name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown relation '{0}'")]
pub struct RelationKindParseError(pub String);

impl RelationKind {
    /// Every relationship kind.
    pub const ALL: [Self; 3] = [Self::RotationWith, Self::SuitableFor, Self::GrowsIn];

    /// Stored name of the relationship.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RotationWith => "ROTATION_WITH",
            Self::SuitableFor => "SUITABLE_FOR",
            Self::GrowsIn => "GROWS_IN",
        }
    }

    /// Node kinds at the `(source, target)` ends of the relationship.
    #[must_use]
    pub const fn endpoint_kinds(self) -> (NodeKind, NodeKind) {
        match self {
            Self::RotationWith => (NodeKind::Crop, NodeKind::Crop),
            Self::SuitableFor => (NodeKind::Crop, NodeKind::Season),
            Self::GrowsIn => (NodeKind::Crop, NodeKind::Soil),
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RelationKind {
    type Err = RelationKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RelationKindParseError(s.to_owned()))
    }
}

/// Kinds of node in the fact graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    /// A crop.
    Crop,
    /// A cultivation season.
    Season,
    /// A soil classification.
    Soil,
}

impl NodeKind {
    /// Stored name of the node kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Season => "season",
            Self::Soil => "soil",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed node with its canonical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FactNode {
    /// Node kind.
    pub kind: NodeKind,
    /// Canonical lowercase name.
    pub name: String,
}

/// A single agronomic fact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "relation", rename_all = "snake_case")
)]
pub enum Fact {
    /// `next` is a good crop to plant after `previous`.
    RotationWith {
        /// Crop grown in the preceding cycle.
        previous: CropLabel,
        /// Recommended successor.
        next: CropLabel,
    },
    /// `crop` suits `season`.
    SuitableFor {
        /// The crop.
        crop: CropLabel,
        /// The season.
        season: Season,
    },
    /// `crop` grows in `soil`.
    GrowsIn {
        /// The crop.
        crop: CropLabel,
        /// The soil.
        soil: SoilType,
    },
}

impl Fact {
    /// Relationship kind of the fact.
    #[must_use]
    pub const fn relation(&self) -> RelationKind {
        match self {
            Self::RotationWith { .. } => RelationKind::RotationWith,
            Self::SuitableFor { .. } => RelationKind::SuitableFor,
            Self::GrowsIn { .. } => RelationKind::GrowsIn,
        }
    }

    /// Canonical `(source, target)` names.
    #[must_use]
    pub fn endpoints(&self) -> (&str, &str) {
        match self {
            Self::RotationWith { previous, next } => (previous.as_str(), next.as_str()),
            Self::SuitableFor { crop, season } => (crop.as_str(), season.as_str()),
            Self::GrowsIn { crop, soil } => (crop.as_str(), soil.as_str()),
        }
    }

    fn endpoint_nodes(&self) -> [FactNode; 2] {
        let (source_kind, target_kind) = self.relation().endpoint_kinds();
        let (source, target) = self.endpoints();
        [
            FactNode {
                kind: source_kind,
                name: source.to_owned(),
            },
            FactNode {
                kind: target_kind,
                name: target.to_owned(),
            },
        ]
    }
}

/// Nodes and facts describing an agronomic knowledge base.
///
/// # Examples
/// ```
/// use agrirank_core::{CropLabel, Fact, FactGraph, NodeKind, Season};
///
/// let mut graph = FactGraph::new();
/// graph.add_fact(Fact::SuitableFor {
///     crop: CropLabel::new("Wheat")?,
///     season: Season::Rabi,
/// });
/// assert_eq!(graph.fact_count(), 1);
/// assert_eq!(graph.node_count(), 2);
/// assert!(graph.nodes().any(|node| node.kind == NodeKind::Season));
/// # Ok::<(), agrirank_core::CropLabelError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactGraph {
    nodes: BTreeSet<FactNode>,
    facts: BTreeSet<Fact>,
}

impl FactGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node without any facts.
    ///
    /// Returns `true` when the node was not already present.
    pub fn add_node(&mut self, kind: NodeKind, name: &str) -> bool {
        self.nodes.insert(FactNode {
            kind,
            name: name.trim().to_lowercase(),
        })
    }

    /// Add a fact and its endpoint nodes.
    ///
    /// Returns `true` when the fact was not already present.
    pub fn add_fact(&mut self, fact: Fact) -> bool {
        self.nodes.extend(fact.endpoint_nodes());
        self.facts.insert(fact)
    }

    /// Report whether the graph holds `fact`.
    #[must_use]
    pub fn contains(&self, fact: &Fact) -> bool {
        self.facts.contains(fact)
    }

    /// Iterate over nodes in `(kind, name)` order.
    pub fn nodes(&self) -> impl Iterator<Item = &FactNode> {
        self.nodes.iter()
    }

    /// Iterate over facts in a stable order.
    pub fn facts(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    /// Number of distinct nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct facts.
    #[must_use]
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// Number of facts of one relationship kind.
    #[must_use]
    pub fn count_relation(&self, relation: RelationKind) -> usize {
        self.facts
            .iter()
            .filter(|fact| fact.relation() == relation)
            .count()
    }
}

impl FromIterator<Fact> for FactGraph {
    fn from_iter<I: IntoIterator<Item = Fact>>(iter: I) -> Self {
        let mut graph = Self::new();
        graph.extend(iter);
        graph
    }
}

impl Extend<Fact> for FactGraph {
    fn extend<I: IntoIterator<Item = Fact>>(&mut self, iter: I) {
        for fact in iter {
            self.add_fact(fact);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn crop(name: &str) -> CropLabel {
        CropLabel::new(name).expect("valid crop")
    }

    #[rstest]
    #[case("ROTATION_WITH", RelationKind::RotationWith)]
    #[case("suitable_for", RelationKind::SuitableFor)]
    #[case("Grows_In", RelationKind::GrowsIn)]
    fn relation_names_parse(#[case] raw: &str, #[case] expected: RelationKind) {
        assert_eq!(raw.parse::<RelationKind>(), Ok(expected));
    }

    #[rstest]
    fn unknown_relation_is_rejected() {
        assert!("LIKES".parse::<RelationKind>().is_err());
    }

    #[rstest]
    fn duplicate_facts_are_ignored() {
        let fact = Fact::RotationWith {
            previous: crop("rice"),
            next: crop("wheat"),
        };
        let mut graph = FactGraph::new();
        assert!(graph.add_fact(fact.clone()));
        assert!(!graph.add_fact(fact));
        assert_eq!(graph.fact_count(), 1);
    }

    #[rstest]
    fn endpoints_register_typed_nodes() {
        let graph: FactGraph = [
            Fact::GrowsIn {
                crop: crop("Maize"),
                soil: SoilType::new("Sandy Loam").expect("valid soil"),
            },
            Fact::SuitableFor {
                crop: crop("maize"),
                season: Season::Kharif,
            },
        ]
        .into_iter()
        .collect();
        let nodes: Vec<_> = graph
            .nodes()
            .map(|node| (node.kind, node.name.as_str()))
            .collect();
        assert_eq!(
            nodes,
            [
                (NodeKind::Crop, "maize"),
                (NodeKind::Season, "kharif"),
                (NodeKind::Soil, "sandy loam"),
            ]
        );
        assert_eq!(graph.count_relation(RelationKind::GrowsIn), 1);
    }
}
