//! The reference agronomic catalogue.
#![forbid(unsafe_code)]

use agrirank_core::{CropLabel, CropLabelError, Fact, FactGraph, Season, SoilType};

/// Recommended `(previous, next)` crop successions.
pub const REFERENCE_ROTATIONS: [(&str, &str); 6] = [
    ("rice", "wheat"),
    ("maize", "pulses"),
    ("groundnut", "cotton"),
    ("rice", "pulses"),
    ("wheat", "maize"),
    ("banana", "coffee"),
];

/// Season each catalogue crop suits.
pub const REFERENCE_SEASONS: [(&str, Season); 9] = [
    ("rice", Season::Kharif),
    ("wheat", Season::Rabi),
    ("maize", Season::Kharif),
    ("pulses", Season::Rabi),
    ("groundnut", Season::Kharif),
    ("cotton", Season::Kharif),
    ("banana", Season::Kharif),
    ("jute", Season::Kharif),
    ("coffee", Season::Zaid),
];

/// Soil each catalogue crop grows in.
pub const REFERENCE_SOILS: [(&str, &str); 9] = [
    ("rice", "clay"),
    ("wheat", "loamy"),
    ("maize", "sandy loam"),
    ("pulses", "loamy"),
    ("groundnut", "sandy"),
    ("cotton", "sandy loam"),
    ("banana", "clay"),
    ("jute", "clay"),
    ("coffee", "loamy"),
];

/// Build the reference catalogue as a [`FactGraph`].
///
/// # Errors
/// Returns [`CropLabelError`] if a catalogue name is blank, which the
/// constants above rule out.
///
/// # Examples
/// ```
/// use agrirank_core::RelationKind;
/// use agrirank_data::reference_graph;
///
/// let graph = reference_graph()?;
/// assert_eq!(graph.count_relation(RelationKind::RotationWith), 6);
/// # Ok::<(), agrirank_core::CropLabelError>(())
/// ```
pub fn reference_graph() -> Result<FactGraph, CropLabelError> {
    let mut graph = FactGraph::new();
    for (previous, next) in REFERENCE_ROTATIONS {
        graph.add_fact(Fact::RotationWith {
            previous: CropLabel::new(previous)?,
            next: CropLabel::new(next)?,
        });
    }
    for (crop, season) in REFERENCE_SEASONS {
        graph.add_fact(Fact::SuitableFor {
            crop: CropLabel::new(crop)?,
            season,
        });
    }
    for (crop, soil) in REFERENCE_SOILS {
        graph.add_fact(Fact::GrowsIn {
            crop: CropLabel::new(crop)?,
            soil: SoilType::new(soil)?,
        });
    }
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrirank_core::{NodeKind, RelationKind, test_support::reference_facts};
    use rstest::rstest;

    #[rstest]
    fn catalogue_matches_core_fixture() {
        assert_eq!(reference_graph().expect("catalogue"), reference_facts());
    }

    #[rstest]
    #[case(NodeKind::Crop, 9)]
    #[case(NodeKind::Season, 3)]
    #[case(NodeKind::Soil, 4)]
    fn catalogue_covers_every_node(#[case] kind: NodeKind, #[case] expected: usize) {
        let graph = reference_graph().expect("catalogue");
        assert_eq!(graph.nodes().filter(|node| node.kind == kind).count(), expected);
    }

    #[rstest]
    fn every_crop_has_a_season_and_a_soil() {
        let graph = reference_graph().expect("catalogue");
        assert_eq!(graph.count_relation(RelationKind::SuitableFor), 9);
        assert_eq!(graph.count_relation(RelationKind::GrowsIn), 9);
    }
}
