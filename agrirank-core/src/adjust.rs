//! Rule-based score adjustment.
//!
//! Every candidate starts at [`BASE_SCORE`]. Two optional rules then add a
//! fixed delta: crop rotation (when the previous crop is known) and season
//! suitability (when the season is known). Scores returned here are not
//! rounded; see [`rerank`](crate::rerank).

use crate::{CropLabel, FactStore, FactStoreError, Season};

/// Score every candidate starts from.
pub const BASE_SCORE: f64 = 1.0;
/// Added when the candidate is a recommended successor of the previous crop.
pub const ROTATION_COMPATIBLE_DELTA: f64 = 0.1;
/// Added when the candidate is not a recommended successor.
pub const ROTATION_INCOMPATIBLE_DELTA: f64 = -0.2;
/// Added when the candidate suits the season.
pub const SEASON_SUITABLE_DELTA: f64 = 0.2;
/// Added when the candidate does not suit the season.
pub const SEASON_UNSUITABLE_DELTA: f64 = -0.3;

/// Optional context the rules consult.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleContext {
    /// Crop grown in the preceding cycle; enables the rotation rule.
    pub previous_crop: Option<CropLabel>,
    /// Upcoming season; enables the season rule.
    pub season: Option<Season>,
}

impl RuleContext {
    /// Context with neither rule enabled.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            previous_crop: None,
            season: None,
        }
    }
}

/// A shortlisted crop with its classifier probability and rule outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    /// Candidate crop.
    pub crop: CropLabel,
    /// Classifier probability.
    pub probability: f64,
    /// Unrounded hybrid score.
    pub raw_score: f64,
    /// Rotation answer; `None` when no previous crop was given.
    pub rotation: Option<bool>,
    /// Season answer; `None` when no season was given.
    pub season: Option<bool>,
}

/// Sum the base score and the deltas for the rule answers.
///
/// # Examples
/// ```
/// use agrirank_core::combine_rule_deltas;
///
/// assert_eq!(combine_rule_deltas(None, None), 1.0);
/// assert!((combine_rule_deltas(Some(false), Some(false)) - 0.5).abs() < 1e-9);
/// ```
#[must_use]
pub fn combine_rule_deltas(rotation: Option<bool>, season: Option<bool>) -> f64 {
    let rotation_delta = rotation.map_or(0.0, |compatible| {
        if compatible {
            ROTATION_COMPATIBLE_DELTA
        } else {
            ROTATION_INCOMPATIBLE_DELTA
        }
    });
    let season_delta = season.map_or(0.0, |suitable| {
        if suitable {
            SEASON_SUITABLE_DELTA
        } else {
            SEASON_UNSUITABLE_DELTA
        }
    });
    BASE_SCORE + rotation_delta + season_delta
}

/// Applies the rotation and season rules using a [`FactStore`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreAdjuster;

impl ScoreAdjuster {
    /// Score one candidate with up to two single-item fact queries.
    ///
    /// # Errors
    /// Propagates the first [`FactStoreError`]; no neutral value is
    /// substituted for a failed query.
    ///
    /// # Examples
    /// ```
    /// use agrirank_core::test_support::{MemoryFactStore, reference_facts};
    /// use agrirank_core::{CropLabel, RuleContext, ScoreAdjuster, Season};
    ///
    /// let store = MemoryFactStore::from_graph(reference_facts());
    /// let context = RuleContext {
    ///     previous_crop: Some(CropLabel::new("rice").expect("label")),
    ///     season: Some(Season::Rabi),
    /// };
    /// let wheat = CropLabel::new("wheat").expect("label");
    /// let score = ScoreAdjuster.adjust(&wheat, &context, &store).expect("score");
    /// assert!((score - 1.3).abs() < 1e-9);
    /// ```
    pub fn adjust(
        self,
        candidate: &CropLabel,
        context: &RuleContext,
        store: &dyn FactStore,
    ) -> Result<f64, FactStoreError> {
        let (rotation, season) = self.rule_answers(candidate, context, store)?;
        Ok(combine_rule_deltas(rotation, season))
    }

    fn rule_answers(
        self,
        candidate: &CropLabel,
        context: &RuleContext,
        store: &dyn FactStore,
    ) -> Result<(Option<bool>, Option<bool>), FactStoreError> {
        let rotation = context
            .previous_crop
            .as_ref()
            .map(|previous| store.rotation_exists(previous, candidate))
            .transpose()?;
        let season = context
            .season
            .map(|season| store.season_suitable(candidate, season))
            .transpose()?;
        Ok((rotation, season))
    }

    /// Score every shortlisted candidate with at most two batched queries.
    ///
    /// Produces the same scores as calling [`ScoreAdjuster::adjust`] per
    /// candidate and preserves the input order.
    ///
    /// # Errors
    /// Propagates the first [`FactStoreError`]; the whole batch fails.
    pub fn adjust_all(
        self,
        candidates: Vec<(CropLabel, f64)>,
        context: &RuleContext,
        store: &dyn FactStore,
    ) -> Result<Vec<ScoredCandidate>, FactStoreError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }
        let labels: Vec<CropLabel> = candidates.iter().map(|(crop, _)| crop.clone()).collect();
        let compatible = context
            .previous_crop
            .as_ref()
            .map(|previous| store.compatible_successors(previous, &labels))
            .transpose()?;
        let suitable = context
            .season
            .map(|season| store.crops_suitable_for(season, &labels))
            .transpose()?;

        Ok(candidates
            .into_iter()
            .map(|(crop, probability)| {
                let rotation = compatible.as_ref().map(|set| set.contains(&crop));
                let season = suitable.as_ref().map(|set| set.contains(&crop));
                ScoredCandidate {
                    raw_score: combine_rule_deltas(rotation, season),
                    crop,
                    probability,
                    rotation,
                    season,
                }
            })
            .collect())
    }
}
