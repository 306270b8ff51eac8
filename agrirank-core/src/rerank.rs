//! Final ordering of scored candidates.

use crate::{Recommendation, RecommendationResult, ScoredCandidate};

/// Round half away from zero to two decimal places.
///
/// # Examples
/// ```
/// use agrirank_core::round_score;
///
/// assert_eq!(round_score(1.0 + 0.1 + 0.2), 1.3);
/// assert_eq!(round_score(0.125), 0.13);
/// assert_eq!(round_score(-0.125), -0.13);
/// ```
#[must_use]
pub fn round_score(raw: f64) -> f64 {
    (raw * 100.0).round() / 100.0
}

/// Round each score once, then order by descending rounded score.
///
/// The sort is stable: candidates with equal rounded scores keep their input
/// (shortlist) order.
///
/// # Examples
/// ```
/// use agrirank_core::{CropLabel, ScoredCandidate, rerank};
///
/// let candidate = |name: &str, raw_score: f64| ScoredCandidate {
///     crop: CropLabel::new(name).expect("label"),
///     probability: 0.5,
///     raw_score,
///     rotation: None,
///     season: None,
/// };
/// let result = rerank(vec![candidate("banana", 0.5), candidate("wheat", 1.3)]);
/// let order: Vec<_> = result.iter().map(|r| r.crop.as_str()).collect();
/// assert_eq!(order, ["wheat", "banana"]);
/// ```
#[must_use]
pub fn rerank(candidates: Vec<ScoredCandidate>) -> RecommendationResult {
    let mut recommendations: Vec<Recommendation> = candidates
        .into_iter()
        .map(|candidate| Recommendation {
            score: round_score(candidate.raw_score),
            crop: candidate.crop,
            probability: candidate.probability,
            rotation_compatible: candidate.rotation,
            season_suitable: candidate.season,
        })
        .collect();
    recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
    RecommendationResult::new(recommendations)
}
