//! The hybrid recommendation pipeline.
//!
//! A request flows through validation, classifier inference, the top-K
//! shortlist, batched rule adjustment and the final rerank. Nothing is
//! retained between calls.

use log::debug;
use thiserror::Error;

use crate::{
    ClassifierError, CropClassifier, CropLabel, CropLabelError, FactStore, FactStoreError,
    FeatureVector, FeatureVectorError, RuleContext, ScoreAdjuster, Season, SeasonParseError,
    SoilReadings, rerank, select_top_k_labels,
};

/// Shortlist length used when a request does not set one.
pub const DEFAULT_TOP_K: usize = 5;

/// A single ranked crop.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Recommendation {
    /// Recommended crop.
    pub crop: CropLabel,
    /// Hybrid score rounded to two decimals.
    pub score: f64,
    /// Classifier probability.
    pub probability: f64,
    /// Rotation answer; `None` when no previous crop was given.
    pub rotation_compatible: Option<bool>,
    /// Season answer; `None` when no season was given.
    pub season_suitable: Option<bool>,
}

/// Recommendations in descending score order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecommendationResult {
    recommendations: Vec<Recommendation>,
}

impl RecommendationResult {
    /// Wrap an already ordered list.
    #[must_use]
    pub const fn new(recommendations: Vec<Recommendation>) -> Self {
        Self { recommendations }
    }

    /// Number of recommendations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recommendations.len()
    }

    /// Report whether there are no recommendations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }

    /// Iterate in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, Recommendation> {
        self.recommendations.iter()
    }

    /// Highest-ranked recommendation.
    #[must_use]
    pub fn best(&self) -> Option<&Recommendation> {
        self.recommendations.first()
    }

    /// Borrow the ordered recommendations.
    #[must_use]
    pub fn as_slice(&self) -> &[Recommendation] {
        &self.recommendations
    }

    /// Consume the result and return the ordered recommendations.
    #[must_use]
    pub fn into_inner(self) -> Vec<Recommendation> {
        self.recommendations
    }
}

impl<'a> IntoIterator for &'a RecommendationResult {
    type Item = &'a Recommendation;
    type IntoIter = std::slice::Iter<'a, Recommendation>;

    fn into_iter(self) -> Self::IntoIter {
        self.recommendations.iter()
    }
}

/// Request payload as received from callers.
///
/// Blank `previous_crop` or `season` strings count as absent.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(deny_unknown_fields)
)]
pub struct RecommendQuery {
    /// Soil and climate readings.
    pub readings: SoilReadings,
    /// Crop grown in the preceding cycle.
    #[cfg_attr(feature = "serde", serde(default))]
    pub previous_crop: Option<String>,
    /// Upcoming season name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub season: Option<String>,
    /// Shortlist length.
    #[cfg_attr(feature = "serde", serde(default))]
    pub top_k: Option<usize>,
}

/// Reasons a request is rejected before the classifier runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The readings were invalid.
    #[error("invalid readings: {0}")]
    Features(#[from] FeatureVectorError),
    /// The season was not recognised.
    #[error(transparent)]
    Season(#[from] SeasonParseError),
    /// The previous crop label was invalid.
    #[error("invalid previous crop: {0}")]
    PreviousCrop(#[from] CropLabelError),
    /// The shortlist length was zero.
    #[error("top_k must be at least 1")]
    ZeroTopK,
}

/// Validated request.
///
/// # Examples
/// ```
/// use agrirank_core::{RecommendQuery, RecommendRequest, Season, SoilReadings};
///
/// let query = RecommendQuery {
///     readings: SoilReadings {
///         nitrogen: 90.0,
///         phosphorus: 42.0,
///         potassium: 43.0,
///         temperature: 21.0,
///         humidity: 82.0,
///         ph: 6.5,
///         rainfall: 200.0,
///     },
///     previous_crop: Some("Rice".into()),
///     season: Some("RABI".into()),
///     top_k: None,
/// };
/// let request = RecommendRequest::try_from(query)?;
/// assert_eq!(request.top_k, 5);
/// assert_eq!(request.context.season, Some(Season::Rabi));
/// # Ok::<(), agrirank_core::InputError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendRequest {
    /// Classifier input.
    pub features: FeatureVector,
    /// Rule context.
    pub context: RuleContext,
    /// Shortlist length, at least one.
    pub top_k: usize,
}

impl RecommendRequest {
    /// Build a request from already validated parts.
    ///
    /// # Errors
    /// Returns [`InputError::ZeroTopK`] when `top_k` is zero.
    pub fn new(
        features: FeatureVector,
        context: RuleContext,
        top_k: usize,
    ) -> Result<Self, InputError> {
        if top_k == 0 {
            return Err(InputError::ZeroTopK);
        }
        Ok(Self {
            features,
            context,
            top_k,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|raw| !raw.trim().is_empty())
}

impl TryFrom<RecommendQuery> for RecommendRequest {
    type Error = InputError;

    fn try_from(query: RecommendQuery) -> Result<Self, Self::Error> {
        let features = FeatureVector::try_from(query.readings)?;
        let previous_crop = non_blank(query.previous_crop)
            .map(CropLabel::new)
            .transpose()?;
        let season = non_blank(query.season)
            .map(|raw| raw.parse::<Season>())
            .transpose()?;
        Self::new(
            features,
            RuleContext {
                previous_crop,
                season,
            },
            query.top_k.unwrap_or(DEFAULT_TOP_K),
        )
    }
}

/// Any failure of a recommendation request.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The request was malformed.
    #[error(transparent)]
    Input(#[from] InputError),
    /// The classifier failed.
    #[error(transparent)]
    Classifier(#[from] ClassifierError),
    /// The fact store failed.
    #[error(transparent)]
    FactStore(#[from] FactStoreError),
}

/// Merges classifier probabilities with fact-store rules.
///
/// The recommender holds only the classifier; a [`FactStore`] is passed per
/// call so concurrent callers each use their own session.
///
/// # Examples
/// ```
/// use agrirank_core::test_support::{FixedClassifier, MemoryFactStore, reference_facts};
/// use agrirank_core::{HybridRecommender, RecommendQuery, RecommendRequest, SoilReadings};
///
/// let classifier = FixedClassifier::new(&[("rice", 0.2), ("wheat", 0.5), ("banana", 0.3)]);
/// let recommender = HybridRecommender::new(classifier);
/// let store = MemoryFactStore::from_graph(reference_facts());
/// let request = RecommendRequest::try_from(RecommendQuery {
///     readings: SoilReadings {
///         nitrogen: 90.0,
///         phosphorus: 42.0,
///         potassium: 43.0,
///         temperature: 21.0,
///         humidity: 82.0,
///         ph: 6.5,
///         rainfall: 200.0,
///     },
///     previous_crop: Some("rice".into()),
///     season: Some("rabi".into()),
///     top_k: Some(2),
/// })
/// .expect("valid request");
///
/// let result = recommender.recommend(&request, &store).expect("recommendations");
/// let best = result.best().expect("one result");
/// assert_eq!(best.crop.as_str(), "wheat");
/// assert_eq!(best.score, 1.3);
/// ```
#[derive(Debug, Clone)]
pub struct HybridRecommender<C> {
    classifier: C,
    adjuster: ScoreAdjuster,
}

impl<C: CropClassifier> HybridRecommender<C> {
    /// Create a recommender around `classifier`.
    pub const fn new(classifier: C) -> Self {
        Self {
            classifier,
            adjuster: ScoreAdjuster,
        }
    }

    /// Borrow the classifier.
    pub const fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Rank crops for a validated request.
    ///
    /// # Errors
    /// Returns [`RecommendError::Classifier`] when inference fails or the
    /// output does not match the label encoder, and
    /// [`RecommendError::FactStore`] when a fact query fails. No partial
    /// ranking is returned.
    pub fn recommend(
        &self,
        request: &RecommendRequest,
        store: &dyn FactStore,
    ) -> Result<RecommendationResult, RecommendError> {
        let probabilities = self.classifier.predict(&request.features)?;
        let shortlist =
            select_top_k_labels(&probabilities, self.classifier.labels(), request.top_k)?;
        debug!(
            "classifier shortlist: {}",
            shortlist
                .iter()
                .map(|(crop, p)| format!("{crop}={p:.3}"))
                .collect::<Vec<_>>()
                .join(", ")
        );

        let scored = self
            .adjuster
            .adjust_all(shortlist, &request.context, store)?;
        let result = rerank(scored);
        debug!(
            "final ranking: {}",
            result
                .iter()
                .map(|r| format!("{}={:.2}", r.crop, r.score))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(result)
    }

    /// Validate a raw query, then rank crops for it.
    ///
    /// # Errors
    /// Returns [`RecommendError::Input`] for a malformed query and otherwise
    /// the errors of [`HybridRecommender::recommend`].
    pub fn recommend_query(
        &self,
        query: RecommendQuery,
        store: &dyn FactStore,
    ) -> Result<RecommendationResult, RecommendError> {
        let request = RecommendRequest::try_from(query)?;
        self.recommend(&request, store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixedClassifier, MemoryFactStore, reference_facts};
    use rstest::{fixture, rstest};

    fn sample_readings() -> SoilReadings {
        SoilReadings {
            nitrogen: 90.0,
            phosphorus: 42.0,
            potassium: 43.0,
            temperature: 21.0,
            humidity: 82.0,
            ph: 6.5,
            rainfall: 200.0,
        }
    }

    #[fixture]
    fn readings() -> SoilReadings {
        sample_readings()
    }

    #[fixture]
    fn store() -> MemoryFactStore {
        MemoryFactStore::from_graph(reference_facts())
    }

    #[fixture]
    fn recommender() -> HybridRecommender<FixedClassifier> {
        HybridRecommender::new(FixedClassifier::new(&[
            ("rice", 0.30),
            ("wheat", 0.25),
            ("banana", 0.20),
            ("pulses", 0.15),
            ("maize", 0.06),
            ("coffee", 0.04),
        ]))
    }

    fn query(
        readings: SoilReadings,
        previous: Option<&str>,
        season: Option<&str>,
        top_k: Option<usize>,
    ) -> RecommendQuery {
        RecommendQuery {
            readings,
            previous_crop: previous.map(str::to_owned),
            season: season.map(str::to_owned),
            top_k,
        }
    }

    fn crops(result: &RecommendationResult) -> Vec<&str> {
        result.iter().map(|r| r.crop.as_str()).collect()
    }

    #[rstest]
    fn rabi_after_rice_promotes_wheat_and_pulses(
        readings: SoilReadings,
        store: MemoryFactStore,
        recommender: HybridRecommender<FixedClassifier>,
    ) {
        let result = recommender
            .recommend_query(query(readings, Some("Rice"), Some("Rabi"), Some(4)), &store)
            .expect("recommendations");
        assert_eq!(crops(&result), ["wheat", "pulses", "rice", "banana"]);
        let scores: Vec<_> = result.iter().map(|r| r.score).collect();
        assert_eq!(scores, [1.3, 1.3, 0.5, 0.5]);
    }

    #[rstest]
    fn no_context_keeps_classifier_order(
        readings: SoilReadings,
        store: MemoryFactStore,
        recommender: HybridRecommender<FixedClassifier>,
    ) {
        let result = recommender
            .recommend_query(query(readings, None, None, None), &store)
            .expect("recommendations");
        assert_eq!(result.len(), DEFAULT_TOP_K);
        assert!(result.iter().all(|r| (r.score - 1.0).abs() < f64::EPSILON));
        assert_eq!(crops(&result), ["rice", "wheat", "banana", "pulses", "maize"]);
        assert_eq!(store.query_count(), 0);
    }

    #[rstest]
    fn top_k_larger_than_classes_is_capped(
        readings: SoilReadings,
        store: MemoryFactStore,
        recommender: HybridRecommender<FixedClassifier>,
    ) {
        let result = recommender
            .recommend_query(query(readings, None, Some("zaid"), Some(50)), &store)
            .expect("recommendations");
        assert_eq!(result.len(), 6);
        assert_eq!(result.best().map(|r| r.crop.as_str()), Some("coffee"));
    }

    #[rstest]
    fn blank_context_strings_disable_rules(
        readings: SoilReadings,
        store: MemoryFactStore,
        recommender: HybridRecommender<FixedClassifier>,
    ) {
        let result = recommender
            .recommend_query(query(readings, Some("  "), Some(""), Some(2)), &store)
            .expect("recommendations");
        assert!(
            result
                .iter()
                .all(|r| r.rotation_compatible.is_none() && r.season_suitable.is_none())
        );
    }

    #[rstest]
    #[case(query(sample_readings(), None, None, Some(0)), InputError::ZeroTopK)]
    #[case(
        query(sample_readings(), None, Some("monsoon"), None),
        InputError::Season(SeasonParseError { label: "monsoon".into() })
    )]
    fn invalid_queries_are_rejected(#[case] bad: RecommendQuery, #[case] expected: InputError) {
        assert_eq!(RecommendRequest::try_from(bad), Err(expected));
    }

    #[rstest]
    fn invalid_readings_skip_the_classifier(
        mut readings: SoilReadings,
        store: MemoryFactStore,
        recommender: HybridRecommender<FixedClassifier>,
    ) {
        readings.humidity = 140.0;
        let err = recommender
            .recommend_query(query(readings, None, None, None), &store)
            .expect_err("invalid humidity");
        assert!(matches!(
            err,
            RecommendError::Input(InputError::Features(_))
        ));
        assert_eq!(recommender.classifier().calls(), 0);
    }

    #[rstest]
    fn fact_store_outage_fails_the_request(
        readings: SoilReadings,
        store: MemoryFactStore,
        recommender: HybridRecommender<FixedClassifier>,
    ) {
        store.set_unavailable(true);
        let err = recommender
            .recommend_query(query(readings, Some("rice"), None, None), &store)
            .expect_err("store outage");
        assert!(matches!(
            err,
            RecommendError::FactStore(FactStoreError::Unavailable { .. })
        ));
    }

    #[rstest]
    fn label_mismatch_is_a_classifier_error(readings: SoilReadings, store: MemoryFactStore) {
        let classifier = FixedClassifier::new(&[("rice", 0.6), ("wheat", 0.4)])
            .with_raw_output(vec![0.2, 0.3, 0.5]);
        let recommender = HybridRecommender::new(classifier);
        let err = recommender
            .recommend_query(query(readings, None, None, None), &store)
            .expect_err("length mismatch");
        assert!(matches!(
            err,
            RecommendError::Classifier(ClassifierError::LabelMismatch { .. })
        ));
    }

    #[rstest]
    fn identical_requests_give_identical_results(
        readings: SoilReadings,
        store: MemoryFactStore,
        recommender: HybridRecommender<FixedClassifier>,
    ) {
        let request = RecommendRequest::try_from(query(readings, Some("maize"), Some("rabi"), None))
            .expect("valid request");
        let first = recommender.recommend(&request, &store).expect("first call");
        let second = recommender.recommend(&request, &store).expect("second call");
        assert_eq!(first, second);
    }
}
