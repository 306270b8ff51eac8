//! Behavioural tests for the hybrid ranking pipeline using rstest-bdd.

use std::cell::RefCell;

use agrirank_core::test_support::{FixedClassifier, MemoryFactStore, reference_facts};
use agrirank_core::{
    CropLabel, FeatureVector, HybridRecommender, RecommendError, RecommendRequest,
    RecommendationResult, RuleContext, Season, SoilReadings,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

/// Shared state for ranking scenarios.
#[derive(Debug, Default)]
struct RankingWorld {
    store: RefCell<MemoryFactStore>,
    classifier: RefCell<Option<FixedClassifier>>,
    context: RefCell<RuleContext>,
    outcome: RefCell<Option<Result<RecommendationResult, RecommendError>>>,
}

impl RankingWorld {
    fn expect_result(&self) -> RecommendationResult {
        self.outcome
            .borrow()
            .as_ref()
            .expect("a request should have been made")
            .as_ref()
            .expect("the request should succeed")
            .clone()
    }
}

#[fixture]
fn world() -> RankingWorld {
    RankingWorld::default()
}

fn readings() -> SoilReadings {
    SoilReadings {
        nitrogen: 85.0,
        phosphorus: 58.0,
        potassium: 41.0,
        temperature: 21.8,
        humidity: 80.3,
        ph: 7.0,
        rainfall: 226.7,
    }
}

#[given("the reference crop catalogue")]
fn given_catalogue(world: &RankingWorld) {
    world
        .store
        .replace(MemoryFactStore::from_graph(reference_facts()));
}

#[given("a classifier favouring rice, wheat, banana and pulses")]
fn given_classifier(world: &RankingWorld) {
    world.classifier.replace(Some(FixedClassifier::new(&[
        ("rice", 0.30),
        ("wheat", 0.25),
        ("banana", 0.20),
        ("pulses", 0.15),
        ("maize", 0.06),
        ("coffee", 0.04),
    ])));
}

#[given("the previous crop was {crop}")]
fn given_previous_crop(world: &RankingWorld, crop: String) {
    world.context.borrow_mut().previous_crop =
        Some(CropLabel::new(&crop).expect("valid crop name"));
}

#[given("the upcoming season is {season}")]
fn given_season(world: &RankingWorld, season: String) {
    world.context.borrow_mut().season = Some(season.parse::<Season>().expect("known season"));
}

#[given("the fact store is unavailable")]
fn given_outage(world: &RankingWorld) {
    world.store.borrow().set_unavailable(true);
}

#[when("I request {count} recommendations")]
fn when_request(world: &RankingWorld, count: usize) {
    let classifier = world
        .classifier
        .borrow_mut()
        .take()
        .expect("classifier should be configured");
    let recommender = HybridRecommender::new(classifier);
    let features = FeatureVector::try_from(readings()).expect("valid readings");
    let request = RecommendRequest::new(features, world.context.borrow().clone(), count)
        .expect("valid request");
    let outcome = recommender.recommend(&request, &*world.store.borrow());
    world.outcome.replace(Some(outcome));
}

#[then("{crop} is ranked first with score {score}")]
fn then_ranked_first(world: &RankingWorld, crop: String, score: f64) {
    let result = world.expect_result();
    let best = result.best().expect("at least one recommendation");
    assert_eq!(best.crop.as_str(), crop);
    assert!((best.score - score).abs() < 1e-9, "score was {}", best.score);
}

#[then("the score of {crop} is {score}")]
fn then_score_of(world: &RankingWorld, crop: String, score: f64) {
    let result = world.expect_result();
    let found = result
        .iter()
        .find(|r| r.crop.as_str() == crop)
        .expect("crop should be ranked");
    assert!((found.score - score).abs() < 1e-9, "score was {}", found.score);
}

#[then("every recommendation has score {score}")]
fn then_every_score(world: &RankingWorld, score: f64) {
    let result = world.expect_result();
    assert!(!result.is_empty());
    assert!(result.iter().all(|r| (r.score - score).abs() < 1e-9));
}

#[then("the ranking is {order}")]
fn then_ranking(world: &RankingWorld, order: String) {
    let result = world.expect_result();
    let actual: Vec<_> = result.iter().map(|r| r.crop.as_str()).collect();
    let expected: Vec<_> = order.split(',').map(str::trim).collect();
    assert_eq!(actual, expected);
}

#[then("{count} recommendations are returned")]
fn then_count(world: &RankingWorld, count: usize) {
    assert_eq!(world.expect_result().len(), count);
}

#[then("the request fails with a fact store error")]
fn then_store_error(world: &RankingWorld) {
    let outcome = world.outcome.borrow();
    let err = outcome
        .as_ref()
        .expect("a request should have been made")
        .as_ref()
        .expect_err("the request should fail");
    assert!(matches!(err, RecommendError::FactStore(_)));
}

#[scenario(path = "tests/features/hybrid_ranking.feature", index = 0)]
fn compatible_successor(world: RankingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/hybrid_ranking.feature", index = 1)]
fn no_context(world: RankingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/hybrid_ranking.feature", index = 2)]
fn season_reorders(world: RankingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/hybrid_ranking.feature", index = 3)]
fn oversized_request(world: RankingWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/hybrid_ranking.feature", index = 4)]
fn store_outage(world: RankingWorld) {
    let _ = world;
}
