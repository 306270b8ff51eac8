//! Core domain types and ranking logic for the agrirank crop recommender.
//!
//! The crate turns a classifier's probability distribution into a ranked
//! list of crops. A request is validated into a [`FeatureVector`] and a
//! [`RuleContext`]; a [`CropClassifier`] produces a [`ProbabilityVector`];
//! [`select_top_k`] shortlists the most probable classes; the
//! [`ScoreAdjuster`] applies rotation and season rules answered by a
//! [`FactStore`]; and [`rerank`] rounds and orders the result.
//! [`HybridRecommender`] wires the steps together.
//!
//! Constructors return `Result` so invalid input surfaces before any model
//! or store is consulted.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod adjust;
pub mod classifier;
pub mod features;
pub mod graph;
pub mod label;
pub mod probability;
pub mod recommend;
pub mod rerank;
pub mod season;
pub mod select;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use adjust::{
    BASE_SCORE, ROTATION_COMPATIBLE_DELTA, ROTATION_INCOMPATIBLE_DELTA, RuleContext,
    SEASON_SUITABLE_DELTA, SEASON_UNSUITABLE_DELTA, ScoreAdjuster, ScoredCandidate,
    combine_rule_deltas,
};
pub use classifier::{ClassifierError, CropClassifier, LabelEncoder, LabelEncoderError};
pub use features::{FEATURE_COUNT, FEATURE_NAMES, FeatureVector, FeatureVectorError, SoilReadings};
pub use graph::{Fact, FactGraph, FactNode, NodeKind, RelationKind, RelationKindParseError};
pub use label::{CropLabel, CropLabelError, SoilType};
pub use probability::{ProbabilityVector, ProbabilityVectorError};
pub use recommend::{
    DEFAULT_TOP_K, HybridRecommender, InputError, RecommendError, RecommendQuery,
    RecommendRequest, Recommendation, RecommendationResult,
};
pub use rerank::{rerank, round_score};
pub use season::{Season, SeasonParseError};
pub use select::{select_top_k, select_top_k_labels};
pub use store::{FactStore, FactStoreError, RetryPolicy, RetryingFactStore};

#[cfg(feature = "store-sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "store-sqlite")))]
pub use store::{
    DEFAULT_QUERY_DEADLINE, FACT_SCHEMA_VERSION, MAX_QUERY_DEADLINE, PersistFactsError,
    PersistSummary, SqliteFactStore, SqliteFactStoreError, initialise_fact_schema,
    persist_fact_graph,
};
