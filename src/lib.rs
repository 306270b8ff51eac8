//! Facade crate for the agrirank crop recommender.
//!
//! This crate re-exports the core ranking types and exposes the model
//! artefact loader and fact-graph tooling behind feature flags.

#![forbid(unsafe_code)]

pub use agrirank_core::{
    CropClassifier, CropLabel, FactStore, FactStoreError, FeatureVector, HybridRecommender,
    RecommendError, RecommendQuery, RecommendRequest, Recommendation, RecommendationResult,
    RetryPolicy, RetryingFactStore, RuleContext, ScoreAdjuster, Season, SoilReadings, rerank,
    select_top_k,
};

#[cfg(feature = "store-sqlite")]
pub use agrirank_core::{SqliteFactStore, SqliteFactStoreError};

#[cfg(feature = "store-sqlite")]
pub use agrirank_data::{load_graph_definition, reference_graph, write_fact_graph};

#[cfg(feature = "model")]
pub use agrirank_model::{SoftmaxClassifier, load_model_file, write_model_file};
