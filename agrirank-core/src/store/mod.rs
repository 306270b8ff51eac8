//! Read access to agronomic facts.
//!
//! The [`FactStore`] trait answers the two boolean questions the score
//! adjuster asks about each candidate: does it follow the previous crop well,
//! and does it suit the season. Implementations compare labels
//! case-insensitively; callers pass canonical [`CropLabel`] values.

use std::collections::HashSet;
use std::time::Duration;

use thiserror::Error;

use crate::{CropLabel, Season};

mod retry;
#[cfg(feature = "store-sqlite")]
mod schema;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use retry::{RetryPolicy, RetryingFactStore};
#[cfg(feature = "store-sqlite")]
pub use schema::{
    FACT_SCHEMA_VERSION, PersistFactsError, PersistSummary, initialise_fact_schema,
    persist_fact_graph,
};
#[cfg(feature = "store-sqlite")]
pub use sqlite::{
    DEFAULT_QUERY_DEADLINE, MAX_QUERY_DEADLINE, SqliteFactStore, SqliteFactStoreError,
};

/// Failures raised while querying a fact store.
#[derive(Debug, Error)]
pub enum FactStoreError {
    /// The backing store could not be reached.
    #[error("fact store unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause.
        reason: String,
    },
    /// A query did not finish before its deadline.
    #[error("fact store query '{operation}' exceeded its {deadline:?} deadline")]
    Timeout {
        /// Query that timed out.
        operation: &'static str,
        /// Deadline that expired.
        deadline: Duration,
    },
    /// The store answered with an error.
    #[error("fact store query '{operation}' failed")]
    Query {
        /// Query that failed.
        operation: &'static str,
        /// Underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FactStoreError {
    /// Report whether retrying the query could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }
}

/// Read-only access to rotation and season facts.
///
/// The batched methods default to one single-item query per candidate;
/// backends override them to answer with one round trip.
///
/// # Examples
///
/// ```rust
/// use agrirank_core::{CropLabel, FactStore, FactStoreError, Season};
///
/// struct RiceThenWheat;
///
/// impl FactStore for RiceThenWheat {
///     fn rotation_exists(
///         &self,
///         previous: &CropLabel,
///         candidate: &CropLabel,
///     ) -> Result<bool, FactStoreError> {
///         Ok(previous.as_str() == "rice" && candidate.as_str() == "wheat")
///     }
///
///     fn season_suitable(&self, crop: &CropLabel, season: Season) -> Result<bool, FactStoreError> {
///         Ok(crop.as_str() == "wheat" && season == Season::Rabi)
///     }
/// }
///
/// let store = RiceThenWheat;
/// let rice = CropLabel::new("Rice").expect("label");
/// let wheat = CropLabel::new("WHEAT").expect("label");
/// assert!(store.rotation_exists(&rice, &wheat).expect("query"));
/// let suited = store
///     .crops_suitable_for(Season::Rabi, &[rice, wheat.clone()])
///     .expect("query");
/// assert_eq!(suited.into_iter().collect::<Vec<_>>(), vec![wheat]);
/// ```
pub trait FactStore {
    /// Report whether `candidate` is a recommended successor of `previous`.
    ///
    /// # Errors
    /// Returns [`FactStoreError`] when the store cannot answer.
    fn rotation_exists(
        &self,
        previous: &CropLabel,
        candidate: &CropLabel,
    ) -> Result<bool, FactStoreError>;

    /// Report whether `crop` suits `season`.
    ///
    /// # Errors
    /// Returns [`FactStoreError`] when the store cannot answer.
    fn season_suitable(&self, crop: &CropLabel, season: Season) -> Result<bool, FactStoreError>;

    /// Return the subset of `candidates` that rotate well after `previous`.
    ///
    /// # Errors
    /// Returns [`FactStoreError`] when the store cannot answer.
    fn compatible_successors(
        &self,
        previous: &CropLabel,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        let mut compatible = HashSet::new();
        for candidate in candidates {
            if self.rotation_exists(previous, candidate)? {
                compatible.insert(candidate.clone());
            }
        }
        Ok(compatible)
    }

    /// Return the subset of `candidates` suited to `season`.
    ///
    /// # Errors
    /// Returns [`FactStoreError`] when the store cannot answer.
    fn crops_suitable_for(
        &self,
        season: Season,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        let mut suitable = HashSet::new();
        for candidate in candidates {
            if self.season_suitable(candidate, season)? {
                suitable.insert(candidate.clone());
            }
        }
        Ok(suitable)
    }
}

impl<S: FactStore + ?Sized> FactStore for &S {
    fn rotation_exists(
        &self,
        previous: &CropLabel,
        candidate: &CropLabel,
    ) -> Result<bool, FactStoreError> {
        (**self).rotation_exists(previous, candidate)
    }

    fn season_suitable(&self, crop: &CropLabel, season: Season) -> Result<bool, FactStoreError> {
        (**self).season_suitable(crop, season)
    }

    fn compatible_successors(
        &self,
        previous: &CropLabel,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        (**self).compatible_successors(previous, candidates)
    }

    fn crops_suitable_for(
        &self,
        season: Season,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        (**self).crops_suitable_for(season, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryFactStore, reference_facts};
    use rstest::{fixture, rstest};

    fn crop(name: &str) -> CropLabel {
        CropLabel::new(name).expect("valid crop")
    }

    #[fixture]
    fn store() -> MemoryFactStore {
        MemoryFactStore::from_graph(reference_facts())
    }

    #[rstest]
    #[case("rice", "wheat", true)]
    #[case("RICE", "Pulses", true)]
    #[case("wheat", "rice", false)]
    #[case("rice", "banana", false)]
    fn rotation_queries_are_case_insensitive(
        store: MemoryFactStore,
        #[case] previous: &str,
        #[case] candidate: &str,
        #[case] expected: bool,
    ) {
        let found = store
            .rotation_exists(&crop(previous), &crop(candidate))
            .expect("query succeeds");
        assert_eq!(found, expected);
    }

    #[rstest]
    fn batched_rotation_matches_single_queries(store: MemoryFactStore) {
        let candidates = [crop("wheat"), crop("banana"), crop("pulses")];
        let compatible = store
            .compatible_successors(&crop("rice"), &candidates)
            .expect("query succeeds");
        assert_eq!(compatible, HashSet::from([crop("wheat"), crop("pulses")]));
    }

    #[rstest]
    fn unknown_crop_is_never_suitable(store: MemoryFactStore) {
        let suited = store
            .season_suitable(&crop("quinoa"), Season::Rabi)
            .expect("query succeeds");
        assert!(!suited);
    }

    #[rstest]
    #[case(
        FactStoreError::Timeout { operation: "rotation", deadline: Duration::from_millis(5) },
        true
    )]
    #[case(FactStoreError::Unavailable { reason: "down".into() }, true)]
    #[case(
        FactStoreError::Query { operation: "rotation", source: "bad sql".into() },
        false
    )]
    fn transient_errors_are_classified(#[case] error: FactStoreError, #[case] transient: bool) {
        assert_eq!(error.is_transient(), transient);
    }
}
