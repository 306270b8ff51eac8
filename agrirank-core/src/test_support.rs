//! Test doubles for the classifier and fact-store seams.
//!
//! [`MemoryFactStore`] answers from an in-memory [`FactGraph`], counts round
//! trips and can inject failures. [`FixedClassifier`] returns a canned
//! probability vector.
//!
//! The module is compiled for unit tests and behind the `test-support`
//! feature.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use crate::{
    ClassifierError, CropClassifier, CropLabel, Fact, FactGraph, FactStore, FactStoreError,
    FeatureVector, LabelEncoder, ProbabilityVector, Season, SoilType,
};

/// In-memory [`FactStore`] used in tests.
///
/// Every trait call, batched or not, counts as one query.
#[derive(Debug, Default)]
pub struct MemoryFactStore {
    graph: FactGraph,
    queries: AtomicUsize,
    pending_timeouts: AtomicUsize,
    unavailable: AtomicBool,
    query_error: AtomicBool,
}

impl MemoryFactStore {
    /// Create a store answering from `graph`.
    #[must_use]
    pub fn from_graph(graph: FactGraph) -> Self {
        Self {
            graph,
            ..Self::default()
        }
    }

    /// Number of queries answered or failed so far.
    #[must_use]
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Fail the next `count` queries with [`FactStoreError::Timeout`].
    pub fn fail_next_timeouts(&self, count: usize) {
        self.pending_timeouts.store(count, Ordering::SeqCst);
    }

    /// Fail every query with [`FactStoreError::Unavailable`] while `down`.
    pub fn set_unavailable(&self, down: bool) {
        self.unavailable.store(down, Ordering::SeqCst);
    }

    /// Fail every subsequent query with [`FactStoreError::Query`].
    pub fn fail_with_query_error(&self) {
        self.query_error.store(true, Ordering::SeqCst);
    }

    fn begin_query(&self, operation: &'static str) -> Result<(), FactStoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let timed_out = self
            .pending_timeouts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if timed_out {
            return Err(FactStoreError::Timeout {
                operation,
                deadline: Duration::from_millis(1),
            });
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(FactStoreError::Unavailable {
                reason: String::from("memory store marked unavailable"),
            });
        }
        if self.query_error.load(Ordering::SeqCst) {
            return Err(FactStoreError::Query {
                operation,
                source: "injected query failure".into(),
            });
        }
        Ok(())
    }

    fn rotates(&self, previous: &CropLabel, candidate: &CropLabel) -> bool {
        self.graph.contains(&Fact::RotationWith {
            previous: previous.clone(),
            next: candidate.clone(),
        })
    }

    fn suits(&self, crop: &CropLabel, season: Season) -> bool {
        self.graph.contains(&Fact::SuitableFor {
            crop: crop.clone(),
            season,
        })
    }
}

impl FactStore for MemoryFactStore {
    fn rotation_exists(
        &self,
        previous: &CropLabel,
        candidate: &CropLabel,
    ) -> Result<bool, FactStoreError> {
        self.begin_query("rotation lookup")?;
        Ok(self.rotates(previous, candidate))
    }

    fn season_suitable(&self, crop: &CropLabel, season: Season) -> Result<bool, FactStoreError> {
        self.begin_query("season lookup")?;
        Ok(self.suits(crop, season))
    }

    fn compatible_successors(
        &self,
        previous: &CropLabel,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        self.begin_query("batched rotation lookup")?;
        Ok(candidates
            .iter()
            .filter(|candidate| self.rotates(previous, candidate))
            .cloned()
            .collect())
    }

    fn crops_suitable_for(
        &self,
        season: Season,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        self.begin_query("batched season lookup")?;
        Ok(candidates
            .iter()
            .filter(|candidate| self.suits(candidate, season))
            .cloned()
            .collect())
    }
}

/// Classifier returning the same probabilities for every input.
#[derive(Debug)]
pub struct FixedClassifier {
    labels: LabelEncoder,
    output: Vec<f64>,
    failure: Option<String>,
    calls: AtomicUsize,
}

impl FixedClassifier {
    /// Build from `(label, probability)` pairs in class-index order.
    ///
    /// # Panics
    /// Panics when a label is blank or repeated.
    #[must_use]
    pub fn new(entries: &[(&str, f64)]) -> Self {
        let labels = LabelEncoder::from_names(entries.iter().map(|(name, _)| *name))
            .expect("fixed classifier labels must be distinct and non-empty");
        Self {
            labels,
            output: entries.iter().map(|(_, p)| *p).collect(),
            failure: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Return `output` instead of the configured probabilities.
    #[must_use]
    pub fn with_raw_output(mut self, output: Vec<f64>) -> Self {
        self.output = output;
        self
    }

    /// Fail every prediction with [`ClassifierError::Inference`].
    #[must_use]
    pub fn failing(mut self, reason: &str) -> Self {
        self.failure = Some(reason.to_owned());
        self
    }

    /// Number of predictions requested so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CropClassifier for FixedClassifier {
    fn labels(&self) -> &LabelEncoder {
        &self.labels
    }

    fn predict(&self, _features: &FeatureVector) -> Result<ProbabilityVector, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.failure {
            return Err(ClassifierError::Inference {
                reason: reason.clone(),
            });
        }
        ProbabilityVector::new(self.output.clone()).map_err(|err| ClassifierError::Inference {
            reason: err.to_string(),
        })
    }
}

/// The reference agronomic catalogue as a [`FactGraph`].
///
/// # Panics
/// Never in practice; the catalogue names are fixed and non-blank.
#[must_use]
pub fn reference_facts() -> FactGraph {
    const ROTATIONS: [(&str, &str); 6] = [
        ("rice", "wheat"),
        ("maize", "pulses"),
        ("groundnut", "cotton"),
        ("rice", "pulses"),
        ("wheat", "maize"),
        ("banana", "coffee"),
    ];
    const SEASONS: [(&str, Season); 9] = [
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
    const SOILS: [(&str, &str); 9] = [
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
    let crop = |name: &str| CropLabel::new(name).expect("catalogue crop");

    let rotations = ROTATIONS.iter().map(|(previous, next)| Fact::RotationWith {
        previous: crop(previous),
        next: crop(next),
    });
    let seasons = SEASONS.iter().map(|(name, season)| Fact::SuitableFor {
        crop: crop(name),
        season: *season,
    });
    let soils = SOILS.iter().map(|(name, soil)| Fact::GrowsIn {
        crop: crop(name),
        soil: SoilType::new(soil).expect("catalogue soil"),
    });
    rotations.chain(seasons).chain(soils).collect()
}

/// Write `graph` to a fresh SQLite database at `path`.
///
/// # Errors
/// Returns an error when the database cannot be created or written.
#[cfg(feature = "store-sqlite")]
pub fn write_fact_database(
    path: &std::path::Path,
    graph: &FactGraph,
) -> Result<crate::PersistSummary, Box<dyn std::error::Error + Send + Sync>> {
    let mut connection = rusqlite::Connection::open(path)?;
    Ok(crate::persist_fact_graph(&mut connection, graph)?)
}
