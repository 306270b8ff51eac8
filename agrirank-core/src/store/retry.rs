//! Retry transient fact-store failures with exponential backoff.

use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use log::warn;

use super::{FactStore, FactStoreError};
use crate::{CropLabel, Season};

/// How often and how patiently [`RetryingFactStore`] retries.
///
/// The delay before retry `n` (starting at zero) is
/// `initial_backoff * multiplier^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Factor applied to the delay after each retry.
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            initial_backoff: Duration::from_millis(50),
            multiplier: 2,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Delay before retry number `retry` (zero-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = self.multiplier.checked_pow(retry).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor)
    }
}

/// Wrap a [`FactStore`] so transient failures are retried.
///
/// Only [`FactStoreError::is_transient`] errors are retried; once the policy
/// is exhausted the last error is returned unchanged.
///
/// # Examples
/// ```
/// use agrirank_core::{CropLabel, FactStore, RetryPolicy, RetryingFactStore, Season};
/// use agrirank_core::test_support::{MemoryFactStore, reference_facts};
///
/// let inner = MemoryFactStore::from_graph(reference_facts());
/// inner.fail_next_timeouts(1);
/// let store = RetryingFactStore::new(&inner, RetryPolicy::default());
/// let wheat = CropLabel::new("wheat").expect("label");
/// assert!(store.season_suitable(&wheat, Season::Rabi).expect("retried query"));
/// assert_eq!(inner.query_count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct RetryingFactStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: FactStore> RetryingFactStore<S> {
    /// Wrap `inner` with `policy`.
    pub const fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// Borrow the wrapped store.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Return the wrapped store.
    pub fn into_inner(self) -> S {
        self.inner
    }

    fn with_retries<T>(
        &self,
        operation: &'static str,
        mut call: impl FnMut(&S) -> Result<T, FactStoreError>,
    ) -> Result<T, FactStoreError> {
        let mut retry = 0;
        loop {
            match call(&self.inner) {
                Err(err) if err.is_transient() && retry < self.policy.max_retries => {
                    let delay = self.policy.backoff(retry);
                    warn!(
                        "fact store {operation} failed ({err}); retrying in {delay:?} (attempt {} of {})",
                        retry + 2,
                        self.policy.max_retries + 1
                    );
                    thread::sleep(delay);
                    retry += 1;
                }
                outcome => return outcome,
            }
        }
    }
}

impl<S: FactStore> FactStore for RetryingFactStore<S> {
    fn rotation_exists(
        &self,
        previous: &CropLabel,
        candidate: &CropLabel,
    ) -> Result<bool, FactStoreError> {
        self.with_retries("rotation lookup", |store| {
            store.rotation_exists(previous, candidate)
        })
    }

    fn season_suitable(&self, crop: &CropLabel, season: Season) -> Result<bool, FactStoreError> {
        self.with_retries("season lookup", |store| store.season_suitable(crop, season))
    }

    fn compatible_successors(
        &self,
        previous: &CropLabel,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        self.with_retries("batched rotation lookup", |store| {
            store.compatible_successors(previous, candidates)
        })
    }

    fn crops_suitable_for(
        &self,
        season: Season,
        candidates: &[CropLabel],
    ) -> Result<HashSet<CropLabel>, FactStoreError> {
        self.with_retries("batched season lookup", |store| {
            store.crops_suitable_for(season, candidates)
        })
    }
}
