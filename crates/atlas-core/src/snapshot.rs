//! Snapshot state fed by refresh responses.
//!
//! A [`Snapshot`] holds the last successfully fetched value of some listing.
//! Successful responses replace the value wholesale; failed responses leave
//! it untouched and only record the error text. Every response carries the
//! sequence number of the request that produced it, and responses older than
//! the newest applied success are discarded, so a slow request can never
//! overwrite fresher data.

use std::collections::BTreeSet;
use std::fmt::Display;

use chrono::{DateTime, Utc};

/// What [`Snapshot::apply`] did with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Value replaced by the response payload
    Replaced,
    /// Request failed; previous value kept
    Failed,
    /// Response older than the applied value; ignored
    Stale,
}

/// Last-known value of a refreshed listing.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    value: T,
    applied_seq: Option<u64>,
    /// Issued requests whose response has not arrived yet
    in_flight: BTreeSet<u64>,
    updated_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

impl<T: Default> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Snapshot<T> {
    /// Create a snapshot holding `initial` until the first success.
    pub fn new(initial: T) -> Self {
        Self {
            value: initial,
            applied_seq: None,
            in_flight: BTreeSet::new(),
            updated_at: None,
            last_error: None,
        }
    }

    /// Current value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Record that request `seq` was issued.
    pub fn mark_requested(&mut self, seq: u64) {
        self.in_flight.insert(seq);
    }

    /// Apply the response of request `seq`.
    pub fn apply<E: Display>(&mut self, seq: u64, result: Result<T, E>) -> ApplyOutcome {
        self.in_flight.remove(&seq);

        if self.applied_seq.is_some_and(|applied| seq <= applied) {
            return ApplyOutcome::Stale;
        }

        match result {
            Ok(value) => {
                self.value = value;
                self.applied_seq = Some(seq);
                self.updated_at = Some(Utc::now());
                self.last_error = None;
                ApplyOutcome::Replaced
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                ApplyOutcome::Failed
            }
        }
    }

    /// Whether a requested response is still outstanding.
    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Whether any response has ever been applied.
    pub fn is_loaded(&self) -> bool {
        self.applied_seq.is_some()
    }

    /// Whether the first load is still pending: nothing applied and no failure yet.
    pub fn awaiting_first(&self) -> bool {
        !self.is_loaded() && self.last_error.is_none()
    }

    /// Time of the last successful replacement.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Error text of the most recent failure since the last success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Listing = Snapshot<Vec<u32>>;

    #[test]
    fn test_success_replaces_wholesale() {
        let mut snap = Listing::default();
        snap.mark_requested(1);
        assert_eq!(snap.apply::<String>(1, Ok(vec![1, 2, 3, 4, 5])), ApplyOutcome::Replaced);
        snap.mark_requested(2);
        assert_eq!(snap.apply::<String>(2, Ok(vec![9])), ApplyOutcome::Replaced);
        assert_eq!(snap.value(), &vec![9]);
    }

    #[test]
    fn test_failure_keeps_previous_value() {
        let mut snap = Listing::default();
        snap.apply::<String>(1, Ok(vec![1, 2]));
        assert_eq!(snap.apply(2, Err("connection refused")), ApplyOutcome::Failed);
        assert_eq!(snap.value(), &vec![1, 2]);
        assert_eq!(snap.last_error(), Some("connection refused"));

        snap.apply::<String>(3, Ok(vec![]));
        assert!(snap.value().is_empty());
        assert_eq!(snap.last_error(), None);
    }

    #[test]
    fn test_older_response_is_discarded() {
        let mut snap = Listing::default();
        snap.mark_requested(1);
        snap.mark_requested(2);
        assert_eq!(snap.apply::<String>(2, Ok(vec![2])), ApplyOutcome::Replaced);
        assert_eq!(snap.apply::<String>(1, Ok(vec![1])), ApplyOutcome::Stale);
        assert_eq!(snap.value(), &vec![2]);
    }

    #[test]
    fn test_older_success_after_newer_failure_still_applies() {
        let mut snap = Listing::default();
        snap.apply(2, Err("timeout"));
        assert_eq!(snap.apply::<String>(1, Ok(vec![1])), ApplyOutcome::Replaced);
        assert_eq!(snap.value(), &vec![1]);
    }

    #[test]
    fn test_loading_tracks_outstanding_requests() {
        let mut snap = Listing::default();
        assert!(!snap.is_loading());
        assert!(!snap.is_loaded());

        snap.mark_requested(1);
        assert!(snap.is_loading());

        snap.mark_requested(2);
        snap.apply::<String>(1, Ok(vec![]));
        assert!(snap.is_loading());

        snap.apply(2, Err("boom"));
        assert!(!snap.is_loading());
        assert!(snap.is_loaded());
    }

    #[test]
    fn test_loading_until_every_response_arrives() {
        let mut snap = Listing::default();
        snap.mark_requested(1);
        snap.mark_requested(2);

        snap.apply::<String>(2, Ok(vec![2]));
        assert!(snap.is_loading());

        assert_eq!(snap.apply::<String>(1, Ok(vec![1])), ApplyOutcome::Stale);
        assert!(!snap.is_loading());
    }

    #[test]
    fn test_first_failure_ends_initial_load() {
        let mut snap = Listing::default();
        assert!(snap.awaiting_first());

        snap.mark_requested(1);
        snap.apply(1, Err("connection refused"));
        assert!(!snap.awaiting_first());
        assert!(!snap.is_loaded());

        snap.apply::<String>(2, Ok(vec![]));
        assert!(!snap.awaiting_first());
    }
}
