//! Aggregate results of batch updates.

use serde::Serialize;

use crate::outcome::{UpdateOutcome, UpdateStatus};

/// Outcome for one unit of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchEntry {
    /// Canonical resource id.
    pub id: String,

    /// Update outcome.
    pub outcome: UpdateOutcome,
}

/// Result of a batch update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Units whose contents were replaced.
    pub updated: usize,

    /// Units already current.
    pub not_modified: usize,

    /// Units that kept a stale copy because the origin was unusable.
    pub degraded: usize,

    /// Units with a fatal outcome.
    pub failed: usize,

    /// Per-unit outcomes in registration order.
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    /// Creates a report from individual outcomes.
    #[must_use]
    pub fn from_entries(entries: Vec<BatchEntry>) -> Self {
        let count = |pred: fn(&UpdateOutcome) -> bool| {
            entries.iter().filter(|entry| pred(&entry.outcome)).count()
        };

        Self {
            updated: count(|o| o.status == UpdateStatus::Updated),
            not_modified: count(|o| o.status == UpdateStatus::NotModified),
            degraded: count(|o| o.status == UpdateStatus::Degraded),
            failed: count(UpdateOutcome::is_fatal),
            entries,
        }
    }

    /// Returns true if any unit failed fatally. Degraded units do not count.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        self.failed > 0
    }

    /// Returns the number of units processed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the batch had no units.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries with fatal outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|entry| entry.outcome.is_fatal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, outcome: UpdateOutcome) -> BatchEntry {
        BatchEntry {
            id: id.to_string(),
            outcome,
        }
    }

    #[test]
    fn test_from_entries() {
        let report = BatchReport::from_entries(vec![
            entry("a/b/c/d", UpdateOutcome::updated()),
            entry("a/b/c/e", UpdateOutcome::cache_valid()),
            entry("a/b/c/f", UpdateOutcome::degraded("offline")),
            entry("a/b/c/g", UpdateOutcome::not_found("gone")),
        ]);

        assert_eq!(report.updated, 1);
        assert_eq!(report.not_modified, 1);
        assert_eq!(report.degraded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.len(), 4);
        assert!(report.is_failed());
        assert_eq!(report.failures().next().unwrap().id, "a/b/c/g");
    }

    #[test]
    fn test_degraded_is_not_failure() {
        let report = BatchReport::from_entries(vec![entry(
            "a/b/c/d",
            UpdateOutcome::degraded("offline"),
        )]);
        assert!(!report.is_failed());
    }

    #[test]
    fn test_empty() {
        let report = BatchReport::default();
        assert!(report.is_empty());
        assert!(!report.is_failed());
    }
}
