// src/core/store.rs

use crate::core::models::{Finding, Severity};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// The append-only, severity-partitioned collection of findings for one
/// scan run.
///
/// Each severity owns its own bucket behind its own mutex, so concurrent
/// probe workers appending at different severities never contend and the
/// critical section for an append is a single tail push. There is no
/// removal, update, or merge operation; once a finding is in a bucket it
/// stays there, in arrival order, for the life of the session.
pub struct FindingStore {
    buckets: [Mutex<Vec<Finding>>; 5],
}

impl FindingStore {
    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
        }
    }

    fn bucket(&self, severity: Severity) -> &Mutex<Vec<Finding>> {
        &self.buckets[severity.index()]
    }

    /// Appends a finding to the tail of its severity bucket.
    ///
    /// Safe to call from any number of concurrent workers; the only lock
    /// taken is the matching bucket's, held for the duration of one push.
    pub fn append(&self, finding: Finding) {
        let bucket = self.bucket(finding.severity);
        bucket
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(finding);
    }

    /// Per-severity totals at call time. A bucket is locked while its
    /// length is read, so a count never observes a half-finished append.
    pub fn count_by_severity(&self) -> BTreeMap<Severity, usize> {
        Severity::descending()
            .map(|severity| {
                let len = self
                    .bucket(severity)
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .len();
                (severity, len)
            })
            .collect()
    }

    /// Total findings across all buckets.
    pub fn total(&self) -> usize {
        self.count_by_severity().values().sum()
    }

    /// Snapshot of every finding, buckets visited in the caller-given
    /// severity order, each bucket in insertion order.
    pub fn all(
        &self,
        order: impl Iterator<Item = Severity>,
    ) -> Vec<(Severity, Finding)> {
        let mut findings = Vec::new();
        for severity in order {
            let bucket = self
                .bucket(severity)
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            for finding in bucket.iter() {
                findings.push((severity, finding.clone()));
            }
        }
        findings
    }
}

impl Default for FindingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap as Map;
    use std::sync::Arc;

    fn finding(severity: Severity, message: &str) -> Finding {
        Finding {
            severity,
            message: message.to_string(),
            details: Map::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn counts_sum_to_number_of_appends() {
        let store = FindingStore::new();
        store.append(finding(Severity::Critical, "a"));
        store.append(finding(Severity::High, "b"));
        store.append(finding(Severity::High, "c"));
        store.append(finding(Severity::Info, "d"));

        let counts = store.count_by_severity();
        assert_eq!(counts[&Severity::Critical], 1);
        assert_eq!(counts[&Severity::High], 2);
        assert_eq!(counts[&Severity::Medium], 0);
        assert_eq!(counts.values().sum::<usize>(), 4);
        assert_eq!(store.total(), 4);
    }

    #[test]
    fn insertion_order_is_preserved_per_bucket() {
        let store = FindingStore::new();
        store.append(finding(Severity::Medium, "first"));
        store.append(finding(Severity::Critical, "interleaved"));
        store.append(finding(Severity::Medium, "second"));
        store.append(finding(Severity::Medium, "third"));

        let all = store.all(Severity::descending());
        let medium: Vec<&str> = all
            .iter()
            .filter(|(severity, _)| *severity == Severity::Medium)
            .map(|(_, f)| f.message.as_str())
            .collect();
        assert_eq!(medium, vec!["first", "second", "third"]);
    }

    #[test]
    fn identical_findings_are_not_deduplicated() {
        let store = FindingStore::new();
        store.append(finding(Severity::Low, "same"));
        store.append(finding(Severity::Low, "same"));
        assert_eq!(store.count_by_severity()[&Severity::Low], 2);
    }

    #[test]
    fn all_respects_caller_given_order() {
        let store = FindingStore::new();
        store.append(finding(Severity::Info, "i"));
        store.append(finding(Severity::Critical, "c"));

        let ascending = store.all([Severity::Info, Severity::Critical].into_iter());
        assert_eq!(ascending[0].1.message, "i");
        assert_eq!(ascending[1].1.message, "c");

        let descending = store.all(Severity::descending());
        assert_eq!(descending[0].1.message, "c");
        assert_eq!(descending[1].1.message, "i");
    }

    #[test]
    fn concurrent_appends_lose_nothing() {
        const WORKERS: usize = 8;
        const PER_WORKER: usize = 250;

        let store = Arc::new(FindingStore::new());
        let severities = [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ];

        let handles: Vec<_> = (0..WORKERS)
            .map(|worker| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..PER_WORKER {
                        let severity = severities[(worker + i) % severities.len()];
                        store.append(finding(severity, &format!("w{worker}-{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().expect("worker panicked");
        }

        assert_eq!(store.total(), WORKERS * PER_WORKER);
        assert_eq!(
            store.all(Severity::descending()).len(),
            WORKERS * PER_WORKER
        );
    }
}
