// Bounded result history
//
// Holds the most recent `capacity` ResultRecords in arrival order. The
// ingestion handler is the only writer; any number of readers take snapshots.
// Nothing is persisted: a restart starts from an empty history.

use std::collections::VecDeque;
use std::sync::Arc;

use docrelay_core::ResultRecord;
use parking_lot::RwLock;
use tracing::debug;

/// Default number of results kept in memory.
pub const DEFAULT_CAPACITY: usize = 20;

/// Thread-safe, capacity-bounded result history shared across handlers.
///
/// Cloning is cheap and every clone refers to the same history.
#[derive(Debug, Clone)]
pub struct ResultStore {
    capacity: usize,
    inner: Arc<RwLock<VecDeque<ResultRecord>>>,
}

impl ResultStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append at the tail, dropping the oldest records beyond capacity.
    ///
    /// The record timestamp is raised to the tail's timestamp when needed so
    /// timestamps never decrease in insertion order, even when two handlers
    /// stamped their records in the opposite order to taking the lock.
    pub fn append(&self, mut record: ResultRecord) {
        let mut guard = self.inner.write();

        if let Some(last) = guard.back() {
            if record.timestamp < last.timestamp {
                record.timestamp = last.timestamp;
            }
        }
        guard.push_back(record);

        let mut evicted = 0usize;
        while guard.len() > self.capacity {
            guard.pop_front();
            evicted += 1;
        }

        debug!(
            len = guard.len(),
            capacity = self.capacity,
            evicted,
            "Appended result"
        );
    }

    /// Independent copy of the history, oldest first.
    pub fn snapshot(&self) -> Vec<ResultRecord> {
        self.inner.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use docrelay_core::DEFAULT_STATUS;
    use std::collections::HashSet;
    use std::thread;

    fn record(text: &str) -> ResultRecord {
        ResultRecord::new(text, DEFAULT_STATUS)
    }

    fn texts(records: &[ResultRecord]) -> Vec<&str> {
        records.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn test_large_capacity_allocates_lazily() {
        let store = ResultStore::new(1_000_000_000_000);
        store.append(record("only"));

        assert_eq!(store.capacity(), 1_000_000_000_000);
        assert_eq!(texts(&store.snapshot()), vec!["only"]);
    }

    #[test]
    fn test_evicts_oldest_beyond_capacity() {
        let store = ResultStore::new(2);
        store.append(record("a"));
        store.append(record("b"));
        store.append(record("c"));

        assert_eq!(texts(&store.snapshot()), vec!["b", "c"]);
    }

    #[test]
    fn test_n_plus_one_appends_keep_most_recent_n() {
        let store = ResultStore::new(DEFAULT_CAPACITY);
        let appended: Vec<ResultRecord> = (0..=DEFAULT_CAPACITY)
            .map(|i| record(&format!("r{i}")))
            .collect();
        for r in &appended {
            store.append(r.clone());
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), DEFAULT_CAPACITY);
        assert_eq!(
            snapshot.iter().map(|r| &r.id).collect::<Vec<_>>(),
            appended[1..].iter().map(|r| &r.id).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_snapshot_is_independent_copy() {
        let store = ResultStore::new(3);
        store.append(record("a"));

        let before = store.snapshot();
        store.append(record("b"));

        assert_eq!(texts(&before), vec!["a"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_consecutive_snapshots_are_equal() {
        let store = ResultStore::new(3);
        store.append(record("a"));
        store.append(record("b"));
        assert_eq!(store.snapshot(), store.snapshot());
    }

    #[test]
    fn test_zero_capacity_keeps_nothing() {
        let store = ResultStore::new(0);
        store.append(record("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_timestamps_never_decrease() {
        let store = ResultStore::new(5);
        let late = record("late");
        let mut early = record("early");
        early.timestamp = late.timestamp - Duration::seconds(5);

        store.append(late.clone());
        store.append(early);

        let snapshot = store.snapshot();
        assert_eq!(snapshot[1].timestamp, late.timestamp);
    }

    #[test]
    fn test_clones_share_history() {
        let store = ResultStore::new(3);
        let handle = store.clone();
        handle.append(record("a"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_appends_and_snapshots_respect_capacity() {
        let capacity = 8;
        let store = ResultStore::new(capacity);

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let store = store.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        store.append(record(&format!("w{w}-{i}")));
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..250 {
                        let snapshot = store.snapshot();
                        assert!(snapshot.len() <= capacity);
                        for pair in snapshot.windows(2) {
                            assert!(pair[0].timestamp <= pair[1].timestamp);
                        }
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), capacity);
        let ids: HashSet<&str> = snapshot.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), capacity);
    }
}
