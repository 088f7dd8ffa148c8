//! Learning records: the log of user decisions on suggestions.
//!
//! The engine only reads from the store, and only through
//! [`LearningRecordStore::most_recent_decision`]. "Most recent" is the order
//! of [`LearningRecordStore::append`] calls; the engine never compares
//! timestamps itself.

use crate::sync::{read, write, RwLock};
use crate::{Decision, DecisionKey, LayerId, LearningRecord};
use std::collections::HashMap;

/// Append-only log of user decisions.
pub trait LearningRecordStore: Send + Sync {
    /// The latest decision recorded for exactly `key`.
    fn most_recent_decision(&self, key: &DecisionKey) -> Option<Decision>;

    /// Record a decision. Later records shadow earlier ones with the same key.
    fn append(&self, record: LearningRecord);

    /// All records of `user` on `layer`, oldest first.
    fn list(&self, user: &str, layer: LayerId) -> Vec<LearningRecord>;
}

#[derive(Debug, Default)]
struct RecordLog {
    records: Vec<LearningRecord>,
    latest: HashMap<DecisionKey, usize>,
}

impl RecordLog {
    fn reindex(&mut self) {
        self.latest = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key(), i))
            .collect();
    }
}

/// Thread-safe in-memory [`LearningRecordStore`].
///
/// Lookups by key are O(1); the latest index is rebuilt only when records
/// are deleted.
#[derive(Debug, Default)]
pub struct InMemoryLearningRecords {
    log: RwLock<RecordLog>,
}

impl InMemoryLearningRecords {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records, including shadowed ones.
    #[must_use]
    pub fn len(&self) -> usize {
        read(&self.log).records.len()
    }

    /// True if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record of `user` on `document`, e.g. after the document
    /// was reset. Returns how many records were removed.
    pub fn delete_document(&self, user: &str, document: &str) -> usize {
        let mut log = write(&self.log);
        let before = log.records.len();
        log.records
            .retain(|r| !(r.user == user && r.source_document == document));
        let removed = before - log.records.len();
        if removed > 0 {
            log.reindex();
            log::info!(
                "Deleted {} learning records of {} on {}",
                removed,
                user,
                document
            );
        }
        removed
    }
}

impl LearningRecordStore for InMemoryLearningRecords {
    fn most_recent_decision(&self, key: &DecisionKey) -> Option<Decision> {
        let log = read(&self.log);
        log.latest.get(key).map(|&i| log.records[i].decision())
    }

    fn append(&self, record: LearningRecord) {
        let mut log = write(&self.log);
        let index = log.records.len();
        log.latest.insert(record.key(), index);
        log.records.push(record);
    }

    fn list(&self, user: &str, layer: LayerId) -> Vec<LearningRecord> {
        read(&self.log)
            .records
            .iter()
            .filter(|r| r.user == user && r.layer == layer)
            .cloned()
            .collect()
    }
}
