use serde::{Deserialize, Serialize};

/// Counters describing one entity store, or the sum over several.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Live intervals held in the arena
    pub intervals: usize,
    /// Attribute records currently present
    pub records: usize,
    /// Entries in the identity index partition
    pub identity_entries: usize,
    /// Entries in the attribute index partition
    pub attribute_entries: usize,
    /// Intervals whose endpoints were narrowed by the overwrite policy
    pub trimmed_intervals: u64,
    /// Overlaps the overwrite policy could not resolve
    pub ambiguous_overlaps: u64,
    /// Total mutating operations performed
    pub operations_count: u64,
}

impl StoreStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_operation(&mut self) {
        self.operations_count += 1;
    }

    pub fn record_trimmed(&mut self, count: u64) {
        self.trimmed_intervals += count;
    }

    pub fn record_ambiguous(&mut self, count: u64) {
        self.ambiguous_overlaps += count;
    }

    /// Fold another set of counters into this one.
    pub fn merge(&mut self, other: &StoreStats) {
        self.intervals += other.intervals;
        self.records += other.records;
        self.identity_entries += other.identity_entries;
        self.attribute_entries += other.attribute_entries;
        self.trimmed_intervals += other.trimmed_intervals;
        self.ambiguous_overlaps += other.ambiguous_overlaps;
        self.operations_count += other.operations_count;
    }
}
