//! # Table Module
//!
//! The per-directory metadata table produced by a scan.
//!
//! Rows are only reordered or re-keyed by the consolidator. Once a scan has
//! succeeded, the only mutation allowed is annotating labels.

mod record;

pub use record::{DuplicateFlag, ImageRecord, SortKey};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Ordered collection of image records from one directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventTable {
    records: Vec<ImageRecord>,
}

/// Counts describing a table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    pub images: usize,
    pub events: usize,
    pub extended_events: usize,
    pub redundant: usize,
    pub conflicts: usize,
    pub labeled: usize,
}

impl EventTable {
    pub fn new(records: Vec<ImageRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ImageRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ImageRecord> {
        self.records.iter()
    }

    pub fn into_records(self) -> Vec<ImageRecord> {
        self.records
    }

    pub(crate) fn records_mut(&mut self) -> &mut Vec<ImageRecord> {
        &mut self.records
    }

    /// Set the label of the row at `index`
    pub fn annotate(&mut self, index: usize, label: Option<String>) {
        if let Some(record) = self.records.get_mut(index) {
            record.label = label;
        }
    }

    /// Number of distinct trigger events (simple event keys)
    pub fn event_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.simple_event_key.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Number of distinct extended events
    pub fn extended_event_count(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.event_key.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Labels assigned to at least one row, in sorted order
    pub fn labels_present(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .filter_map(|r| r.label.as_deref())
            .collect()
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            images: self.len(),
            events: self.event_count(),
            extended_events: self.extended_event_count(),
            redundant: self
                .records
                .iter()
                .filter(|r| r.duplicate == DuplicateFlag::Redundant)
                .count(),
            conflicts: self
                .records
                .iter()
                .filter(|r| r.duplicate == DuplicateFlag::Conflict)
                .count(),
            labeled: self.records.iter().filter(|r| r.label.is_some()).count(),
        }
    }
}

impl From<Vec<ImageRecord>> for EventTable {
    fn from(records: Vec<ImageRecord>) -> Self {
        Self::new(records)
    }
}

impl<'a> IntoIterator for &'a EventTable {
    type Item = &'a ImageRecord;
    type IntoIter = std::slice::Iter<'a, ImageRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
