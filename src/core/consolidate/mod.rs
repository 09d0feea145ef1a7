//! # Consolidate Module
//!
//! Groups images into trigger events.
//!
//! ## Steps
//! 1. **Keys** - every image gets a simple event key
//!    (`serial_year_dayofyear_event2`) and a sort key (simple key + time)
//! 2. **Sort** - rows are ordered by sort key, ties broken by filename
//! 3. **Duplicates** - events with a repeated sequence index are flagged
//! 4. **Merge** - events from the same camera that follow each other within
//!    a short window share one extended event key
//!
//! The merge is a single forward pass and relies on step 2 having run.

mod duplicates;
mod keys;
mod merge;

pub use duplicates::{check_duplicates, retained_indices, DuplicatePolicy};
pub use keys::{assign_event_keys, simple_event_key, sort_records};
pub use merge::extend_event_keys;

use crate::core::table::ImageRecord;

/// Default time window for merging subsequent events
pub const DEFAULT_MERGE_WINDOW_SECS: i64 = 10;

/// Runs all consolidation steps over a set of records
#[derive(Debug, Clone, Copy)]
pub struct EventConsolidator {
    window_secs: i64,
}

impl EventConsolidator {
    pub fn new(window_secs: i64) -> Self {
        Self { window_secs }
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }

    /// Key, sort, flag duplicates and merge events
    pub fn consolidate(&self, mut records: Vec<ImageRecord>) -> Vec<ImageRecord> {
        assign_event_keys(&mut records);
        sort_records(&mut records);
        check_duplicates(&mut records);
        extend_event_keys(&mut records, self.window_secs);
        records
    }

    /// Re-run duplicate detection and merging on already keyed records,
    /// e.g. after concatenating tables and assigning labels
    pub fn reconsolidate(&self, mut records: Vec<ImageRecord>) -> Vec<ImageRecord> {
        sort_records(&mut records);
        check_duplicates(&mut records);
        extend_event_keys(&mut records, self.window_secs);
        records
    }
}

impl Default for EventConsolidator {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_WINDOW_SECS)
    }
}
