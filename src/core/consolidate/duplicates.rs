//! Duplicate detection inside trigger events.
//!
//! A camera writes each sequence index of a burst exactly once, so a
//! repeated `(simple_event_key, sequence_idx)` pair means the same frame was
//! collected twice. If the copies also carry different labels the whole event
//! is a conflict.

use crate::core::table::{DuplicateFlag, ImageRecord};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Flag every record according to its event's duplicate status
pub fn check_duplicates(records: &mut [ImageRecord]) {
    let mut events: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        events
            .entry(record.simple_event_key.as_str())
            .or_default()
            .push(i);
    }

    let mut flags = vec![DuplicateFlag::Unique; records.len()];
    for rows in events.values() {
        let mut seen = HashSet::new();
        let repeated = rows
            .iter()
            .any(|&i| !seen.insert(records[i].sequence_idx));
        if !repeated {
            continue;
        }

        let labels: HashSet<Option<&str>> =
            rows.iter().map(|&i| records[i].label.as_deref()).collect();
        let flag = if labels.len() > 1 {
            DuplicateFlag::Conflict
        } else {
            DuplicateFlag::Redundant
        };
        for &i in rows {
            flags[i] = flag;
        }
    }

    for (record, flag) in records.iter_mut().zip(flags) {
        record.duplicate = flag;
    }
}

/// Which copy of a repeated frame is kept when images are exported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Export every copy
    #[default]
    KeepAll,
    /// Keep the first copy in table order
    KeepFirst,
    /// Keep the last copy in table order
    KeepLast,
}

/// Indices of the rows that survive `policy`, in table order.
///
/// Only rows sharing both the simple event key and the sequence index
/// compete with each other.
pub fn retained_indices(records: &[ImageRecord], policy: DuplicatePolicy) -> Vec<usize> {
    if policy == DuplicatePolicy::KeepAll {
        return (0..records.len()).collect();
    }

    let mut winners: HashMap<(&str, u16), usize> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        let slot = (record.simple_event_key.as_str(), record.sequence_idx);
        match policy {
            DuplicatePolicy::KeepFirst => {
                winners.entry(slot).or_insert(i);
            }
            DuplicatePolicy::KeepLast | DuplicatePolicy::KeepAll => {
                winners.insert(slot, i);
            }
        }
    }

    let mut kept: Vec<usize> = winners.into_values().collect();
    kept.sort_unstable();
    kept
}
