//! Event key assignment.

use crate::core::table::{ImageRecord, SortKey};
use chrono::Datelike;

/// `serial_year_dayofyear_event2` grouping key of one image
pub fn simple_event_key(record: &ImageRecord) -> String {
    format!(
        "{}_{}_{}_{}",
        record.serial_no,
        record.timestamp.year(),
        record.timestamp.ordinal(),
        record.event2
    )
}

/// Assign simple, sort and (initial) extended keys to every record
pub fn assign_event_keys(records: &mut [ImageRecord]) {
    for record in records.iter_mut() {
        let key = simple_event_key(record);
        record.sort_key = SortKey {
            event: key.clone(),
            timestamp: record.epoch_seconds(),
        };
        record.event_key = key.clone();
        record.simple_event_key = key;
    }
}

/// Stable total order: sort key, ties broken by filename
pub fn sort_records(records: &mut [ImageRecord]) {
    records.sort_by(|a, b| {
        a.sort_key
            .cmp(&b.sort_key)
            .then_with(|| a.filename.cmp(&b.filename))
    });
}
