//! Merging of closely spaced trigger events.

use crate::core::table::ImageRecord;

/// Merge subsequent events from the same camera that start within
/// `window_secs` of the previous image.
///
/// Expects records sorted by sort key. Record `i` takes over the extended
/// key of record `i - 1` when the time step between them lies in
/// `[0, window_secs)` and both come from the same camera; otherwise its
/// extended key is its own simple key.
pub fn extend_event_keys(records: &mut [ImageRecord], window_secs: i64) {
    for i in 0..records.len() {
        let own_key = records[i].simple_event_key.clone();
        records[i].event_key = own_key;

        if i == 0 {
            continue;
        }

        let (before, after) = records.split_at_mut(i);
        let previous = &before[i - 1];
        let current = &mut after[0];

        let delta = current.epoch_seconds() - previous.epoch_seconds();
        if (0..window_secs).contains(&delta) && current.serial_no == previous.serial_no {
            current.event_key = previous.event_key.clone();
        }
    }
}
