//! A single camera-trap image and its derived grouping keys.

use crate::core::makernote::MakerNote;
use crate::error::FormatError;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Duplicate status of an image within its trigger event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DuplicateFlag {
    /// Every sequence index of the event occurs once
    #[default]
    Unique,
    /// A sequence index repeats but all labels agree
    Redundant,
    /// A sequence index repeats and the labels disagree
    Conflict,
}

impl DuplicateFlag {
    /// Numeric code (0, 1, 2) used in tabular output
    pub fn code(&self) -> u8 {
        match self {
            DuplicateFlag::Unique => 0,
            DuplicateFlag::Redundant => 1,
            DuplicateFlag::Conflict => 2,
        }
    }
}

/// Total-order key: simple event key, then capture time in seconds
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub event: String,
    pub timestamp: i64,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.event, self.timestamp)
    }
}

/// One row of an [`EventTable`](super::EventTable)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub filename: String,
    pub timestamp: NaiveDateTime,
    pub serial_no: String,
    pub event1: u16,
    pub event2: u16,
    pub sequence_idx: u16,
    pub sequence_max: u16,
    pub ambient_temp: Option<i16>,
    pub hour: u16,
    pub brightness: Option<u16>,
    pub sharpness: Option<u16>,
    pub saturation: Option<u16>,
    pub contrast: Option<u16>,
    pub trigger_mode: Option<String>,
    pub user_label: Option<String>,
    /// serial + year + day of year + second event counter
    pub simple_event_key: String,
    pub sort_key: SortKey,
    /// Simple event key, possibly merged with the preceding event
    pub event_key: String,
    pub duplicate: DuplicateFlag,
    pub label: Option<String>,
}

impl ImageRecord {
    /// Build a record from a decoded MakerNote.
    ///
    /// Sequence, event counter, capture time and serial number are required.
    /// Keys are left empty until the consolidator assigns them.
    pub fn from_makernote(path: &Path, note: &MakerNote) -> Result<Self, FormatError> {
        let sequence = note
            .sequence
            .ok_or(FormatError::MissingField { field: "Sequence" })?;
        let event = note
            .event_number
            .ok_or(FormatError::MissingField { field: "Event Number" })?;
        let raw = note.datetime.ok_or(FormatError::MissingField {
            field: "Date/Time Original",
        })?;
        let serial_no = note
            .serial_number
            .clone()
            .ok_or(FormatError::MissingField {
                field: "Serial Number",
            })?;

        let invalid = FormatError::InvalidDateTime {
            year: raw.year,
            month: raw.month,
            day: raw.day,
            hour: raw.hour,
            minute: raw.minute,
            second: raw.second,
        };
        let timestamp = NaiveDate::from_ymd_opt(raw.year as i32, raw.month as u32, raw.day as u32)
            .and_then(|date| {
                date.and_hms_opt(raw.hour as u32, raw.minute as u32, raw.second as u32)
            })
            .ok_or(invalid)?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path: path.to_path_buf(),
            filename,
            timestamp,
            serial_no,
            event1: event.first,
            event2: event.second,
            sequence_idx: sequence.index,
            sequence_max: sequence.max,
            ambient_temp: note.ambient_temperature,
            hour: timestamp.hour() as u16,
            brightness: note.brightness,
            sharpness: note.sharpness,
            saturation: note.saturation,
            contrast: note.contrast,
            trigger_mode: note.trigger_mode.clone(),
            user_label: note.user_label.clone(),
            simple_event_key: String::new(),
            sort_key: SortKey::default(),
            event_key: String::new(),
            duplicate: DuplicateFlag::Unique,
            label: None,
        })
    }

    /// Capture time as whole seconds since the Unix epoch
    pub fn epoch_seconds(&self) -> i64 {
        self.timestamp.and_utc().timestamp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::makernote::{
        EventNumber, MakerNoteBuilder, MakerNoteDecoder, RawDateTime, Sequence,
    };

    fn note_with_date(month: u16, day: u16) -> MakerNote {
        let blob = MakerNoteBuilder::new()
            .sequence(Sequence { index: 1, max: 3 })
            .event_number(EventNumber {
                first: 1,
                second: 2,
            })
            .datetime(RawDateTime {
                second: 5,
                minute: 4,
                hour: 3,
                month,
                day,
                year: 2018,
            })
            .serial_number("XY9")
            .build();
        MakerNoteDecoder::new().decode(&blob).unwrap()
    }

    #[test]
    fn record_takes_hour_from_capture_time() {
        let record =
            ImageRecord::from_makernote(Path::new("/traps/IMG_0001.JPG"), &note_with_date(6, 1))
                .unwrap();
        assert_eq!(record.filename, "IMG_0001.JPG");
        assert_eq!(record.hour, 3);
        assert_eq!(record.serial_no, "XY9");
        assert_eq!(record.sequence_idx, 1);
        assert_eq!(record.event2, 2);
    }

    #[test]
    fn impossible_date_is_a_format_error() {
        let err = ImageRecord::from_makernote(Path::new("a.jpg"), &note_with_date(2, 30))
            .unwrap_err();
        assert!(matches!(err, FormatError::InvalidDateTime { day: 30, .. }));
    }

    #[test]
    fn missing_required_field_is_reported() {
        let mut note = note_with_date(6, 1);
        note.serial_number = None;
        let err = ImageRecord::from_makernote(Path::new("a.jpg"), &note).unwrap_err();
        assert_eq!(
            err,
            FormatError::MissingField {
                field: "Serial Number"
            }
        );
    }

    #[test]
    fn sort_key_orders_by_event_then_time() {
        let a = SortKey {
            event: "A_2018_1_1".into(),
            timestamp: 50,
        };
        let b = SortKey {
            event: "A_2018_1_1".into(),
            timestamp: 60,
        };
        let c = SortKey {
            event: "A_2018_1_2".into(),
            timestamp: 10,
        };
        assert!(a < b && b < c);
        assert_eq!(a.to_string(), "A_2018_1_150");
    }
}
