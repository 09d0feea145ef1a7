//! # MakerNote Module
//!
//! Decodes the vendor MakerNote block that camera traps embed in the EXIF
//! data of every JPEG they write.
//!
//! ## Decoding Rules
//! - Each field is read from its declared offset using its declared layout
//! - A field may own more bytes than it needs; the excess is ignored
//! - A field with too few bytes decodes to `None` (logged), the rest of the
//!   record is still returned
//! - A missing or unexpected **version** field rejects the whole record
//!
//! ## Example
//! ```rust,ignore
//! use trap_sorter::core::makernote::MakerNoteDecoder;
//!
//! let note = MakerNoteDecoder::new().decode(&blob)?;
//! println!("camera {:?}, burst {:?}", note.serial_number, note.sequence);
//! ```

mod builder;
mod layout;

pub use builder::MakerNoteBuilder;
pub use layout::{
    read_field, spec_for, FieldId, FieldLayout, FieldSpec, FieldValue, BLOB_LEN, FIELD_TABLE,
    HYPERFIRE_VERSION,
};

use crate::error::FormatError;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Position of an image within its trigger burst
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub index: u16,
    pub max: u16,
}

/// The camera's event counter pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventNumber {
    pub first: u16,
    pub second: u16,
}

/// Capture time exactly as stored by the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDateTime {
    pub second: u16,
    pub minute: u16,
    pub hour: u16,
    pub month: u16,
    pub day: u16,
    pub year: u16,
}

/// All fields of a decoded MakerNote.
///
/// Only `version` is guaranteed; every other field is `None` when its
/// bytes were missing from the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakerNote {
    pub version: u16,
    pub firmware_version: Option<u16>,
    pub trigger_mode: Option<String>,
    pub sequence: Option<Sequence>,
    pub event_number: Option<EventNumber>,
    pub datetime: Option<RawDateTime>,
    pub moon_phase: Option<u16>,
    pub ambient_temperature_f: Option<i16>,
    pub ambient_temperature: Option<i16>,
    pub serial_number: Option<String>,
    pub contrast: Option<u16>,
    pub brightness: Option<u16>,
    pub sharpness: Option<u16>,
    pub saturation: Option<u16>,
    pub infrared_illuminator: Option<u16>,
    pub motion_sensitivity: Option<u16>,
    pub battery_voltage: Option<u16>,
    pub user_label: Option<String>,
}

impl MakerNote {
    fn empty(version: u16) -> Self {
        Self {
            version,
            firmware_version: None,
            trigger_mode: None,
            sequence: None,
            event_number: None,
            datetime: None,
            moon_phase: None,
            ambient_temperature_f: None,
            ambient_temperature: None,
            serial_number: None,
            contrast: None,
            brightness: None,
            sharpness: None,
            saturation: None,
            infrared_illuminator: None,
            motion_sensitivity: None,
            battery_voltage: None,
            user_label: None,
        }
    }

    fn apply(&mut self, id: FieldId, value: &FieldValue) {
        match id {
            FieldId::Version => {}
            FieldId::FirmwareVersion => self.firmware_version = value.as_u16(),
            FieldId::TriggerMode => self.trigger_mode = value.as_text(),
            FieldId::Sequence => {
                self.sequence = value.as_u16_slice().and_then(|v| match v {
                    [index, max] => Some(Sequence {
                        index: *index,
                        max: *max,
                    }),
                    _ => None,
                })
            }
            FieldId::EventNumber => {
                self.event_number = value.as_u16_slice().and_then(|v| match v {
                    [first, second] => Some(EventNumber {
                        first: *first,
                        second: *second,
                    }),
                    _ => None,
                })
            }
            FieldId::DateTimeOriginal => {
                self.datetime = value.as_u16_slice().and_then(|v| match v {
                    [second, minute, hour, month, day, year] => Some(RawDateTime {
                        second: *second,
                        minute: *minute,
                        hour: *hour,
                        month: *month,
                        day: *day,
                        year: *year,
                    }),
                    _ => None,
                })
            }
            FieldId::MoonPhase => self.moon_phase = value.as_u16(),
            FieldId::AmbientTemperatureFahrenheit => self.ambient_temperature_f = value.as_i16(),
            FieldId::AmbientTemperature => self.ambient_temperature = value.as_i16(),
            FieldId::SerialNumber => self.serial_number = value.as_text(),
            FieldId::Contrast => self.contrast = value.as_u16(),
            FieldId::Brightness => self.brightness = value.as_u16(),
            FieldId::Sharpness => self.sharpness = value.as_u16(),
            FieldId::Saturation => self.saturation = value.as_u16(),
            FieldId::InfraredIlluminator => self.infrared_illuminator = value.as_u16(),
            FieldId::MotionSensitivity => self.motion_sensitivity = value.as_u16(),
            FieldId::BatteryVoltage => self.battery_voltage = value.as_u16(),
            FieldId::UserLabel => self.user_label = value.as_text(),
        }
    }
}

/// Decodes MakerNote blobs against the fixed field table
#[derive(Debug, Clone)]
pub struct MakerNoteDecoder {
    expected_version: u16,
}

impl MakerNoteDecoder {
    /// Decoder accepting the HyperFire version magic
    pub fn new() -> Self {
        Self::with_expected_version(HYPERFIRE_VERSION)
    }

    /// Decoder accepting a different version magic
    pub fn with_expected_version(expected_version: u16) -> Self {
        Self { expected_version }
    }

    pub fn expected_version(&self) -> u16 {
        self.expected_version
    }

    /// Decode every field of `blob`.
    ///
    /// Fails only when the version field is absent or does not match.
    pub fn decode(&self, blob: &[u8]) -> Result<MakerNote, FormatError> {
        let version = read_field(blob, 0)
            .ok()
            .and_then(|value| value.as_u16())
            .ok_or(FormatError::MissingVersion)?;

        if version != self.expected_version {
            return Err(FormatError::VersionMismatch {
                expected: self.expected_version,
                found: version,
            });
        }

        let mut note = MakerNote::empty(version);
        for (index, spec) in FIELD_TABLE.iter().enumerate().skip(1) {
            match read_field(blob, index) {
                Ok(value) => note.apply(spec.id, &value),
                Err(err) => warn!(field = spec.name, %err, "Skipping unreadable MakerNote field"),
            }
        }

        Ok(note)
    }
}

impl Default for MakerNoteDecoder {
    fn default() -> Self {
        Self::new()
    }
}
