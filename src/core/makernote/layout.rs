//! The fixed MakerNote field table.
//!
//! Every field is declared by its byte offset and binary layout. A field's
//! usable span ends where the next field starts (or at the end of the blob),
//! which lets the decoder tolerate vendor padding between fields.

use crate::error::FormatError;
use serde::{Deserialize, Serialize};

/// Magic value of the version field for HyperFire-style maker notes.
pub const HYPERFIRE_VERSION: u16 = 0xF101;

/// Binary layout of a single field. All integers are little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLayout {
    U16,
    I16,
    /// Fixed-length byte string
    Bytes(usize),
    /// Repeated unsigned 16-bit values
    U16Array(usize),
}

impl FieldLayout {
    /// Exact number of bytes this layout consumes
    pub const fn width(&self) -> usize {
        match self {
            FieldLayout::U16 | FieldLayout::I16 => 2,
            FieldLayout::Bytes(len) => *len,
            FieldLayout::U16Array(count) => *count * 2,
        }
    }

    fn read(&self, bytes: &[u8]) -> FieldValue {
        match self {
            FieldLayout::U16 => FieldValue::U16(u16::from_le_bytes([bytes[0], bytes[1]])),
            FieldLayout::I16 => FieldValue::I16(i16::from_le_bytes([bytes[0], bytes[1]])),
            FieldLayout::Bytes(_) => FieldValue::Bytes(bytes.to_vec()),
            FieldLayout::U16Array(_) => FieldValue::U16Array(
                bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect(),
            ),
        }
    }
}

/// Identifies a field of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldId {
    Version,
    FirmwareVersion,
    TriggerMode,
    Sequence,
    EventNumber,
    DateTimeOriginal,
    MoonPhase,
    AmbientTemperatureFahrenheit,
    AmbientTemperature,
    SerialNumber,
    Contrast,
    Brightness,
    Sharpness,
    Saturation,
    InfraredIlluminator,
    MotionSensitivity,
    BatteryVoltage,
    UserLabel,
}

impl FieldId {
    /// Row of this field in [`FIELD_TABLE`]
    pub const fn index(self) -> usize {
        match self {
            FieldId::Version => 0,
            FieldId::FirmwareVersion => 1,
            FieldId::TriggerMode => 2,
            FieldId::Sequence => 3,
            FieldId::EventNumber => 4,
            FieldId::DateTimeOriginal => 5,
            FieldId::MoonPhase => 6,
            FieldId::AmbientTemperatureFahrenheit => 7,
            FieldId::AmbientTemperature => 8,
            FieldId::SerialNumber => 9,
            FieldId::Contrast => 10,
            FieldId::Brightness => 11,
            FieldId::Sharpness => 12,
            FieldId::Saturation => 13,
            FieldId::InfraredIlluminator => 14,
            FieldId::MotionSensitivity => 15,
            FieldId::BatteryVoltage => 16,
            FieldId::UserLabel => 17,
        }
    }
}

/// A decoded raw field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    U16(u16),
    I16(i16),
    Bytes(Vec<u8>),
    U16Array(Vec<u16>),
}

impl FieldValue {
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            FieldValue::U16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            FieldValue::I16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16_slice(&self) -> Option<&[u16]> {
        match self {
            FieldValue::U16Array(v) => Some(v),
            _ => None,
        }
    }

    /// Byte string converted to text with every NUL byte removed
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Bytes(bytes) => Some(
                bytes
                    .iter()
                    .filter(|&&b| b != 0)
                    .map(|&b| b as char)
                    .collect(),
            ),
            _ => None,
        }
    }
}

/// One row of the field table
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub id: FieldId,
    pub name: &'static str,
    pub offset: usize,
    pub layout: FieldLayout,
}

const fn field(id: FieldId, name: &'static str, offset: usize, layout: FieldLayout) -> FieldSpec {
    FieldSpec {
        id,
        name,
        offset,
        layout,
    }
}

/// The field table, in ascending offset order.
pub const FIELD_TABLE: [FieldSpec; 18] = [
    field(FieldId::Version, "Makernote Version", 0x00, FieldLayout::U16),
    field(FieldId::FirmwareVersion, "Firmware Version", 0x02, FieldLayout::U16),
    field(FieldId::TriggerMode, "Trigger Mode", 0x0c, FieldLayout::Bytes(2)),
    field(FieldId::Sequence, "Sequence", 0x0e, FieldLayout::U16Array(2)),
    field(FieldId::EventNumber, "Event Number", 0x12, FieldLayout::U16Array(2)),
    field(FieldId::DateTimeOriginal, "Date/Time Original", 0x16, FieldLayout::U16Array(6)),
    field(FieldId::MoonPhase, "Moon Phase", 0x24, FieldLayout::U16),
    field(FieldId::AmbientTemperatureFahrenheit, "Ambient Temperature Fahrenheit", 0x26, FieldLayout::I16),
    field(FieldId::AmbientTemperature, "Ambient Temperature", 0x28, FieldLayout::I16),
    field(FieldId::SerialNumber, "Serial Number", 0x2a, FieldLayout::Bytes(30)),
    field(FieldId::Contrast, "Contrast", 0x48, FieldLayout::U16),
    field(FieldId::Brightness, "Brightness", 0x4a, FieldLayout::U16),
    field(FieldId::Sharpness, "Sharpness", 0x4c, FieldLayout::U16),
    field(FieldId::Saturation, "Saturation", 0x4e, FieldLayout::U16),
    field(FieldId::InfraredIlluminator, "Infrared Illuminator", 0x50, FieldLayout::U16),
    field(FieldId::MotionSensitivity, "Motion Sensitivity", 0x52, FieldLayout::U16),
    field(FieldId::BatteryVoltage, "Battery Voltage", 0x54, FieldLayout::U16),
    field(FieldId::UserLabel, "User Label", 0x56, FieldLayout::Bytes(22)),
];

/// Total blob length covering every field of the table
pub const BLOB_LEN: usize = 0x56 + 22;

/// Look up a field's table row
pub fn spec_for(id: FieldId) -> &'static FieldSpec {
    &FIELD_TABLE[id.index()]
}

/// Decode the field at `index` of the table from `blob`.
///
/// The span runs up to the next field's offset (or end of blob) and is cut
/// to the layout width when wider. A shorter span is a `Truncated` error,
/// an index past the table is `UnknownField`.
pub fn read_field(blob: &[u8], index: usize) -> Result<FieldValue, FormatError> {
    let spec = FIELD_TABLE
        .get(index)
        .ok_or(FormatError::UnknownField { index })?;
    let span_end = FIELD_TABLE
        .get(index + 1)
        .map(|next| next.offset)
        .unwrap_or(blob.len())
        .min(blob.len());
    let available = span_end.saturating_sub(spec.offset);
    let required = spec.layout.width();

    if available < required {
        return Err(FormatError::Truncated {
            field: spec.name,
            required,
            available,
        });
    }

    Ok(spec.layout.read(&blob[spec.offset..spec.offset + required]))
}
