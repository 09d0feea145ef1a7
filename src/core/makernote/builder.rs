//! Encoder for MakerNote blobs.
//!
//! Writes every field of the table at its declared offset, which makes it
//! the exact inverse of the decoder. Used to synthesize test fixtures and
//! simulated camera output.

use super::layout::{spec_for, FieldId, BLOB_LEN, HYPERFIRE_VERSION};
use super::{EventNumber, RawDateTime, Sequence};

/// Builds a MakerNote blob field by field
#[derive(Debug, Clone)]
pub struct MakerNoteBuilder {
    blob: Vec<u8>,
}

impl MakerNoteBuilder {
    /// Start from a zeroed blob carrying the expected version magic
    pub fn new() -> Self {
        let mut builder = Self {
            blob: vec![0u8; BLOB_LEN],
        };
        builder.put_u16(FieldId::Version, HYPERFIRE_VERSION);
        builder
    }

    fn put_u16(&mut self, id: FieldId, value: u16) {
        let offset = spec_for(id).offset;
        self.blob[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn put_i16(&mut self, id: FieldId, value: i16) {
        let offset = spec_for(id).offset;
        self.blob[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
    }

    fn put_u16s(&mut self, id: FieldId, values: &[u16]) {
        let offset = spec_for(id).offset;
        for (i, value) in values.iter().enumerate() {
            let at = offset + i * 2;
            self.blob[at..at + 2].copy_from_slice(&value.to_le_bytes());
        }
    }

    fn put_text(&mut self, id: FieldId, text: &str) {
        let spec = spec_for(id);
        let width = spec.layout.width();
        let target = &mut self.blob[spec.offset..spec.offset + width];
        target.fill(0);
        for (slot, byte) in target.iter_mut().zip(text.bytes()) {
            *slot = byte;
        }
    }

    pub fn version(mut self, version: u16) -> Self {
        self.put_u16(FieldId::Version, version);
        self
    }

    pub fn firmware_version(mut self, version: u16) -> Self {
        self.put_u16(FieldId::FirmwareVersion, version);
        self
    }

    pub fn trigger_mode(mut self, mode: &str) -> Self {
        self.put_text(FieldId::TriggerMode, mode);
        self
    }

    pub fn sequence(mut self, sequence: Sequence) -> Self {
        self.put_u16s(FieldId::Sequence, &[sequence.index, sequence.max]);
        self
    }

    pub fn event_number(mut self, event: EventNumber) -> Self {
        self.put_u16s(FieldId::EventNumber, &[event.first, event.second]);
        self
    }

    pub fn datetime(mut self, dt: RawDateTime) -> Self {
        self.put_u16s(
            FieldId::DateTimeOriginal,
            &[dt.second, dt.minute, dt.hour, dt.month, dt.day, dt.year],
        );
        self
    }

    pub fn moon_phase(mut self, phase: u16) -> Self {
        self.put_u16(FieldId::MoonPhase, phase);
        self
    }

    /// Sets both temperature fields from a Celsius value
    pub fn ambient_temperature(mut self, celsius: i16) -> Self {
        self.put_i16(FieldId::AmbientTemperature, celsius);
        self.put_i16(
            FieldId::AmbientTemperatureFahrenheit,
            celsius.saturating_mul(9) / 5 + 32,
        );
        self
    }

    pub fn serial_number(mut self, serial: &str) -> Self {
        self.put_text(FieldId::SerialNumber, serial);
        self
    }

    pub fn contrast(mut self, value: u16) -> Self {
        self.put_u16(FieldId::Contrast, value);
        self
    }

    pub fn brightness(mut self, value: u16) -> Self {
        self.put_u16(FieldId::Brightness, value);
        self
    }

    pub fn sharpness(mut self, value: u16) -> Self {
        self.put_u16(FieldId::Sharpness, value);
        self
    }

    pub fn saturation(mut self, value: u16) -> Self {
        self.put_u16(FieldId::Saturation, value);
        self
    }

    pub fn infrared_illuminator(mut self, value: u16) -> Self {
        self.put_u16(FieldId::InfraredIlluminator, value);
        self
    }

    pub fn motion_sensitivity(mut self, value: u16) -> Self {
        self.put_u16(FieldId::MotionSensitivity, value);
        self
    }

    pub fn battery_voltage(mut self, millivolts: u16) -> Self {
        self.put_u16(FieldId::BatteryVoltage, millivolts);
        self
    }

    pub fn user_label(mut self, label: &str) -> Self {
        self.put_text(FieldId::UserLabel, label);
        self
    }

    /// Finish and return the encoded blob
    pub fn build(self) -> Vec<u8> {
        self.blob
    }
}

impl Default for MakerNoteBuilder {
    fn default() -> Self {
        Self::new()
    }
}
