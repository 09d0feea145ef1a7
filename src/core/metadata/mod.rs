//! # Metadata Module
//!
//! Pulls the MakerNote block out of a JPEG's EXIF data and turns it into an
//! [`ImageRecord`].
//!
//! ## Container
//! The MakerNote lives in the EXIF sub-IFD under tag `0x927C`. The EXIF
//! block itself is located with `kamadak-exif`; the MakerNote bytes are
//! then handed to the [`MakerNoteDecoder`].

use crate::core::makernote::MakerNoteDecoder;
use crate::core::table::ImageRecord;
use crate::error::FormatError;
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// EXIF tag number of the MakerNote field
const MAKERNOTE_TAG: u16 = 0x927C;
/// EXIF tag number of the Exif sub-IFD pointer
const EXIF_IFD_POINTER_TAG: u16 = 0x8769;

/// Smallest JPEG container: start-of-image followed by end-of-image
pub const MINIMAL_JPEG: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xD9];

/// Read the raw MakerNote bytes of a JPEG file
pub fn read_makernote(path: &Path) -> Result<Vec<u8>, FormatError> {
    let file = File::open(path).map_err(|e| FormatError::Unreadable {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut bufreader = BufReader::new(&file);
    let exif_reader = Reader::new()
        .read_from_container(&mut bufreader)
        .map_err(|e| match e {
            exif::Error::Io(io) => FormatError::Unreadable {
                path: path.to_path_buf(),
                reason: io.to_string(),
            },
            other => FormatError::Exif {
                path: path.to_path_buf(),
                reason: other.to_string(),
            },
        })?;

    let field = exif_reader
        .get_field(Tag::MakerNote, In::PRIMARY)
        .ok_or_else(|| FormatError::MissingMakerNote {
            path: path.to_path_buf(),
        })?;

    match field.value {
        Value::Undefined(ref bytes, _) => Ok(bytes.clone()),
        Value::Byte(ref bytes) => Ok(bytes.clone()),
        _ => Err(FormatError::MissingMakerNote {
            path: path.to_path_buf(),
        }),
    }
}

/// Decode the camera metadata of one image file
pub fn extract_record(path: &Path, decoder: &MakerNoteDecoder) -> Result<ImageRecord, FormatError> {
    let blob = read_makernote(path)?;
    let note = decoder.decode(&blob)?;
    ImageRecord::from_makernote(path, &note)
}

/// Insert an EXIF APP1 segment carrying `makernote` right after the
/// start-of-image marker of `jpeg`.
///
/// The segment holds a little-endian TIFF structure with a single Exif
/// sub-IFD whose only entry is the MakerNote.
pub fn embed_makernote(jpeg: &[u8], makernote: &[u8]) -> Vec<u8> {
    let tiff = build_tiff(makernote);

    let mut out = Vec::with_capacity(jpeg.len() + tiff.len() + 12);
    out.extend_from_slice(&[0xFF, 0xD8]);

    // APP1 length counts itself, the Exif identifier and the TIFF payload
    let segment_len = (2 + 6 + tiff.len()) as u16;
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);

    let body = jpeg.strip_prefix(&[0xFF, 0xD8]).unwrap_or(jpeg);
    out.extend_from_slice(body);
    out
}

fn build_tiff(makernote: &[u8]) -> Vec<u8> {
    const HEADER_LEN: u32 = 8;
    // count (2) + one entry (12) + next-IFD offset (4)
    const IFD_LEN: u32 = 18;

    let exif_ifd_offset = HEADER_LEN + IFD_LEN;
    let data_offset = exif_ifd_offset + IFD_LEN;

    let mut tiff = Vec::with_capacity(data_offset as usize + makernote.len());
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&HEADER_LEN.to_le_bytes());

    // IFD0: pointer to the Exif sub-IFD (type LONG)
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&EXIF_IFD_POINTER_TAG.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&exif_ifd_offset.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());

    // Exif IFD: MakerNote (type UNDEFINED)
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&MAKERNOTE_TAG.to_le_bytes());
    tiff.extend_from_slice(&7u16.to_le_bytes());
    tiff.extend_from_slice(&(makernote.len() as u32).to_le_bytes());
    if makernote.len() <= 4 {
        let mut inline = [0u8; 4];
        inline[..makernote.len()].copy_from_slice(makernote);
        tiff.extend_from_slice(&inline);
    } else {
        tiff.extend_from_slice(&data_offset.to_le_bytes());
    }
    tiff.extend_from_slice(&0u32.to_le_bytes());

    if makernote.len() > 4 {
        tiff.extend_from_slice(makernote);
    }
    tiff
}
