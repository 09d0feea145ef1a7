//! # Preprocess Module
//!
//! Turns a camera-trap JPEG into the input tensor the classifier expects.
//!
//! ## Steps
//! 1. Decode (zune-jpeg, image crate fallback)
//! 2. Stretch to 319x319
//! 3. Crop a 10 px border, leaving 299x299
//! 4. Scale channels from `0..=255` to `-1.0..=1.0`
//!
//! The side input is `[ambient_temp, hour]` from the image's metadata.

mod decode;
mod resize;

pub use decode::decode_rgb;
pub use resize::RgbResizer;

use crate::core::table::ImageRecord;
use crate::error::ClassifyError;
use image::imageops;
use std::path::{Path, PathBuf};

/// Edge length of the square model input
pub const MODEL_INPUT_SIZE: u32 = 299;
/// Border removed after resizing
pub const CROP_BORDER: u32 = 10;
/// Edge length images are resized to before cropping
pub const RESIZE_SIZE: u32 = MODEL_INPUT_SIZE + 2 * CROP_BORDER;
/// Values per prepared image (HWC, RGB)
pub const INPUT_LEN: usize = (MODEL_INPUT_SIZE * MODEL_INPUT_SIZE * 3) as usize;

/// One image ready for inference
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    pub path: PathBuf,
    /// `MODEL_INPUT_SIZE` x `MODEL_INPUT_SIZE` x 3, row major
    pub pixels: Vec<f32>,
    /// `[ambient_temp, hour]`
    pub meta: [f32; 2],
}

/// Side input for one record; missing temperatures count as 0 °C
pub fn record_meta(record: &ImageRecord) -> [f32; 2] {
    [
        f32::from(record.ambient_temp.unwrap_or(0)),
        f32::from(record.hour),
    ]
}

/// Decode, resize, crop and scale one image
pub fn prepare_image(
    path: &Path,
    meta: [f32; 2],
    resizer: &mut RgbResizer,
) -> Result<ModelInput, ClassifyError> {
    let decoded = decode_rgb(path)?;
    let resized = resizer
        .resize(&decoded, RESIZE_SIZE, RESIZE_SIZE)
        .map_err(|e| match e {
            ClassifyError::Decode { reason, .. } => ClassifyError::Decode {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;
    let cropped = imageops::crop_imm(
        &resized,
        CROP_BORDER,
        CROP_BORDER,
        MODEL_INPUT_SIZE,
        MODEL_INPUT_SIZE,
    )
    .to_image();

    Ok(ModelInput {
        path: path.to_path_buf(),
        pixels: cropped.as_raw().iter().map(|&v| scale_channel(v)).collect(),
        meta,
    })
}

/// Map `0..=255` onto `-1.0..=1.0`
fn scale_channel(value: u8) -> f32 {
    f32::from(value) / 127.5 - 1.0
}
