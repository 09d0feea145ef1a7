//! JPEG decoding for model input.
//!
//! Uses zune-jpeg for the fast path and falls back to the image crate for
//! anything zune-jpeg rejects (progressive quirks, CMYK, odd colorspaces).

use crate::error::ClassifyError;
use image::{DynamicImage, ImageBuffer, Luma, Rgb, RgbImage};
use std::fs;
use std::path::Path;
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decode `path` into an 8-bit RGB image
pub fn decode_rgb(path: &Path) -> Result<RgbImage, ClassifyError> {
    decode_jpeg(path)
        .or_else(|_| decode_fallback(path))
        .map(|image| image.to_rgb8())
}

fn decode_jpeg(path: &Path) -> Result<DynamicImage, ClassifyError> {
    let bytes = fs::read(path).map_err(|e| decode_error(path, e.to_string()))?;

    let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
    let mut decoder = JpegDecoder::new_with_options(&bytes, options);
    let pixels = decoder
        .decode()
        .map_err(|e| decode_error(path, format!("zune-jpeg decode failed: {:?}", e)))?;

    let info = decoder
        .info()
        .ok_or_else(|| decode_error(path, "missing image info".to_string()))?;
    let (width, height) = (info.width as u32, info.height as u32);

    match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
        ColorSpace::RGB => ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| decode_error(path, "RGB buffer size mismatch".to_string())),
        ColorSpace::Luma => ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
            .map(DynamicImage::ImageLuma8)
            .ok_or_else(|| decode_error(path, "Luma buffer size mismatch".to_string())),
        other => Err(decode_error(path, format!("unsupported colorspace {:?}", other))),
    }
}

fn decode_fallback(path: &Path) -> Result<DynamicImage, ClassifyError> {
    image::open(path).map_err(|e| decode_error(path, e.to_string()))
}

fn decode_error(path: &Path, reason: String) -> ClassifyError {
    ClassifyError::Decode {
        path: path.to_path_buf(),
        reason,
    }
}
