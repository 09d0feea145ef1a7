//! SIMD resizing via fast_image_resize.

use crate::error::ClassifyError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbImage;
use std::path::PathBuf;

/// Reusable RGB resizer. Keep one per thread; the internal buffers are
/// recycled between calls.
pub struct RgbResizer {
    resizer: Resizer,
}

impl RgbResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Stretch `image` to exactly `width` x `height` (aspect ratio is not
    /// preserved, the model was trained on stretched frames)
    pub fn resize(
        &mut self,
        image: &RgbImage,
        width: u32,
        height: u32,
    ) -> Result<RgbImage, ClassifyError> {
        let (src_width, src_height) = image.dimensions();
        if src_width == 0 || src_height == 0 || width == 0 || height == 0 {
            return Err(resize_error("zero sized image".to_string()));
        }

        let src = Image::from_vec_u8(src_width, src_height, image.as_raw().clone(), PixelType::U8x3)
            .map_err(|e| resize_error(format!("invalid source image: {}", e)))?;
        let mut dst = Image::new(width, height, PixelType::U8x3);

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
        self.resizer
            .resize(&src, &mut dst, &options)
            .map_err(|e| resize_error(format!("resize failed: {}", e)))?;

        RgbImage::from_raw(width, height, dst.into_vec())
            .ok_or_else(|| resize_error("result buffer size mismatch".to_string()))
    }
}

impl Default for RgbResizer {
    fn default() -> Self {
        Self::new()
    }
}

fn resize_error(reason: String) -> ClassifyError {
    ClassifyError::Decode {
        path: PathBuf::new(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 90])
        })
    }

    #[test]
    fn resize_produces_requested_dimensions() {
        let mut resizer = RgbResizer::new();
        let resized = resizer.resize(&gradient(640, 480), 319, 319).unwrap();
        assert_eq!(resized.dimensions(), (319, 319));
    }

    #[test]
    fn resizer_can_be_reused() {
        let mut resizer = RgbResizer::new();
        let a = resizer.resize(&gradient(100, 50), 20, 20).unwrap();
        let b = resizer.resize(&gradient(30, 60), 20, 20).unwrap();
        assert_eq!(a.dimensions(), b.dimensions());
    }

    #[test]
    fn zero_target_is_rejected() {
        let mut resizer = RgbResizer::new();
        assert!(resizer.resize(&gradient(10, 10), 0, 5).is_err());
    }
}
