//! Conversions to `image` buffers for the rendering layer.
//!
//! Available with the `image-io` feature.

use crate::mask::InstanceMask;

/// Foreground as 255, background as 0.
pub fn mask_to_gray_image(mask: &InstanceMask) -> Option<image::GrayImage> {
    let pixels = mask.data().iter().map(|&v| v * 255).collect();
    image::GrayImage::from_raw(mask.width() as u32, mask.height() as u32, pixels)
}
