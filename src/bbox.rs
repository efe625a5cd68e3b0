//! Axis-aligned boxes in corner form.
//!
//! Working boxes are normalized to `[0, 1]` relative to the network input.
//! [`PixelBox`] is the integer form handed to callers after finalization.

use crate::anchor::codec::sanitize_coordinates;

/// Corner-form box `(x1, y1, x2, y2)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub const fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Builds a box from center-form `(cx, cy, w, h)`.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        let x1 = cx - w / 2.0;
        let y1 = cy - h / 2.0;
        Self {
            x1,
            y1,
            x2: x1 + w,
            y2: y1 + h,
        }
    }

    /// Width, zero for inverted boxes.
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    /// Height, zero for inverted boxes.
    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Multiplies every coordinate by `factor`.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x1: self.x1 * factor,
            y1: self.y1 * factor,
            x2: self.x2 * factor,
            y2: self.y2 * factor,
        }
    }

    /// Inverse of [`BBox::scale`].
    pub fn unscale(self, factor: f32) -> Self {
        Self {
            x1: self.x1 / factor,
            y1: self.y1 / factor,
            x2: self.x2 / factor,
            y2: self.y2 / factor,
        }
    }

    /// Orders and clamps both axes into `[0, max_x] x [0, max_y]`.
    pub fn sanitized(self, max_x: f32, max_y: f32) -> Self {
        let (x1, x2) = sanitize_coordinates(self.x1, self.x2, max_x);
        let (y1, y2) = sanitize_coordinates(self.y1, self.y2, max_y);
        Self { x1, y1, x2, y2 }
    }

    /// Maps a normalized box onto an image grid, truncating to whole pixels.
    pub fn to_pixels(self, width: usize, height: usize) -> PixelBox {
        let w = width as f32;
        let h = height as f32;
        let (x1, x2) = sanitize_coordinates(self.x1 * w, self.x2 * w, w);
        let (y1, y2) = sanitize_coordinates(self.y1 * h, self.y2 * h, h);
        PixelBox {
            x1: x1 as u32,
            y1: y1 as u32,
            x2: x2 as u32,
            y2: y2 as u32,
        }
    }
}

/// Integer pixel box in the output image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelBox {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl PixelBox {
    /// Width in pixels, zero for inverted boxes.
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    /// Height in pixels, zero for inverted boxes.
    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }
}

#[cfg(test)]
mod tests {
    use super::{BBox, PixelBox};

    #[test]
    fn from_center_produces_corners() {
        let b = BBox::from_center(0.5, 0.5, 0.2, 0.4);
        assert!((b.x1 - 0.4).abs() < 1e-6);
        assert!((b.y1 - 0.3).abs() < 1e-6);
        assert!((b.x2 - 0.6).abs() < 1e-6);
        assert!((b.y2 - 0.7).abs() < 1e-6);
    }

    #[test]
    fn inverted_box_has_zero_area() {
        let b = BBox::new(0.6, 0.2, 0.4, 0.5);
        assert_eq!(b.area(), 0.0);
    }

    #[test]
    fn to_pixels_clamps_and_orders() {
        let b = BBox::new(0.75, -0.1, 0.25, 1.2);
        let px = b.to_pixels(200, 100);
        assert_eq!(
            px,
            PixelBox {
                x1: 50,
                y1: 0,
                x2: 150,
                y2: 100,
            }
        );
        assert_eq!(px.width(), 100);
        assert_eq!(px.height(), 100);
    }
}
