//! Bilinear resampling of single-channel float masks.
//!
//! Uses half-pixel centers (`align_corners = false`): output pixel `d` maps
//! to source coordinate `(d + 0.5) * in / out - 0.5`, clamped at zero, and
//! the right/bottom neighbour is clamped to the last row or column.

use ndarray::{Array2, ArrayView2};

#[derive(Clone, Copy, Debug)]
struct Tap {
    lo: usize,
    hi: usize,
    frac: f32,
}

fn taps(in_len: usize, out_len: usize) -> Vec<Tap> {
    let scale = in_len as f32 / out_len as f32;
    (0..out_len)
        .map(|d| {
            let src = ((d as f32 + 0.5) * scale - 0.5).max(0.0);
            let lo = (src as usize).min(in_len - 1);
            let hi = (lo + 1).min(in_len - 1);
            Tap {
                lo,
                hi,
                frac: src - lo as f32,
            }
        })
        .collect()
}

/// Resizes `src` to `out_h x out_w`. Empty inputs or outputs give zeros.
pub fn resize_bilinear(src: ArrayView2<'_, f32>, out_h: usize, out_w: usize) -> Array2<f32> {
    let (in_h, in_w) = src.dim();
    if in_h == 0 || in_w == 0 || out_h == 0 || out_w == 0 {
        return Array2::zeros((out_h, out_w));
    }

    let xs = taps(in_w, out_w);
    let ys = taps(in_h, out_h);
    Array2::from_shape_fn((out_h, out_w), |(y, x)| {
        let ty = ys[y];
        let tx = xs[x];
        let top = src[[ty.lo, tx.lo]] * (1.0 - tx.frac) + src[[ty.lo, tx.hi]] * tx.frac;
        let bottom = src[[ty.hi, tx.lo]] * (1.0 - tx.frac) + src[[ty.hi, tx.hi]] * tx.frac;
        top * (1.0 - ty.frac) + bottom * ty.frac
    })
}

#[cfg(test)]
mod tests {
    use super::resize_bilinear;
    use ndarray::{array, Array2};

    #[test]
    fn identity_when_sizes_match() {
        let src = array![[0.0f32, 1.0], [2.0, 3.0]];
        let out = resize_bilinear(src.view(), 2, 2);
        assert_eq!(out, src);
    }

    #[test]
    fn constant_stays_constant() {
        let src = Array2::from_elem((3, 5), 0.7f32);
        let out = resize_bilinear(src.view(), 11, 4);
        assert!(out.iter().all(|v| (v - 0.7).abs() < 1e-6));
    }

    #[test]
    fn upsample_interpolates_half_pixel_centers() {
        let src = array![[0.0f32, 1.0]];
        let out = resize_bilinear(src.view(), 1, 4);
        let expected = [0.0f32, 0.25, 0.75, 1.0];
        for (v, e) in out.iter().zip(expected) {
            assert!((v - e).abs() < 1e-6, "{v} vs {e}");
        }
    }
}
