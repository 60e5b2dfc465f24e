//! Scalar reference convolution kernel.
//!
//! This is the ground truth: every other backend must reproduce this
//! kernel's output bit for bit. Arithmetic is two's-complement wraparound
//! multiply-accumulate, which keeps debug builds from trapping on inputs
//! that legally overflow.

use crate::grid::ConvShape;

/// Weighted sum of the filter against the image window anchored at `(i, j)`.
#[inline]
pub(crate) fn window_sum(image: &[i32], filter: &[i32], shape: &ConvShape, i: usize, j: usize) -> i32 {
    let mut sum = 0i32;
    for fi in 0..shape.filter_h {
        let img_row = (i + fi) * shape.image_w + j;
        let fil_row = fi * shape.filter_w;
        for fj in 0..shape.filter_w {
            sum = sum.wrapping_add(image[img_row + fj].wrapping_mul(filter[fil_row + fj]));
        }
    }
    sum
}

/// Reference convolution: one `window_sum` per output cell.
pub(crate) fn convolve_scalar(image: &[i32], filter: &[i32], shape: &ConvShape, out: &mut [i32]) {
    for i in 0..shape.out_h {
        for j in 0..shape.out_w {
            out[i * shape.out_w + j] = window_sum(image, filter, shape, i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{ConvShape, Grid};

    #[test]
    fn test_hand_computed_2x2() {
        // 3x3 image, 2x2 filter, worked by hand.
        let image = Grid::from_vec(vec![1, 2, 3, 4, 5, 6, 7, 8, 9], 3, 3).unwrap();
        let filter = Grid::from_vec(vec![1, 0, 0, 2], 2, 2).unwrap();
        let shape = ConvShape::new(&image, &filter).unwrap();
        let mut out = vec![0; shape.out_len()];
        convolve_scalar(image.as_slice(), filter.as_slice(), &shape, &mut out);
        // out[i][j] = image[i][j] + 2 * image[i+1][j+1]
        assert_eq!(out, vec![1 + 10, 2 + 12, 4 + 16, 5 + 18]);
    }

    #[test]
    fn test_wraparound_is_defined() {
        let image = Grid::splat(i32::MAX, 2, 2);
        let filter = Grid::splat(2, 1, 1);
        let shape = ConvShape::new(&image, &filter).unwrap();
        let mut out = vec![0; shape.out_len()];
        convolve_scalar(image.as_slice(), filter.as_slice(), &shape, &mut out);
        assert_eq!(out, vec![i32::MAX.wrapping_mul(2); 4]);
    }
}
