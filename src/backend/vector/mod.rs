//! Lane-group convolution kernels for lane widths 4 and 16.
//!
//! The inner loop over the filter's columns runs in fixed-size lane groups:
//! load a contiguous run of image values and the co-located filter run,
//! multiply lane-wise, horizontally reduce the group to a scalar partial
//! sum, and accumulate. Remainder columns finish with the scalar tail step.
//!
//! Because the arithmetic is wraparound multiply-add, addition is
//! associative and commutative, and regrouping the summation into lanes
//! cannot change the per-cell result: every path here is bit-identical to
//! the scalar reference.
//!
//! # Dispatch
//!
//! Each width dispatches at runtime to an architecture path when one is
//! available:
//!
//! | Architecture | Instruction Set | Width 4 | Width 16 |
//! |--------------|-----------------|---------|----------|
//! | x86-64       | SSE4.1 / AVX2   | SSE4.1  | AVX2     |
//! | ARM64        | NEON            | NEON    | NEON     |
//! | Any          | Portable lanes  | Yes     | Yes      |

#[cfg(target_arch = "aarch64")]
mod aarch64;
#[cfg(target_arch = "x86_64")]
mod x86_64;

use std::sync::OnceLock;

use crate::grid::ConvShape;

/// Instruction set selected for lane-group kernels
///
/// All variants are defined on all platforms for API completeness, but
/// some are only constructed at runtime on their respective architectures.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[allow(dead_code)]
enum LaneIsa {
    /// AVX2 (256-bit vectors, 8 i32 lanes per register)
    Avx2,
    /// SSE4.1 (128-bit vectors, 4 i32 lanes per register)
    Sse41,
    /// NEON (128-bit vectors, 4 i32 lanes per register)
    Neon,
    /// Portable lane-array fallback
    Portable,
}

fn detect_lanes() -> LaneIsa {
    static ISA: OnceLock<LaneIsa> = OnceLock::new();
    *ISA.get_or_init(|| {
        #[cfg(target_arch = "x86_64")]
        {
            if std::arch::is_x86_feature_detected!("avx2") {
                return LaneIsa::Avx2;
            }
            if std::arch::is_x86_feature_detected!("sse4.1") {
                return LaneIsa::Sse41;
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            if std::arch::is_aarch64_feature_detected!("neon") {
                return LaneIsa::Neon;
            }
        }
        LaneIsa::Portable
    })
}

/// Lane width 4 convolution
pub(crate) fn convolve_vector4(image: &[i32], filter: &[i32], shape: &ConvShape, out: &mut [i32]) {
    match detect_lanes() {
        #[cfg(target_arch = "x86_64")]
        LaneIsa::Avx2 | LaneIsa::Sse41 => unsafe {
            x86_64::convolve_w4(image, filter, shape, out);
        },
        #[cfg(target_arch = "aarch64")]
        LaneIsa::Neon => unsafe {
            aarch64::convolve_w4(image, filter, shape, out);
        },
        _ => convolve_lanes::<4>(image, filter, shape, out),
    }
}

/// Lane width 16 convolution
pub(crate) fn convolve_vector16(image: &[i32], filter: &[i32], shape: &ConvShape, out: &mut [i32]) {
    match detect_lanes() {
        #[cfg(target_arch = "x86_64")]
        LaneIsa::Avx2 => unsafe {
            x86_64::convolve_w16(image, filter, shape, out);
        },
        #[cfg(target_arch = "aarch64")]
        LaneIsa::Neon => unsafe {
            aarch64::convolve_w16(image, filter, shape, out);
        },
        _ => convolve_lanes::<16>(image, filter, shape, out),
    }
}

/// Portable lane-group kernel.
///
/// `chunks_exact` forms the lane groups, a fixed-size array holds the
/// lane-wise products, and the fold is the horizontal reduce. The trailing
/// `filter_w mod LANES` columns run the scalar tail.
fn convolve_lanes<const LANES: usize>(
    image: &[i32],
    filter: &[i32],
    shape: &ConvShape,
    out: &mut [i32],
) {
    for i in 0..shape.out_h {
        for j in 0..shape.out_w {
            let mut sum = 0i32;
            for fi in 0..shape.filter_h {
                let img_run = &image[(i + fi) * shape.image_w + j..][..shape.filter_w];
                let fil_run = &filter[fi * shape.filter_w..][..shape.filter_w];

                let mut img_chunks = img_run.chunks_exact(LANES);
                let mut fil_chunks = fil_run.chunks_exact(LANES);
                for (iv, fv) in img_chunks.by_ref().zip(fil_chunks.by_ref()) {
                    let mut lanes = [0i32; LANES];
                    for l in 0..LANES {
                        lanes[l] = iv[l].wrapping_mul(fv[l]);
                    }
                    let partial = lanes.iter().fold(0i32, |acc, &p| acc.wrapping_add(p));
                    sum = sum.wrapping_add(partial);
                }

                for (&x, &w) in img_chunks.remainder().iter().zip(fil_chunks.remainder()) {
                    sum = sum.wrapping_add(x.wrapping_mul(w));
                }
            }
            out[i * shape.out_w + j] = sum;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scalar::convolve_scalar;
    use crate::grid::{ConvShape, Grid};

    fn expect_scalar(image: &Grid, filter: &Grid) -> (ConvShape, Vec<i32>) {
        let shape = ConvShape::new(image, filter).unwrap();
        let mut out = vec![0; shape.out_len()];
        convolve_scalar(image.as_slice(), filter.as_slice(), &shape, &mut out);
        (shape, out)
    }

    #[test]
    fn test_both_widths_match_scalar() {
        let image = Grid::from_fn(48, 48, |r, c| ((r * 131 + c * 29) % 251) as i32 - 100);
        let filter = Grid::from_fn(19, 19, |r, c| ((r * 7 + c * 3) % 11) as i32 - 5);
        let (shape, expected) = expect_scalar(&image, &filter);

        let mut got4 = vec![0; shape.out_len()];
        convolve_vector4(image.as_slice(), filter.as_slice(), &shape, &mut got4);
        assert_eq!(expected, got4);

        let mut got16 = vec![0; shape.out_len()];
        convolve_vector16(image.as_slice(), filter.as_slice(), &shape, &mut got16);
        assert_eq!(expected, got16);
    }

    #[test]
    fn test_remainder_tail_is_exercised() {
        // Widths deliberately not divisible by 4 or 16, including widths
        // below one full lane group.
        for filter_w in [1usize, 2, 3, 5, 7, 13, 17, 18, 19, 21] {
            let image = Grid::from_fn(25, 31, |r, c| ((r * 13 + c * 41) % 97) as i32);
            let filter = Grid::from_fn(3, filter_w, |r, c| (r * filter_w + c) as i32 - 4);
            let (shape, expected) = expect_scalar(&image, &filter);

            let mut got4 = vec![0; shape.out_len()];
            convolve_vector4(image.as_slice(), filter.as_slice(), &shape, &mut got4);
            assert_eq!(expected, got4, "width-4 tail, filter_w={filter_w}");

            let mut got16 = vec![0; shape.out_len()];
            convolve_vector16(image.as_slice(), filter.as_slice(), &shape, &mut got16);
            assert_eq!(expected, got16, "width-16 tail, filter_w={filter_w}");
        }
    }

    #[test]
    fn test_portable_lanes_match_scalar() {
        // The fallback must agree regardless of what detection picked.
        let image = Grid::from_fn(20, 40, |r, c| ((r * 3 + c * 7) % 64) as i32 - 32);
        let filter = Grid::from_fn(4, 9, |r, c| ((r + c) % 5) as i32);
        let (shape, expected) = expect_scalar(&image, &filter);

        let mut got = vec![0; shape.out_len()];
        convolve_lanes::<4>(image.as_slice(), filter.as_slice(), &shape, &mut got);
        assert_eq!(expected, got);

        let mut got = vec![0; shape.out_len()];
        convolve_lanes::<16>(image.as_slice(), filter.as_slice(), &shape, &mut got);
        assert_eq!(expected, got);
    }

    #[test]
    fn test_lane_grouping_preserves_wraparound() {
        let image = Grid::splat(i32::MAX, 6, 24);
        let filter = Grid::splat(3, 2, 17);
        let (shape, expected) = expect_scalar(&image, &filter);

        let mut got4 = vec![0; shape.out_len()];
        convolve_vector4(image.as_slice(), filter.as_slice(), &shape, &mut got4);
        assert_eq!(expected, got4);

        let mut got16 = vec![0; shape.out_len()];
        convolve_vector16(image.as_slice(), filter.as_slice(), &shape, &mut got16);
        assert_eq!(expected, got16);
    }
}
