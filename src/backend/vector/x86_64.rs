//! SSE4.1/AVX2 lane-group kernels for i32 convolution.
//!
//! `_mm_mullo_epi32` and `_mm_add_epi32` keep the low 32 bits, so the
//! vector arithmetic wraps exactly like the scalar `wrapping_*` path.

use std::arch::x86_64::*;

use crate::grid::ConvShape;

/// Horizontal wrapping sum of four i32 lanes
#[target_feature(enable = "sse4.1")]
#[inline]
unsafe fn hsum_i32x4(v: __m128i) -> i32 {
    // Swap the 64-bit halves and add, then the 32-bit pairs.
    let swap64 = _mm_shuffle_epi32::<0b01_00_11_10>(v);
    let sum2 = _mm_add_epi32(v, swap64);
    let swap32 = _mm_shuffle_epi32::<0b10_11_00_01>(sum2);
    _mm_cvtsi128_si32(_mm_add_epi32(sum2, swap32))
}

/// Horizontal wrapping sum of eight i32 lanes
#[target_feature(enable = "avx2")]
#[inline]
unsafe fn hsum_i32x8(v: __m256i) -> i32 {
    let lo = _mm256_castsi256_si128(v);
    let hi = _mm256_extracti128_si256::<1>(v);
    hsum_i32x4(_mm_add_epi32(lo, hi))
}

/// Lane width 4: one 128-bit group per step, scalar tail for the remainder.
///
/// # Safety
/// Caller must verify SSE4.1 support; buffers must match `shape`.
#[target_feature(enable = "sse4.1")]
pub(super) unsafe fn convolve_w4(
    image: &[i32],
    filter: &[i32],
    shape: &ConvShape,
    out: &mut [i32],
) {
    let full = shape.filter_w - shape.filter_w % 4;
    for i in 0..shape.out_h {
        for j in 0..shape.out_w {
            let mut sum = 0i32;
            for fi in 0..shape.filter_h {
                let img = image.as_ptr().add((i + fi) * shape.image_w + j);
                let fil = filter.as_ptr().add(fi * shape.filter_w);

                let mut fj = 0;
                while fj < full {
                    let iv = _mm_loadu_si128(img.add(fj) as *const __m128i);
                    let fv = _mm_loadu_si128(fil.add(fj) as *const __m128i);
                    sum = sum.wrapping_add(hsum_i32x4(_mm_mullo_epi32(iv, fv)));
                    fj += 4;
                }
                while fj < shape.filter_w {
                    sum = sum.wrapping_add((*img.add(fj)).wrapping_mul(*fil.add(fj)));
                    fj += 1;
                }
            }
            out[i * shape.out_w + j] = sum;
        }
    }
}

/// Lane width 16: two 256-bit groups per step, scalar tail for the remainder.
///
/// # Safety
/// Caller must verify AVX2 support; buffers must match `shape`.
#[target_feature(enable = "avx2")]
pub(super) unsafe fn convolve_w16(
    image: &[i32],
    filter: &[i32],
    shape: &ConvShape,
    out: &mut [i32],
) {
    let full = shape.filter_w - shape.filter_w % 16;
    for i in 0..shape.out_h {
        for j in 0..shape.out_w {
            let mut sum = 0i32;
            for fi in 0..shape.filter_h {
                let img = image.as_ptr().add((i + fi) * shape.image_w + j);
                let fil = filter.as_ptr().add(fi * shape.filter_w);

                let mut fj = 0;
                while fj < full {
                    let iv0 = _mm256_loadu_si256(img.add(fj) as *const __m256i);
                    let fv0 = _mm256_loadu_si256(fil.add(fj) as *const __m256i);
                    let iv1 = _mm256_loadu_si256(img.add(fj + 8) as *const __m256i);
                    let fv1 = _mm256_loadu_si256(fil.add(fj + 8) as *const __m256i);
                    let group = _mm256_add_epi32(
                        _mm256_mullo_epi32(iv0, fv0),
                        _mm256_mullo_epi32(iv1, fv1),
                    );
                    sum = sum.wrapping_add(hsum_i32x8(group));
                    fj += 16;
                }
                while fj < shape.filter_w {
                    sum = sum.wrapping_add((*img.add(fj)).wrapping_mul(*fil.add(fj)));
                    fj += 1;
                }
            }
            out[i * shape.out_w + j] = sum;
        }
    }
}
