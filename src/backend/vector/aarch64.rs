//! NEON lane-group kernels for i32 convolution.
//!
//! `vmulq_s32`/`vaddq_s32` wrap on overflow, matching the scalar
//! `wrapping_*` path bit for bit.

use std::arch::aarch64::*;

use crate::grid::ConvShape;

/// Lane width 4: one 128-bit group per step, scalar tail for the remainder.
///
/// # Safety
/// Caller must verify NEON support; buffers must match `shape`.
#[target_feature(enable = "neon")]
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
                    let iv = vld1q_s32(img.add(fj));
                    let fv = vld1q_s32(fil.add(fj));
                    sum = sum.wrapping_add(vaddvq_s32(vmulq_s32(iv, fv)));
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

/// Lane width 16: four 128-bit groups per step, scalar tail for the remainder.
///
/// # Safety
/// Caller must verify NEON support; buffers must match `shape`.
#[target_feature(enable = "neon")]
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
                    let p0 = vmulq_s32(vld1q_s32(img.add(fj)), vld1q_s32(fil.add(fj)));
                    let p1 = vmulq_s32(vld1q_s32(img.add(fj + 4)), vld1q_s32(fil.add(fj + 4)));
                    let p2 = vmulq_s32(vld1q_s32(img.add(fj + 8)), vld1q_s32(fil.add(fj + 8)));
                    let p3 = vmulq_s32(vld1q_s32(img.add(fj + 12)), vld1q_s32(fil.add(fj + 12)));
                    let group = vaddq_s32(vaddq_s32(p0, p1), vaddq_s32(p2, p3));
                    sum = sum.wrapping_add(vaddvq_s32(group));
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
