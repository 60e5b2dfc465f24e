//! Interchangeable convolution backends.
//!
//! Every backend computes the identical result for identical inputs; they
//! differ only in how the per-cell summation is evaluated. The scalar
//! variant is the reference the others are verified against.

pub(crate) mod memo;
pub(crate) mod scalar;
pub(crate) mod vector;
#[cfg(feature = "wgpu")]
pub mod wgpu;

use crate::error::Result;
use crate::grid::{ConvShape, Grid};

/// The closed set of convolution backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Quadruple-nested-loop reference
    Scalar,
    /// Scalar plus a per-cell result cache
    Memoizing,
    /// Lane-group multiply-accumulate, lane width 4
    Vector4,
    /// Lane-group multiply-accumulate, lane width 16
    Vector16,
    /// GPU offload via WebGPU
    #[cfg(feature = "wgpu")]
    DeviceOffload,
}

impl Backend {
    /// Every backend, in the order the harness runs them.
    pub const ALL: &'static [Backend] = &[
        Backend::Scalar,
        Backend::Memoizing,
        Backend::Vector4,
        Backend::Vector16,
        #[cfg(feature = "wgpu")]
        Backend::DeviceOffload,
    ];

    /// Short stable name used in logs and error reports
    pub fn name(self) -> &'static str {
        match self {
            Backend::Scalar => "scalar",
            Backend::Memoizing => "memoizing",
            Backend::Vector4 => "vector4",
            Backend::Vector16 => "vector16",
            #[cfg(feature = "wgpu")]
            Backend::DeviceOffload => "device-offload",
        }
    }

    /// Convolve `filter` over `image` into a fresh result grid.
    ///
    /// The shape invariant is validated before any backend code runs. For
    /// the same inputs, every variant returns the exact output of
    /// [`Backend::Scalar`].
    pub fn convolve(self, image: &Grid, filter: &Grid) -> Result<Grid> {
        let shape = ConvShape::new(image, filter)?;

        #[cfg(feature = "wgpu")]
        if self == Backend::DeviceOffload {
            return wgpu::convolve_device(image, filter, &shape);
        }

        let mut out = Grid::zeros(shape.out_h, shape.out_w);
        let (img, fil) = (image.as_slice(), filter.as_slice());
        match self {
            Backend::Scalar => scalar::convolve_scalar(img, fil, &shape, out.as_mut_slice()),
            Backend::Memoizing => memo::convolve_memo(img, fil, &shape, out.as_mut_slice()),
            Backend::Vector4 => vector::convolve_vector4(img, fil, &shape, out.as_mut_slice()),
            Backend::Vector16 => vector::convolve_vector16(img, fil, &shape, out.as_mut_slice()),
            #[cfg(feature = "wgpu")]
            Backend::DeviceOffload => unreachable!("device offload returns above"),
        }
        Ok(out)
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
