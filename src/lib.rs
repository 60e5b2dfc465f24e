//! # convr
//!
//! **Bit-exact 2D integer convolution across interchangeable backends.**
//!
//! convr implements one fixed mathematical operation — the sliding-window
//! weighted sum of an integer filter over every valid window of an integer
//! image — several different ways, and guarantees each backend produces
//! the same output bit for bit:
//!
//! - **Scalar**: the quadruple-nested-loop reference
//! - **Memoizing**: scalar plus a per-cell result cache
//! - **Vector4 / Vector16**: lane-group multiply-accumulate at widths 4
//!   and 16, with runtime-dispatched SSE4.1/AVX2 and NEON paths
//! - **DeviceOffload**: the same kernel compiled and dispatched on a GPU
//!   through WebGPU (requires the `wgpu` feature)
//!
//! Arithmetic is two's-complement wraparound multiply-accumulate, which
//! makes the summation order irrelevant: regrouping into lanes or GPU
//! invocations cannot change any result cell.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use convr::prelude::*;
//!
//! let image = Grid::splat(2, 32, 32);
//! let filter = Grid::splat(1, 19, 19);
//!
//! let expected = Backend::Scalar.convolve(&image, &filter)?;
//! let got = Backend::Vector16.convolve(&image, &filter)?;
//! assert_eq!(expected, got);
//! ```
//!
//! ## Feature Flags
//!
//! - `wgpu` (default): GPU device-offload backend via WebGPU

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod error;
pub mod grid;
pub mod harness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::Backend;
    pub use crate::error::{Error, Result};
    pub use crate::grid::{ConvShape, Grid};
    pub use crate::harness::BenchConfig;
}
