//! Benchmark harness: input generation, scoped timing, and the
//! cross-backend parity run.

use std::time::{Duration, Instant};

use rand::Rng;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::grid::{ConvShape, Grid};

/// Benchmark image rows
pub const IMAGE_HEIGHT: usize = 1024;
/// Benchmark image columns
pub const IMAGE_WIDTH: usize = 1024;
/// Benchmark filter rows
pub const FILTER_HEIGHT: usize = 19;
/// Benchmark filter columns
pub const FILTER_WIDTH: usize = 19;

/// Immutable benchmark configuration.
///
/// The defaults are the canonical benchmark geometry; tests construct
/// smaller configurations directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    /// Image rows
    pub image_h: usize,
    /// Image columns
    pub image_w: usize,
    /// Filter rows
    pub filter_h: usize,
    /// Filter columns
    pub filter_w: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            image_h: IMAGE_HEIGHT,
            image_w: IMAGE_WIDTH,
            filter_h: FILTER_HEIGHT,
            filter_w: FILTER_WIDTH,
        }
    }
}

/// Generate a pseudo-random image of independent uniform values in [0, 255].
///
/// Deliberately unseeded: the parity contract must hold for any input, so
/// the harness never depends on a particular image.
pub fn generate_image(height: usize, width: usize) -> Grid {
    let mut rng = rand::rng();
    Grid::from_fn(height, width, |_, _| rng.random_range(0..=255))
}

/// Scoped wall-clock timer reporting through the `log` channel on drop.
///
/// Purely observational: it records a label and the enclosing scope's
/// elapsed time, and never gates execution.
pub struct ScopedTimer {
    label: String,
    start: Instant,
}

impl ScopedTimer {
    /// Start timing a labeled scope
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        log::info!(
            "{} took {} microseconds",
            self.label,
            self.start.elapsed().as_micros()
        );
    }
}

/// How a backend's run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Produced the reference output
    Reference,
    /// Output matched the reference exactly
    Verified,
    /// Not run (no compute adapter available)
    Skipped,
}

/// One backend's timing and verification outcome.
#[derive(Clone, Copy, Debug)]
pub struct BackendRun {
    /// Which backend ran
    pub backend: Backend,
    /// Wall-clock duration of the convolution call
    pub elapsed: Duration,
    /// How the run ended
    pub status: RunStatus,
}

/// Outcome of a full parity run.
#[derive(Clone, Debug)]
pub struct ParityReport {
    /// Per-backend outcomes, in execution order
    pub runs: Vec<BackendRun>,
    /// Result cells compared per backend
    pub out_cells: usize,
}

/// Run every backend over one generated image and assert exact parity.
///
/// The scalar backend runs first and its output is the reference; each
/// remaining backend runs into a fresh result grid and is compared
/// element-for-element. The device backend is skipped, and recorded as
/// skipped, when no compute adapter is present.
pub fn run(cfg: &BenchConfig) -> Result<ParityReport> {
    let image = generate_image(cfg.image_h, cfg.image_w);
    let filter = Grid::splat(1, cfg.filter_h, cfg.filter_w);
    // Reject malformed configurations before any backend runs.
    let shape = ConvShape::new(&image, &filter)?;

    let mut runs = Vec::with_capacity(Backend::ALL.len());

    let (expected, elapsed) = timed(Backend::Scalar, &image, &filter)?;
    runs.push(BackendRun {
        backend: Backend::Scalar,
        elapsed,
        status: RunStatus::Reference,
    });

    for &backend in Backend::ALL {
        if backend == Backend::Scalar {
            continue;
        }

        #[cfg(feature = "wgpu")]
        if backend == Backend::DeviceOffload && !crate::backend::wgpu::is_device_available() {
            log::warn!("skipping {backend}: no compute adapter available");
            runs.push(BackendRun {
                backend,
                elapsed: Duration::ZERO,
                status: RunStatus::Skipped,
            });
            continue;
        }

        let (got, elapsed) = timed(backend, &image, &filter)?;
        compare_exact(&expected, &got, backend.name())?;
        runs.push(BackendRun {
            backend,
            elapsed,
            status: RunStatus::Verified,
        });
    }

    Ok(ParityReport {
        runs,
        out_cells: shape.out_len(),
    })
}

fn timed(backend: Backend, image: &Grid, filter: &Grid) -> Result<(Grid, Duration)> {
    let _timer = ScopedTimer::new(format!("convolution_{}", backend.name()));
    let start = Instant::now();
    let out = backend.convolve(image, filter)?;
    Ok((out, start.elapsed()))
}

/// Element-wise exact comparison against the scalar reference.
///
/// The first differing cell is a hard error; there is no tolerance and no
/// retry.
pub fn compare_exact(expected: &Grid, got: &Grid, backend: &'static str) -> Result<()> {
    debug_assert_eq!(expected.dims(), got.dims());
    for (index, (&e, &g)) in expected.as_slice().iter().zip(got.as_slice()).enumerate() {
        if e != g {
            return Err(Error::Mismatch {
                backend,
                index,
                expected: e,
                got: g,
            });
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_image_is_in_range() {
        let image = generate_image(32, 48);
        assert_eq!(image.dims(), (32, 48));
        assert!(image.as_slice().iter().all(|&v| (0..=255).contains(&v)));
    }

    #[test]
    fn test_small_parity_run() {
        let cfg = BenchConfig {
            image_h: 64,
            image_w: 64,
            filter_h: 9,
            filter_w: 9,
        };
        let report = run(&cfg).expect("parity run should pass");
        assert_eq!(report.out_cells, 56 * 56);
        assert_eq!(report.runs.len(), Backend::ALL.len());
        assert_eq!(report.runs[0].status, RunStatus::Reference);
        for run in &report.runs[1..] {
            assert_ne!(run.status, RunStatus::Reference, "{}", run.backend);
        }
    }

    #[test]
    fn test_oversized_filter_rejected_before_backends() {
        let cfg = BenchConfig {
            image_h: 10,
            image_w: 10,
            filter_h: 11,
            filter_w: 3,
        };
        assert!(matches!(
            run(&cfg),
            Err(Error::FilterLargerThanImage { .. })
        ));
    }

    #[test]
    fn test_compare_exact_reports_first_difference() {
        let a = Grid::from_vec(vec![1, 2, 3, 4], 2, 2).unwrap();
        let mut b = a.clone();
        b[(1, 0)] = 9;
        let err = compare_exact(&a, &b, "test").unwrap_err();
        assert!(matches!(
            err,
            Error::Mismatch {
                index: 2,
                expected: 3,
                got: 9,
                ..
            }
        ));
    }
}
