//! Common test utilities
#![allow(dead_code)]

use convr::prelude::*;

/// Deterministic pattern image for parity tests
pub fn pattern_grid(height: usize, width: usize) -> Grid {
    Grid::from_fn(height, width, |r, c| ((r * 31 + c * 17) % 256) as i32)
}

/// Deterministic signed pattern filter
pub fn pattern_filter(height: usize, width: usize) -> Grid {
    Grid::from_fn(height, width, |r, c| ((r * 7 + c * 5) % 13) as i32 - 6)
}

/// Assert two i32 slices are exactly equal, element for element
pub fn assert_parity_i32(a: &[i32], b: &[i32], op: &str) {
    assert_eq!(
        a.len(),
        b.len(),
        "parity_i32[{}]: length mismatch: {} vs {}",
        op,
        a.len(),
        b.len()
    );

    for (i, (x, y)) in a.iter().zip(b.iter()).enumerate() {
        assert_eq!(x, y, "parity_i32[{}] at index {}: {} vs {}", op, i, x, y);
    }
}

/// True when the device-offload backend can run on this machine
#[cfg(feature = "wgpu")]
pub fn device_available() -> bool {
    convr::backend::wgpu::is_device_available()
}
