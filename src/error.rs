//! Error types for convr

use thiserror::Error;

/// Result type alias using convr's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in convr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Buffer length disagrees with the declared grid dimensions
    #[error("Shape mismatch: {height}x{width} grid needs {expected} elements, got {got}")]
    ShapeMismatch {
        /// Declared number of rows
        height: usize,
        /// Declared number of columns
        width: usize,
        /// Expected buffer length (`height * width`)
        expected: usize,
        /// Actual buffer length
        got: usize,
    },

    /// Filter exceeds the image in at least one dimension
    #[error("Filter {filter_h}x{filter_w} does not fit inside image {image_h}x{image_w}")]
    FilterLargerThanImage {
        /// Image rows
        image_h: usize,
        /// Image columns
        image_w: usize,
        /// Filter rows
        filter_h: usize,
        /// Filter columns
        filter_w: usize,
    },

    /// No usable compute adapter was found for the device-offload backend
    #[error("Device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A device-offload setup stage failed
    #[error("Device setup failed at {stage}: {reason}")]
    DeviceSetup {
        /// The setup stage that failed (e.g. "context", "program_build")
        stage: &'static str,
        /// Driver-reported reason
        reason: String,
    },

    /// A backend's output differs from the scalar reference
    #[error(
        "{backend} output differs from scalar reference at index {index}: \
         expected {expected}, got {got}"
    )]
    Mismatch {
        /// Name of the disagreeing backend
        backend: &'static str,
        /// Flat row-major index of the first differing cell
        index: usize,
        /// Value computed by the scalar reference
        expected: i32,
        /// Value computed by the disagreeing backend
        got: i32,
    },
}

impl Error {
    /// Create a shape mismatch error for a buffer of length `got`
    pub fn shape_mismatch(height: usize, width: usize, got: usize) -> Self {
        Self::ShapeMismatch {
            height,
            width,
            expected: height * width,
            got,
        }
    }

    /// Create a filter-larger-than-image error
    pub fn filter_too_large(image: (usize, usize), filter: (usize, usize)) -> Self {
        Self::FilterLargerThanImage {
            image_h: image.0,
            image_w: image.1,
            filter_h: filter.0,
            filter_w: filter.1,
        }
    }

    /// Create a device setup error for a named stage
    pub fn device_setup(stage: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::DeviceSetup {
            stage,
            reason: reason.to_string(),
        }
    }
}
