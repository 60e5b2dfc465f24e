//! Device-offload backend via WebGPU (requires the `wgpu` feature).
//!
//! Marshals image and filter into device-visible buffers, compiles the
//! convolution kernel at run time, dispatches it over a 2D index space
//! sized to the result, and reads the result back. All device resources
//! live for exactly one invocation; nothing is shared across calls, so
//! concurrent invocations never alias a context or queue.

mod device;
mod offload;

pub use device::is_device_available;
pub use offload::convolve_device;
