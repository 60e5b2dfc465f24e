//! Compute adapter discovery for the device-offload backend.

use crate::error::{Error, Result};

/// Select a compute adapter: the first enumerated adapter, falling back to
/// a high-performance request when enumeration comes back empty.
pub(crate) async fn request_adapter() -> Result<wgpu::Adapter> {
    let instance = wgpu::Instance::default();

    let adapters: Vec<_> = instance.enumerate_adapters(wgpu::Backends::all()).await;
    if let Some(adapter) = adapters.into_iter().next() {
        return Ok(adapter);
    }

    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|_| Error::DeviceUnavailable("no compute adapter found".into()))
}

/// Blocking adapter selection using pollster.
pub(crate) fn request_adapter_blocking() -> Result<wgpu::Adapter> {
    pollster::block_on(request_adapter())
}

/// Check if a compute adapter is available on this system
pub fn is_device_available() -> bool {
    request_adapter_blocking().is_ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_probe() {
        match request_adapter_blocking() {
            Ok(adapter) => {
                let info = adapter.get_info();
                println!("Adapter: {} ({:?})", info.name, info.backend);
                assert!(is_device_available());
            }
            Err(e) => {
                println!("No GPU available, skipping test: {}", e);
                assert!(!is_device_available());
            }
        }
    }
}
