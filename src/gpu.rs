//! Headless device creation for the demo binary and the GPU tests.

use crate::ocean::{OceanSurface, ResourceError};

pub struct GpuContext {
  pub instance: wgpu::Instance,
  pub adapter: wgpu::Adapter,
  pub device: wgpu::Device,
  pub queue: wgpu::Queue,
}

impl GpuContext {
  /// Picks a high-performance adapter and requests a device with everything the ocean needs.
  pub async fn new() -> Result<Self, ResourceError> {
    let instance = wgpu::Instance::default();
    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
      })
      .await
      .ok_or(ResourceError::NoAdapter)?;

    let info = adapter.get_info();
    log::info!("using adapter {} ({:?})", info.name, info.backend);

    let required_features = OceanSurface::required_features();
    let missing = required_features.difference(adapter.features());
    if !missing.is_empty() {
      return Err(ResourceError::MissingFeatures(missing));
    }

    let adapter_limits = adapter.limits();
    let required_limits = OceanSurface::required_limits();
    if adapter_limits.max_push_constant_size < required_limits.max_push_constant_size {
      return Err(ResourceError::PushConstantLimit {
        available: adapter_limits.max_push_constant_size,
        required: required_limits.max_push_constant_size,
      });
    }

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: Some("Ocean device"),
          required_features,
          required_limits: required_limits.using_resolution(adapter_limits),
          memory_hints: wgpu::MemoryHints::Performance,
        },
        None,
      )
      .await?;

    Ok(Self {
      instance,
      adapter,
      device,
      queue,
    })
  }

  pub fn blocking() -> Result<Self, ResourceError> {
    pollster::block_on(Self::new())
  }
}
