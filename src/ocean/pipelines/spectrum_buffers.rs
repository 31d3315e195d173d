use wgpu::util::DeviceExt;

use crate::ocean::config::OceanSimulationConfig;
use crate::ocean::ocean_parameters::bake_spectrum_records;

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SimulationParameters {
  size: u32,
  domain_count: u32,
  low_cutoff: f32,
  high_cutoff: f32,
  depth: f32,
  gravity: f32,
  _padding: [f32; 2],
}

/// Bake-time constants shared by the initial spectrum and evolution kernels:
/// simulation uniforms, the spectrum records and the per-domain patch sizes.
pub struct SpectrumBuffers {
  pub(crate) bind_group_layout: wgpu::BindGroupLayout,
  pub(crate) bind_group: wgpu::BindGroup,
}

impl SpectrumBuffers {
  pub fn init(device: &wgpu::Device, config: &OceanSimulationConfig) -> Self {
    let parameters = SimulationParameters {
      size: config.texture_size,
      domain_count: config.domain_count as u32,
      low_cutoff: config.low_cutoff,
      high_cutoff: config.high_cutoff,
      depth: config.depth,
      gravity: config.gravity,
      _padding: [0.0; 2],
    };

    let records = bake_spectrum_records(&config.layers, config.gravity);
    let domain_sizes = config.domain_sizes();

    let parameters_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Simulation parameters buffer"),
      contents: bytemuck::cast_slice(&[parameters]),
      usage: wgpu::BufferUsages::UNIFORM,
    });

    let spectrum_records_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Spectrum records buffer"),
      contents: bytemuck::cast_slice(&records),
      usage: wgpu::BufferUsages::STORAGE,
    });

    let domain_sizes_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Domain sizes buffer"),
      contents: bytemuck::cast_slice(&domain_sizes),
      usage: wgpu::BufferUsages::STORAGE,
    });

    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
      label: Some("Spectrum parameters bind group layout"),
      entries: &[
        wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::COMPUTE,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        },
        wgpu::BindGroupLayoutEntry {
          binding: 1,
          visibility: wgpu::ShaderStages::COMPUTE,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        },
        wgpu::BindGroupLayoutEntry {
          binding: 2,
          visibility: wgpu::ShaderStages::COMPUTE,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: true },
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        },
      ],
    });

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("Spectrum parameters bind group"),
      layout: &bind_group_layout,
      entries: &[
        wgpu::BindGroupEntry {
          binding: 0,
          resource: parameters_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 1,
          resource: spectrum_records_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
          binding: 2,
          resource: domain_sizes_buffer.as_entire_binding(),
        },
      ],
    });

    Self {
      bind_group_layout,
      bind_group,
    }
  }
}
