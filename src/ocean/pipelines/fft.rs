use crate::ocean::schedule::{self, BufferRole, FftAxis, FftStep, Schedule};
use crate::ocean::textures::{self, OceanTextures};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Parameters {
  step: u32,
  size: u32,
}

/// Ping-pong inverse FFT over the evolved spectrum array.
///
/// Every step reads one of the two buffers through a sampled view and writes the other
/// through a storage view, so there is one bind group per source role.
pub struct FFT {
  schedule: Schedule,

  precompute_pipeline: wgpu::ComputePipeline,
  precompute_bind_group: wgpu::BindGroup,

  horizontal_step_pipeline: wgpu::ComputePipeline,
  vertical_step_pipeline: wgpu::ComputePipeline,
  from_spectrum_bind_group: wgpu::BindGroup,
  from_ping_pong_bind_group: wgpu::BindGroup,
}

impl FFT {
  pub fn init(device: &wgpu::Device, schedule: Schedule, ocean_textures: &OceanTextures) -> Self {
    let push_constant_ranges = [wgpu::PushConstantRange {
      stages: wgpu::ShaderStages::COMPUTE,
      range: 0..std::mem::size_of::<Parameters>() as u32,
    }];

    let precompute_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("FFT precompute bind group layout"),
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::COMPUTE,
          ty: wgpu::BindingType::StorageTexture {
            view_dimension: wgpu::TextureViewDimension::D2,
            format: textures::SPECTRUM_FORMAT,
            access: wgpu::StorageTextureAccess::WriteOnly,
          },
          count: None,
        }],
      });

    let precompute_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("FFT precompute bind group"),
      layout: &precompute_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: wgpu::BindingResource::TextureView(&textures::plain_view(&ocean_textures.twiddle)),
      }],
    });

    let precompute_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("FFT twiddle shader"),
      source: wgpu::ShaderSource::Wgsl(include_str!("./shaders/twiddle.wgsl").into()),
    });

    let precompute_pipeline_layout =
      device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("FFT precompute pipeline layout"),
        bind_group_layouts: &[&precompute_bind_group_layout],
        push_constant_ranges: &push_constant_ranges,
      });

    let precompute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
      label: Some("FFT - Calculate twiddle factors and input indices"),
      layout: Some(&precompute_pipeline_layout),
      module: &precompute_shader,
      entry_point: Some("calculate_twiddle_factors_and_input_indices"),
      compilation_options: Default::default(),
      cache: None,
    });

    let step_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("FFT step bind group layout"),
        entries: &[
          // twiddle factors
          wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::COMPUTE,
            ty: wgpu::BindingType::Texture {
              view_dimension: wgpu::TextureViewDimension::D2,
              sample_type: wgpu::TextureSampleType::Float { filterable: false },
              multisampled: false,
            },
            count: None,
          },
          // source
          textures::input_array_entry(1),
          // destination
          textures::output_array_entry(2, textures::SPECTRUM_FORMAT),
        ],
      });

    let step_bind_group = |role: BufferRole| {
      device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(match role {
          BufferRole::Spectrum => "FFT step - spectrum to ping-pong",
          BufferRole::PingPong => "FFT step - ping-pong to spectrum",
        }),
        layout: &step_bind_group_layout,
        entries: &[
          wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(&textures::plain_view(
              &ocean_textures.twiddle,
            )),
          },
          wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::TextureView(&textures::array_view(
              ocean_textures.buffer(role),
              0,
            )),
          },
          wgpu::BindGroupEntry {
            binding: 2,
            resource: wgpu::BindingResource::TextureView(&textures::array_view(
              ocean_textures.buffer(role.other()),
              0,
            )),
          },
        ],
      })
    };

    let from_spectrum_bind_group = step_bind_group(BufferRole::Spectrum);
    let from_ping_pong_bind_group = step_bind_group(BufferRole::PingPong);

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("FFT shader"),
      source: wgpu::ShaderSource::Wgsl(include_str!("./shaders/fft.wgsl").into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("FFT pipeline layout"),
      bind_group_layouts: &[&step_bind_group_layout],
      push_constant_ranges: &push_constant_ranges,
    });

    let horizontal_step_pipeline =
      device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("FFT - Horizontal step"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("horizontal_step_inverse_fft"),
        compilation_options: Default::default(),
        cache: None,
      });

    let vertical_step_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
      label: Some("FFT - Vertical step"),
      layout: Some(&pipeline_layout),
      module: &shader,
      entry_point: Some("vertical_step_inverse_fft"),
      compilation_options: Default::default(),
      cache: None,
    });

    Self {
      schedule,
      precompute_pipeline,
      precompute_bind_group,
      horizontal_step_pipeline,
      vertical_step_pipeline,
      from_spectrum_bind_group,
      from_ping_pong_bind_group,
    }
  }

  /// Fills the twiddle texture. Depends only on the transform size.
  pub fn precompute(&self, encoder: &mut wgpu::CommandEncoder) {
    let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
      label: Some("FFT precompute"),
      timestamp_writes: None,
    });

    let parameters = Parameters {
      step: 0,
      size: self.schedule.size(),
    };

    compute_pass.set_pipeline(&self.precompute_pipeline);
    compute_pass.set_bind_group(0, &self.precompute_bind_group, &[]);
    compute_pass.set_push_constants(0, bytemuck::cast_slice(&[parameters]));

    let [x, y, z] = self.schedule.twiddle().workgroups;
    compute_pass.dispatch_workgroups(x, y, z);
  }

  /// Full 2D inverse transform; the result is left in the spectrum array.
  pub fn dispatch(&self, encoder: &mut wgpu::CommandEncoder, ocean_textures: &OceanTextures) {
    self.dispatch_steps(encoder, ocean_textures, &self.schedule.inverse_fft_steps());
  }

  /// One-dimensional transform along `axis` for every row or column of every layer.
  pub fn dispatch_axis(
    &self,
    encoder: &mut wgpu::CommandEncoder,
    ocean_textures: &OceanTextures,
    axis: FftAxis,
  ) -> bool {
    self.dispatch_steps(encoder, ocean_textures, &self.schedule.axis_steps(axis))
  }

  /// Encodes `steps` in order and copies the result back into the spectrum array when
  /// the last step wrote the ping-pong array. Returns whether that copy was encoded.
  fn dispatch_steps(
    &self,
    encoder: &mut wgpu::CommandEncoder,
    ocean_textures: &OceanTextures,
    steps: &[FftStep],
  ) -> bool {
    {
      let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("FFT"),
        timestamp_writes: None,
      });

      let [x, y, z] = self.schedule.fft_workgroups();
      for step in steps {
        compute_pass.set_pipeline(match step.axis {
          FftAxis::Horizontal => &self.horizontal_step_pipeline,
          FftAxis::Vertical => &self.vertical_step_pipeline,
        });
        compute_pass.set_bind_group(
          0,
          match step.source {
            BufferRole::Spectrum => &self.from_spectrum_bind_group,
            BufferRole::PingPong => &self.from_ping_pong_bind_group,
          },
          &[],
        );

        let parameters = Parameters {
          step: step.stage,
          size: self.schedule.size(),
        };
        compute_pass.set_push_constants(0, bytemuck::cast_slice(&[parameters]));
        compute_pass.dispatch_workgroups(x, y, z);
      }
    }

    let copy_back = schedule::steps_need_copy_back(steps);
    if copy_back {
      log::debug!("FFT finished in the ping-pong array, copying back");
      self.copy_ping_pong_to_spectrum(encoder, ocean_textures);
    }

    copy_back
  }

  fn copy_ping_pong_to_spectrum(
    &self,
    encoder: &mut wgpu::CommandEncoder,
    ocean_textures: &OceanTextures,
  ) {
    let size = self.schedule.size();
    encoder.copy_texture_to_texture(
      wgpu::ImageCopyTexture {
        texture: ocean_textures.ping_pong(),
        mip_level: 0,
        origin: wgpu::Origin3d::ZERO,
        aspect: wgpu::TextureAspect::All,
      },
      wgpu::ImageCopyTexture {
        texture: ocean_textures.spectrum(),
        mip_level: 0,
        origin: wgpu::Origin3d::ZERO,
        aspect: wgpu::TextureAspect::All,
      },
      wgpu::Extent3d {
        width: size,
        height: size,
        depth_or_array_layers: self.schedule.spectrum_layers(),
      },
    );
  }
}
