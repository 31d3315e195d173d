use crate::ocean::ocean_parameters::FrameParameters;
use crate::ocean::schedule::Schedule;
use crate::ocean::textures::{self, OceanTextures};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Parameters {
  lambda: [f32; 2],
  foam_bias: f32,
  foam_threshold: f32,
  foam_intensity: f32,
  size: u32,
  domain_count: u32,
  _padding: u32,
}

/// Turns the spatial-domain spectrum into displacement (xyz + foam) and slope, level 0.
pub struct WavesDataMergePipeline {
  schedule: Schedule,
  textures_bind_group: wgpu::BindGroup,
  pipeline: wgpu::ComputePipeline,
}

impl WavesDataMergePipeline {
  pub fn init(device: &wgpu::Device, schedule: Schedule, ocean_textures: &OceanTextures) -> Self {
    let textures_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Waves data merge - texture bind group layout"),
        entries: &[
          textures::input_array_entry(0),
          textures::output_array_entry(1, textures::DISPLACEMENT_FORMAT),
          textures::output_array_entry(2, textures::SLOPE_FORMAT),
        ],
      });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("Waves data merge pipeline layout"),
      bind_group_layouts: &[&textures_bind_group_layout],
      push_constant_ranges: &[wgpu::PushConstantRange {
        stages: wgpu::ShaderStages::COMPUTE,
        range: 0..std::mem::size_of::<Parameters>() as u32,
      }],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("Waves data merge shader"),
      source: wgpu::ShaderSource::Wgsl(include_str!("./shaders/waves_data_merge.wgsl").into()),
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
      label: Some("Waves data merge pipeline"),
      layout: Some(&pipeline_layout),
      module: &shader,
      entry_point: Some("assemble_textures"),
      compilation_options: Default::default(),
      cache: None,
    });

    let textures_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("Waves data merge - textures"),
      layout: &textures_bind_group_layout,
      entries: &[
        wgpu::BindGroupEntry {
          binding: 0,
          resource: wgpu::BindingResource::TextureView(&textures::array_view(
            &ocean_textures.spectrum,
            0,
          )),
        },
        wgpu::BindGroupEntry {
          binding: 1,
          resource: wgpu::BindingResource::TextureView(&textures::array_view(
            &ocean_textures.displacement,
            0,
          )),
        },
        wgpu::BindGroupEntry {
          binding: 2,
          resource: wgpu::BindingResource::TextureView(&textures::array_view(
            &ocean_textures.slope,
            0,
          )),
        },
      ],
    });

    Self {
      schedule,
      textures_bind_group,
      pipeline,
    }
  }

  pub fn dispatch(&self, encoder: &mut wgpu::CommandEncoder, frame: &FrameParameters) {
    let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
      label: Some("Waves data merge"),
      timestamp_writes: None,
    });

    let parameters = Parameters {
      lambda: frame.lambda,
      foam_bias: frame.foam_bias,
      foam_threshold: frame.foam_threshold,
      foam_intensity: frame.foam_intensity,
      size: self.schedule.size(),
      domain_count: self.schedule.domain_count(),
      _padding: 0,
    };

    compute_pass.set_pipeline(&self.pipeline);
    compute_pass.set_bind_group(0, &self.textures_bind_group, &[]);
    compute_pass.set_push_constants(0, bytemuck::cast_slice(&[parameters]));
    let [x, y, z] = self.schedule.assemble().workgroups;
    compute_pass.dispatch_workgroups(x, y, z);
  }
}
