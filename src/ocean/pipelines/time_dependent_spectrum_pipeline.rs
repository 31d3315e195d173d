use crate::ocean::pipelines::SpectrumBuffers;
use crate::ocean::schedule::Schedule;
use crate::ocean::textures::{self, OceanTextures};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
  time: f32,
  repeat_time: f32,
}

pub struct TimeDependentSpectrumPipeline {
  schedule: Schedule,
  textures_bind_group: wgpu::BindGroup,
  pipeline: wgpu::ComputePipeline,
}

impl TimeDependentSpectrumPipeline {
  pub fn init(
    device: &wgpu::Device,
    schedule: Schedule,
    ocean_textures: &OceanTextures,
    spectrum_buffers: &SpectrumBuffers,
  ) -> Self {
    let texture_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Time-dependent spectrum texture bind group layout"),
        entries: &[
          // initial spectrum
          textures::input_array_entry(0),
          // evolved spectrum, two layers per domain
          textures::output_array_entry(1, textures::SPECTRUM_FORMAT),
        ],
      });

    let textures_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("Time-dependent spectrum texture bind group"),
      layout: &texture_bind_group_layout,
      entries: &[
        wgpu::BindGroupEntry {
          binding: 0,
          resource: wgpu::BindingResource::TextureView(&textures::array_view(
            &ocean_textures.initial_spectrum,
            0,
          )),
        },
        wgpu::BindGroupEntry {
          binding: 1,
          resource: wgpu::BindingResource::TextureView(&textures::array_view(
            &ocean_textures.spectrum,
            0,
          )),
        },
      ],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("Time-dependent spectrum shader"),
      source: wgpu::ShaderSource::Wgsl(
        concat!(
          include_str!("./shaders/spectrum_common.wgsl"),
          include_str!("./shaders/time_dependent_spectrum.wgsl")
        )
        .into(),
      ),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("Time-dependent spectrum pipeline layout"),
      bind_group_layouts: &[&texture_bind_group_layout, &spectrum_buffers.bind_group_layout],
      push_constant_ranges: &[wgpu::PushConstantRange {
        stages: wgpu::ShaderStages::COMPUTE,
        range: 0..std::mem::size_of::<Params>() as u32,
      }],
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
      label: Some("Time-dependent spectrum pipeline"),
      layout: Some(&pipeline_layout),
      module: &shader,
      entry_point: Some("calculate_amplitudes"),
      compilation_options: Default::default(),
      cache: None,
    });

    Self {
      schedule,
      textures_bind_group,
      pipeline,
    }
  }

  pub fn dispatch(
    &self,
    encoder: &mut wgpu::CommandEncoder,
    spectrum_buffers: &SpectrumBuffers,
    time: f32,
    repeat_time: f32,
  ) {
    let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
      label: Some("Calculate time-dependent spectrum"),
      timestamp_writes: None,
    });

    let params = Params { time, repeat_time };

    compute_pass.set_pipeline(&self.pipeline);
    compute_pass.set_bind_group(0, &self.textures_bind_group, &[]);
    compute_pass.set_bind_group(1, &spectrum_buffers.bind_group, &[]);
    compute_pass.set_push_constants(0, bytemuck::cast_slice(&[params]));
    let [x, y, z] = self.schedule.evolve().workgroups;
    compute_pass.dispatch_workgroups(x, y, z);
  }
}
