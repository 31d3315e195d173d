use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::ocean::pipelines::SpectrumBuffers;
use crate::ocean::schedule::Schedule;
use crate::ocean::textures::{self, OceanTextures};

/// Synthesises `h0` from the noise layers, then packs it with its mirrored conjugate.
///
/// Both kernels share one layout: an input array read with `textureLoad` and an output
/// storage array. The first pass writes the `h0k` scratch array so the conjugate pass
/// never reads texels another invocation is writing.
pub struct InitialSpectrumPipeline {
  schedule: Schedule,
  initial_bind_group: wgpu::BindGroup,
  conjugate_bind_group: wgpu::BindGroup,
  calculate_initial_spectrum_pipeline: wgpu::ComputePipeline,
  calculate_conjugated_spectrum_pipeline: wgpu::ComputePipeline,
}

impl InitialSpectrumPipeline {
  pub fn init(
    device: &wgpu::Device,
    schedule: Schedule,
    ocean_textures: &OceanTextures,
    spectrum_buffers: &SpectrumBuffers,
  ) -> Self {
    let texture_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("IS - Texture bind group layout"),
        entries: &[
          textures::input_array_entry(0),
          textures::output_array_entry(1, textures::SPECTRUM_FORMAT),
        ],
      });

    let initial_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("IS - Noise to h0k"),
      layout: &texture_bind_group_layout,
      entries: &[
        wgpu::BindGroupEntry {
          binding: 0,
          resource: wgpu::BindingResource::TextureView(&textures::array_view(
            &ocean_textures.noise,
            0,
          )),
        },
        wgpu::BindGroupEntry {
          binding: 1,
          resource: wgpu::BindingResource::TextureView(&textures::array_view(
            &ocean_textures.h0k,
            0,
          )),
        },
      ],
    });

    let conjugate_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      label: Some("IS - h0k to initial spectrum"),
      layout: &texture_bind_group_layout,
      entries: &[
        wgpu::BindGroupEntry {
          binding: 0,
          resource: wgpu::BindingResource::TextureView(&textures::array_view(
            &ocean_textures.h0k,
            0,
          )),
        },
        wgpu::BindGroupEntry {
          binding: 1,
          resource: wgpu::BindingResource::TextureView(&textures::array_view(
            &ocean_textures.initial_spectrum,
            0,
          )),
        },
      ],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("Initial spectrum shader"),
      source: wgpu::ShaderSource::Wgsl(
        concat!(
          include_str!("./shaders/spectrum_common.wgsl"),
          include_str!("./shaders/initial_spectrum.wgsl")
        )
        .into(),
      ),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("Initial spectrum pipeline layout"),
      bind_group_layouts: &[&texture_bind_group_layout, &spectrum_buffers.bind_group_layout],
      push_constant_ranges: &[],
    });

    let calculate_initial_spectrum_pipeline =
      device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Initial spectrum pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("calculate_initial_spectrum"),
        compilation_options: Default::default(),
        cache: None,
      });

    let calculate_conjugated_spectrum_pipeline =
      device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some("Calculate conjugated spectrum pipeline"),
        layout: Some(&pipeline_layout),
        module: &shader,
        entry_point: Some("calculate_conjugated_spectrum"),
        compilation_options: Default::default(),
        cache: None,
      });

    Self {
      schedule,
      initial_bind_group,
      conjugate_bind_group,
      calculate_initial_spectrum_pipeline,
      calculate_conjugated_spectrum_pipeline,
    }
  }

  pub fn dispatch(&self, encoder: &mut wgpu::CommandEncoder, spectrum_buffers: &SpectrumBuffers) {
    let [initial, conjugate] = self.schedule.initial_spectrum();

    {
      let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("Calculate Initial Spectrum"),
        timestamp_writes: None,
      });
      compute_pass.set_pipeline(&self.calculate_initial_spectrum_pipeline);
      compute_pass.set_bind_group(0, &self.initial_bind_group, &[]);
      compute_pass.set_bind_group(1, &spectrum_buffers.bind_group, &[]);
      let [x, y, z] = initial.workgroups;
      compute_pass.dispatch_workgroups(x, y, z);
    }

    {
      let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
        label: Some("Calculate Conjugated Spectrum"),
        timestamp_writes: None,
      });
      compute_pass.set_pipeline(&self.calculate_conjugated_spectrum_pipeline);
      compute_pass.set_bind_group(0, &self.conjugate_bind_group, &[]);
      compute_pass.set_bind_group(1, &spectrum_buffers.bind_group, &[]);
      let [x, y, z] = conjugate.workgroups;
      compute_pass.dispatch_workgroups(x, y, z);
    }
  }
}

/// Four uniform samples in `(0, 1]` per texel and domain, layer after layer.
/// The shader turns them into two Gaussian pairs, so zero is excluded.
pub fn generate_noise_data(size: usize, domain_count: usize, seed: u64) -> Vec<f32> {
  let mut rng = StdRng::seed_from_u64(seed);
  (0..4 * size * size * domain_count)
    .map(|_| 1.0 - rng.gen::<f32>())
    .collect()
}
