use crate::ocean::schedule::{Kernel, Schedule};
use crate::ocean::textures::{self, OceanTextures};

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct Params {
  size: u32,
}

/// Box-filters displacement and slope down the whole mip chain, one dispatch per level.
pub struct GenerateMipmapsPipeline {
  schedule: Schedule,
  // One bind group per generated level, index 0 writes level 1.
  level_bind_groups: Vec<wgpu::BindGroup>,
  pipeline: wgpu::ComputePipeline,
}

impl GenerateMipmapsPipeline {
  pub fn init(device: &wgpu::Device, schedule: Schedule, ocean_textures: &OceanTextures) -> Self {
    let textures_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("generate mipmaps - texture bind group layout"),
        entries: &[
          // displacement, previous level
          textures::input_array_entry(0),
          // displacement, level being written
          textures::output_array_entry(1, textures::DISPLACEMENT_FORMAT),
          // slope, previous level
          textures::input_array_entry(2),
          // slope, level being written
          textures::output_array_entry(3, textures::SLOPE_FORMAT),
        ],
      });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("Generate mipmaps pipeline layout"),
      bind_group_layouts: &[&textures_bind_group_layout],
      push_constant_ranges: &[wgpu::PushConstantRange {
        stages: wgpu::ShaderStages::COMPUTE,
        range: 0..std::mem::size_of::<Params>() as u32,
      }],
    });

    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("Generate mipmaps shader"),
      source: wgpu::ShaderSource::Wgsl(include_str!("./shaders/generate_mipmaps.wgsl").into()),
    });

    let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
      label: Some("Generate mipmaps pipeline"),
      layout: Some(&pipeline_layout),
      module: &shader,
      entry_point: Some("main"),
      compilation_options: Default::default(),
      cache: None,
    });

    let level_bind_groups = (1..schedule.mip_level_count())
      .map(|level| {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
          label: Some("Generate mipmaps textures"),
          layout: &textures_bind_group_layout,
          entries: &[
            wgpu::BindGroupEntry {
              binding: 0,
              resource: wgpu::BindingResource::TextureView(&textures::array_view(
                &ocean_textures.displacement,
                level - 1,
              )),
            },
            wgpu::BindGroupEntry {
              binding: 1,
              resource: wgpu::BindingResource::TextureView(&textures::array_view(
                &ocean_textures.displacement,
                level,
              )),
            },
            wgpu::BindGroupEntry {
              binding: 2,
              resource: wgpu::BindingResource::TextureView(&textures::array_view(
                &ocean_textures.slope,
                level - 1,
              )),
            },
            wgpu::BindGroupEntry {
              binding: 3,
              resource: wgpu::BindingResource::TextureView(&textures::array_view(
                &ocean_textures.slope,
                level,
              )),
            },
          ],
        })
      })
      .collect();

    Self {
      schedule,
      level_bind_groups,
      pipeline,
    }
  }

  pub fn dispatch(&self, encoder: &mut wgpu::CommandEncoder) {
    let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
      label: Some("Generate mipmaps"),
      timestamp_writes: None,
    });

    compute_pass.set_pipeline(&self.pipeline);
    for (dispatch, bind_group) in self.schedule.mipmaps().iter().zip(&self.level_bind_groups) {
      let level = match dispatch.kernel {
        Kernel::Mipmap { level } => level,
        _ => continue,
      };

      let params = Params {
        size: (self.schedule.size() >> level).max(1),
      };
      compute_pass.set_bind_group(0, bind_group, &[]);
      compute_pass.set_push_constants(0, bytemuck::cast_slice(&[params]));
      let [x, y, z] = dispatch.workgroups;
      compute_pass.dispatch_workgroups(x, y, z);
    }
  }
}
