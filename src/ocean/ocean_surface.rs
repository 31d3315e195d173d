use crate::ocean::config::OceanSimulationConfig;
use crate::ocean::error::{OceanError, ResourceError};
use crate::ocean::ocean_parameters::FrameParameters;
use crate::ocean::pipelines::{
  generate_noise_data, GenerateMipmapsPipeline, InitialSpectrumPipeline, SpectrumBuffers,
  TimeDependentSpectrumPipeline, WavesDataMergePipeline, FFT,
};
use crate::ocean::schedule::{FftAxis, Schedule};
use crate::ocean::textures::{self, OceanTextures};

/// Largest push constant block any ocean kernel uses, in bytes.
pub const PUSH_CONSTANT_SIZE: u32 = 32;

/// Multi-domain FFT ocean: owns every texture, buffer and pipeline of one bake.
///
/// Per frame, call [`OceanSurface::evolve_spectrum`], [`OceanSurface::inverse_fft`] and
/// [`OceanSurface::assemble_textures`] in that order (or [`OceanSurface::dispatch_frame`]).
pub struct OceanSurface {
  config: OceanSimulationConfig,
  schedule: Schedule,
  textures: OceanTextures,
  spectrum_buffers: SpectrumBuffers,

  // pipelines
  initial_spectrum_pipeline: InitialSpectrumPipeline,
  time_dependent_spectrum_pipeline: TimeDependentSpectrumPipeline,
  fft: FFT,
  waves_data_merge_pipeline: WavesDataMergePipeline,
  generate_mipmaps_pipeline: GenerateMipmapsPipeline,

  sampling_bind_group_layout: wgpu::BindGroupLayout,
  sampling_bind_group: wgpu::BindGroup,
}

impl OceanSurface {
  /// Validates `config`, creates every GPU resource and submits the twiddle precompute.
  ///
  /// `calculate_spectrum` still has to run before the first frame.
  pub fn new(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    config: &OceanSimulationConfig,
  ) -> Result<OceanSurface, OceanError> {
    config.validate()?;
    check_device(device, config.texture_size)?;

    let schedule = Schedule::new(config.texture_size, config.domain_count as u32)?;
    log::info!(
      "baking ocean: {}x{} texels, {} domains, {} mip levels",
      config.texture_size,
      config.texture_size,
      config.domain_count,
      schedule.mip_level_count()
    );

    device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let textures = OceanTextures::new(device, &schedule);
    let spectrum_buffers = SpectrumBuffers::init(device, config);

    log::debug!("creating ocean compute pipelines");
    let initial_spectrum_pipeline =
      InitialSpectrumPipeline::init(device, schedule, &textures, &spectrum_buffers);
    let time_dependent_spectrum_pipeline =
      TimeDependentSpectrumPipeline::init(device, schedule, &textures, &spectrum_buffers);
    let fft = FFT::init(device, schedule, &textures);
    let waves_data_merge_pipeline = WavesDataMergePipeline::init(device, schedule, &textures);
    let generate_mipmaps_pipeline = GenerateMipmapsPipeline::init(device, schedule, &textures);

    let (sampling_bind_group_layout, sampling_bind_group) =
      create_sampling_bind_group(device, &textures);

    let validation_error = pollster::block_on(device.pop_error_scope());
    let out_of_memory_error = pollster::block_on(device.pop_error_scope());
    if let Some(error) = out_of_memory_error.or(validation_error) {
      log::error!("ocean bake failed: {}", error);
      return Err(ResourceError::from(error).into());
    }

    let noise = generate_noise_data(
      config.texture_size as usize,
      config.domain_count,
      config.seed,
    );
    textures.write_noise(queue, &noise);

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
      label: Some("Ocean bake encoder"),
    });
    fft.precompute(&mut encoder);
    queue.submit(Some(encoder.finish()));

    Ok(OceanSurface {
      config: config.clone(),
      schedule,
      textures,
      spectrum_buffers,
      initial_spectrum_pipeline,
      time_dependent_spectrum_pipeline,
      fft,
      waves_data_merge_pipeline,
      generate_mipmaps_pipeline,
      sampling_bind_group_layout,
      sampling_bind_group,
    })
  }

  /// Rebuilds everything for `config`. On error the current state is kept untouched.
  pub fn bake(
    &mut self,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    config: &OceanSimulationConfig,
  ) -> Result<(), OceanError> {
    *self = OceanSurface::new(device, queue, config)?;
    Ok(())
  }

  /// Initial spectrum and conjugate packing. Run once after every bake.
  pub fn calculate_spectrum(&self, encoder: &mut wgpu::CommandEncoder) {
    self
      .initial_spectrum_pipeline
      .dispatch(encoder, &self.spectrum_buffers);
  }

  /// Writes the spectrum at absolute `time` seconds, scaled by the frame speed.
  pub fn evolve_spectrum(&self, encoder: &mut wgpu::CommandEncoder, time: f32) {
    let frame = &self.config.frame;
    self.time_dependent_spectrum_pipeline.dispatch(
      encoder,
      &self.spectrum_buffers,
      time * frame.speed,
      frame.repeat_time,
    );
  }

  pub fn inverse_fft(&self, encoder: &mut wgpu::CommandEncoder) {
    self.fft.dispatch(encoder, &self.textures);
  }

  /// Transforms along one axis only. Returns whether the ping-pong copy-back was encoded.
  pub fn inverse_fft_axis(&self, encoder: &mut wgpu::CommandEncoder, axis: FftAxis) -> bool {
    self.fft.dispatch_axis(encoder, &self.textures, axis)
  }

  /// Displacement and slope level 0, then the rest of their mip chains.
  pub fn assemble_textures(&self, encoder: &mut wgpu::CommandEncoder) {
    self
      .waves_data_merge_pipeline
      .dispatch(encoder, &self.config.frame);
    self.generate_mipmaps_pipeline.dispatch(encoder);
  }

  pub fn dispatch_frame(&self, encoder: &mut wgpu::CommandEncoder, time: f32) {
    self.evolve_spectrum(encoder, time);
    self.inverse_fft(encoder);
    self.assemble_textures(encoder);
  }

  pub fn displacement_texture(&self) -> &wgpu::Texture {
    self.textures.displacement()
  }

  pub fn slope_texture(&self) -> &wgpu::Texture {
    self.textures.slope()
  }

  pub fn textures(&self) -> &OceanTextures {
    &self.textures
  }

  pub fn schedule(&self) -> &Schedule {
    &self.schedule
  }

  pub fn config(&self) -> &OceanSimulationConfig {
    &self.config
  }

  pub fn layer_count(&self) -> u32 {
    self.schedule.domain_count()
  }

  pub fn frame_parameters(&self) -> &FrameParameters {
    &self.config.frame
  }

  pub fn set_frame_parameters(
    &mut self,
    frame: FrameParameters,
  ) -> Result<(), crate::ocean::error::ConfigurationError> {
    frame.validate()?;
    self.config.frame = frame;
    Ok(())
  }

  /// Layout of the group bound by [`OceanSurface::bind_textures_for_sampling`]:
  /// displacement array, slope array, repeating trilinear sampler.
  pub fn sampling_bind_group_layout(&self) -> &wgpu::BindGroupLayout {
    &self.sampling_bind_group_layout
  }

  pub fn bind_textures_for_sampling(&self, render_pass: &mut wgpu::RenderPass<'_>, index: u32) {
    render_pass.set_bind_group(index, &self.sampling_bind_group, &[]);
  }

  pub fn required_features() -> wgpu::Features {
    wgpu::Features::PUSH_CONSTANTS | wgpu::Features::FLOAT32_FILTERABLE
  }

  pub fn required_limits() -> wgpu::Limits {
    wgpu::Limits {
      max_push_constant_size: PUSH_CONSTANT_SIZE,
      ..wgpu::Limits::downlevel_defaults()
    }
  }
}

fn check_device(device: &wgpu::Device, texture_size: u32) -> Result<(), ResourceError> {
  let missing = OceanSurface::required_features().difference(device.features());
  if !missing.is_empty() {
    return Err(ResourceError::MissingFeatures(missing));
  }

  let limits = device.limits();
  if limits.max_push_constant_size < PUSH_CONSTANT_SIZE {
    return Err(ResourceError::PushConstantLimit {
      available: limits.max_push_constant_size,
      required: PUSH_CONSTANT_SIZE,
    });
  }
  if limits.max_texture_dimension_2d < texture_size {
    return Err(ResourceError::TextureTooLarge {
      size: texture_size,
      limit: limits.max_texture_dimension_2d,
    });
  }

  Ok(())
}

fn create_sampling_bind_group(
  device: &wgpu::Device,
  ocean_textures: &OceanTextures,
) -> (wgpu::BindGroupLayout, wgpu::BindGroup) {
  let sampled_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
    binding,
    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT | wgpu::ShaderStages::COMPUTE,
    ty: wgpu::BindingType::Texture {
      view_dimension: wgpu::TextureViewDimension::D2Array,
      sample_type: wgpu::TextureSampleType::Float { filterable: true },
      multisampled: false,
    },
    count: None,
  };

  let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
    label: Some("Ocean sampling bind group layout"),
    entries: &[
      sampled_entry(0),
      sampled_entry(1),
      wgpu::BindGroupLayoutEntry {
        binding: 2,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT | wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
      },
    ],
  });

  let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
    label: Some("Ocean sampler"),
    address_mode_u: wgpu::AddressMode::Repeat,
    address_mode_v: wgpu::AddressMode::Repeat,
    address_mode_w: wgpu::AddressMode::Repeat,
    mag_filter: wgpu::FilterMode::Linear,
    min_filter: wgpu::FilterMode::Linear,
    mipmap_filter: wgpu::FilterMode::Linear,
    anisotropy_clamp: 16,
    ..Default::default()
  });

  let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
    label: Some("Ocean sampling bind group"),
    layout: &layout,
    entries: &[
      wgpu::BindGroupEntry {
        binding: 0,
        resource: wgpu::BindingResource::TextureView(&textures::sampled_array_view(
          ocean_textures.displacement(),
        )),
      },
      wgpu::BindGroupEntry {
        binding: 1,
        resource: wgpu::BindingResource::TextureView(&textures::sampled_array_view(
          ocean_textures.slope(),
        )),
      },
      wgpu::BindGroupEntry {
        binding: 2,
        resource: wgpu::BindingResource::Sampler(&sampler),
      },
    ],
  });

  (layout, bind_group)
}
