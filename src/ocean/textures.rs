use crate::ocean::schedule::{BufferRole, Schedule};

pub const SPECTRUM_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
pub const DISPLACEMENT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
pub const SLOPE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rg32Float;

/// Every GPU image the simulation owns, sized for one baked configuration.
///
/// Dropping the struct releases all of them.
pub struct OceanTextures {
  size: u32,
  domain_count: u32,
  mip_level_count: u32,

  pub(crate) noise: wgpu::Texture,
  pub(crate) h0k: wgpu::Texture,
  pub(crate) initial_spectrum: wgpu::Texture,
  pub(crate) spectrum: wgpu::Texture,
  pub(crate) ping_pong: wgpu::Texture,
  pub(crate) twiddle: wgpu::Texture,
  pub(crate) displacement: wgpu::Texture,
  pub(crate) slope: wgpu::Texture,
}

impl OceanTextures {
  pub fn new(device: &wgpu::Device, schedule: &Schedule) -> Self {
    let size = schedule.size();
    let domain_count = schedule.domain_count();
    let mip_level_count = schedule.mip_level_count();

    let noise = create_texture_array(
      device,
      "Noise texture",
      size,
      domain_count,
      1,
      SPECTRUM_FORMAT,
      wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
    );

    let intermediate_usage = wgpu::TextureUsages::STORAGE_BINDING
      | wgpu::TextureUsages::TEXTURE_BINDING
      | wgpu::TextureUsages::COPY_SRC;

    let h0k = create_texture_array(
      device,
      "H0k texture",
      size,
      domain_count,
      1,
      SPECTRUM_FORMAT,
      intermediate_usage,
    );

    let initial_spectrum = create_texture_array(
      device,
      "Initial spectrum texture",
      size,
      domain_count,
      1,
      SPECTRUM_FORMAT,
      intermediate_usage,
    );

    let spectrum = create_texture_array(
      device,
      "Spectrum texture",
      size,
      schedule.spectrum_layers(),
      1,
      SPECTRUM_FORMAT,
      intermediate_usage | wgpu::TextureUsages::COPY_DST,
    );

    let ping_pong = create_texture_array(
      device,
      "Ping-pong texture",
      size,
      schedule.spectrum_layers(),
      1,
      SPECTRUM_FORMAT,
      intermediate_usage | wgpu::TextureUsages::COPY_DST,
    );

    // log2(N) stages by N butterfly outputs.
    let twiddle = device.create_texture(&wgpu::TextureDescriptor {
      label: Some("FFT twiddle texture"),
      size: wgpu::Extent3d {
        width: schedule.log_size(),
        height: size,
        depth_or_array_layers: 1,
      },
      mip_level_count: 1,
      sample_count: 1,
      dimension: wgpu::TextureDimension::D2,
      format: SPECTRUM_FORMAT,
      usage: intermediate_usage,
      view_formats: &[],
    });

    let output_usage = wgpu::TextureUsages::STORAGE_BINDING
      | wgpu::TextureUsages::TEXTURE_BINDING
      | wgpu::TextureUsages::COPY_SRC;

    let displacement = create_texture_array(
      device,
      "Displacement",
      size,
      domain_count,
      mip_level_count,
      DISPLACEMENT_FORMAT,
      output_usage,
    );

    let slope = create_texture_array(
      device,
      "Slope",
      size,
      domain_count,
      mip_level_count,
      SLOPE_FORMAT,
      output_usage,
    );

    Self {
      size,
      domain_count,
      mip_level_count,
      noise,
      h0k,
      initial_spectrum,
      spectrum,
      ping_pong,
      twiddle,
      displacement,
      slope,
    }
  }

  pub fn size(&self) -> u32 {
    self.size
  }

  pub fn domain_count(&self) -> u32 {
    self.domain_count
  }

  pub fn mip_level_count(&self) -> u32 {
    self.mip_level_count
  }

  pub fn buffer(&self, role: BufferRole) -> &wgpu::Texture {
    match role {
      BufferRole::Spectrum => &self.spectrum,
      BufferRole::PingPong => &self.ping_pong,
    }
  }

  pub fn noise(&self) -> &wgpu::Texture {
    &self.noise
  }

  pub fn initial_spectrum(&self) -> &wgpu::Texture {
    &self.initial_spectrum
  }

  pub fn spectrum(&self) -> &wgpu::Texture {
    &self.spectrum
  }

  pub fn ping_pong(&self) -> &wgpu::Texture {
    &self.ping_pong
  }

  pub fn twiddle(&self) -> &wgpu::Texture {
    &self.twiddle
  }

  pub fn displacement(&self) -> &wgpu::Texture {
    &self.displacement
  }

  pub fn slope(&self) -> &wgpu::Texture {
    &self.slope
  }

  /// Uploads one layer of uniform noise per domain.
  pub fn write_noise(&self, queue: &wgpu::Queue, noise: &[f32]) {
    queue.write_texture(
      wgpu::ImageCopyTexture {
        texture: &self.noise,
        mip_level: 0,
        origin: wgpu::Origin3d::ZERO,
        aspect: wgpu::TextureAspect::All,
      },
      bytemuck::cast_slice(noise),
      wgpu::ImageDataLayout {
        offset: 0,
        bytes_per_row: Some(16 * self.size),
        rows_per_image: Some(self.size),
      },
      wgpu::Extent3d {
        width: self.size,
        height: self.size,
        depth_or_array_layers: self.domain_count,
      },
    );
  }
}

pub fn create_texture_array(
  device: &wgpu::Device,
  label: &str,
  size: u32,
  layers: u32,
  mip_level_count: u32,
  format: wgpu::TextureFormat,
  usage: wgpu::TextureUsages,
) -> wgpu::Texture {
  device.create_texture(&wgpu::TextureDescriptor {
    label: Some(label),
    size: wgpu::Extent3d {
      width: size,
      height: size,
      depth_or_array_layers: layers,
    },
    mip_level_count,
    sample_count: 1,
    dimension: wgpu::TextureDimension::D2,
    format,
    usage,
    view_formats: &[],
  })
}

/// Whole-array view of one mip level. Always `D2Array`, even with a single layer.
pub fn array_view(texture: &wgpu::Texture, mip_level: u32) -> wgpu::TextureView {
  texture.create_view(&wgpu::TextureViewDescriptor {
    dimension: Some(wgpu::TextureViewDimension::D2Array),
    base_mip_level: mip_level,
    mip_level_count: Some(1),
    ..Default::default()
  })
}

/// View over the full mip chain, for sampling.
pub fn sampled_array_view(texture: &wgpu::Texture) -> wgpu::TextureView {
  texture.create_view(&wgpu::TextureViewDescriptor {
    dimension: Some(wgpu::TextureViewDimension::D2Array),
    ..Default::default()
  })
}

pub fn plain_view(texture: &wgpu::Texture) -> wgpu::TextureView {
  texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Unfilterable float input read with `textureLoad`.
pub fn input_array_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
  wgpu::BindGroupLayoutEntry {
    binding,
    visibility: wgpu::ShaderStages::COMPUTE,
    ty: wgpu::BindingType::Texture {
      view_dimension: wgpu::TextureViewDimension::D2Array,
      sample_type: wgpu::TextureSampleType::Float { filterable: false },
      multisampled: false,
    },
    count: None,
  }
}

pub fn output_array_entry(binding: u32, format: wgpu::TextureFormat) -> wgpu::BindGroupLayoutEntry {
  wgpu::BindGroupLayoutEntry {
    binding,
    visibility: wgpu::ShaderStages::COMPUTE,
    ty: wgpu::BindingType::StorageTexture {
      view_dimension: wgpu::TextureViewDimension::D2Array,
      format,
      access: wgpu::StorageTextureAccess::WriteOnly,
    },
    count: None,
  }
}
