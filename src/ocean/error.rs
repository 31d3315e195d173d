/// Invalid simulation setup. Detected before any GPU resource is touched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
  #[error("texture size {0} is not a power of two")]
  NonPowerOfTwoSize(u32),

  #[error("texture size {size} is outside the supported range {min}..={max}")]
  SizeOutOfRange { size: u32, min: u32, max: u32 },

  #[error("domain count {count} must be between 1 and {max}")]
  DomainCount { count: usize, max: usize },

  #[error("domain count {domain_count} does not match the {layers} configured layers")]
  LayerCountMismatch { domain_count: usize, layers: usize },

  #[error("layer {layer}, spectrum {spectrum}: wind speed must be positive, got {wind_speed}")]
  NonPositiveWindSpeed {
    layer: usize,
    spectrum: usize,
    wind_speed: f32,
  },

  #[error("layer {layer}, spectrum {spectrum}: fetch must be positive, got {fetch}")]
  NonPositiveFetch {
    layer: usize,
    spectrum: usize,
    fetch: f32,
  },

  #[error("layer {layer}: domain size must be positive, got {domain_size}")]
  NonPositiveDomainSize { layer: usize, domain_size: f32 },

  #[error("invalid cutoff range [{low}, {high}]")]
  InvalidCutoff { low: f32, high: f32 },

  #[error("gravity must be positive, got {0}")]
  NonPositiveGravity(f32),

  #[error("depth must be positive, got {0}")]
  NonPositiveDepth(f32),

  #[error("repeat time must be positive, got {0}")]
  NonPositiveRepeatTime(f32),

  #[error("failed to read configuration: {0}")]
  Io(#[from] std::io::Error),

  #[error("failed to parse configuration: {0}")]
  Parse(#[from] serde_json::Error),
}

/// GPU-side failure while creating or reading back ocean resources.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
  #[error("no compatible GPU adapter found")]
  NoAdapter,

  #[error("failed to request GPU device: {0}")]
  DeviceRequest(#[from] wgpu::RequestDeviceError),

  #[error("device is missing required features: {0:?}")]
  MissingFeatures(wgpu::Features),

  #[error("device push constant limit {available} is below the required {required} bytes")]
  PushConstantLimit { available: u32, required: u32 },

  #[error("texture size {size} exceeds the device limit {limit}")]
  TextureTooLarge { size: u32, limit: u32 },

  #[error("GPU ran out of memory while creating ocean resources")]
  OutOfMemory,

  #[error("GPU validation failed: {0}")]
  Validation(String),

  #[error("texture readback failed: {0}")]
  Readback(#[from] wgpu::BufferAsyncError),

  #[error("texture readback was abandoned before the buffer was mapped")]
  ReadbackAbandoned,
}

impl From<wgpu::Error> for ResourceError {
  fn from(error: wgpu::Error) -> Self {
    match error {
      wgpu::Error::OutOfMemory { .. } => ResourceError::OutOfMemory,
      other => ResourceError::Validation(other.to_string()),
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum OceanError {
  #[error(transparent)]
  Configuration(#[from] ConfigurationError),

  #[error(transparent)]
  Resource(#[from] ResourceError),
}
