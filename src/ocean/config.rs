use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ocean::error::ConfigurationError;
use crate::ocean::ocean_parameters::{FrameParameters, LayerParameters, SpectrumParameters};

pub const MIN_TEXTURE_SIZE: u32 = 16;
pub const MAX_TEXTURE_SIZE: u32 = 2048;
pub const MAX_DOMAINS: usize = 4;

/// Everything `OceanSurface::bake` needs. Owned by the caller; the surface keeps a copy
/// of the last configuration that baked successfully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OceanSimulationConfig {
  pub texture_size: u32,
  pub domain_count: usize,
  pub seed: u64,
  pub low_cutoff: f32,
  pub high_cutoff: f32,
  pub depth: f32,
  pub gravity: f32,
  pub layers: Vec<LayerParameters>,
  #[serde(default)]
  pub frame: FrameParameters,
}

impl OceanSimulationConfig {
  pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
    let config: OceanSimulationConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
  }

  pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
    let json = std::fs::read_to_string(path)?;
    Self::from_json_str(&json)
  }

  pub fn to_json_string(&self) -> Result<String, ConfigurationError> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// World-space extent of every domain, in layer order.
  pub fn domain_sizes(&self) -> Vec<f32> {
    self.layers.iter().map(|layer| layer.domain_size).collect()
  }

  pub fn validate(&self) -> Result<(), ConfigurationError> {
    let size = self.texture_size;
    if !size.is_power_of_two() {
      return Err(ConfigurationError::NonPowerOfTwoSize(size));
    }
    if !(MIN_TEXTURE_SIZE..=MAX_TEXTURE_SIZE).contains(&size) {
      return Err(ConfigurationError::SizeOutOfRange {
        size,
        min: MIN_TEXTURE_SIZE,
        max: MAX_TEXTURE_SIZE,
      });
    }

    if self.domain_count == 0 || self.domain_count > MAX_DOMAINS {
      return Err(ConfigurationError::DomainCount {
        count: self.domain_count,
        max: MAX_DOMAINS,
      });
    }
    if self.layers.len() != self.domain_count {
      return Err(ConfigurationError::LayerCountMismatch {
        domain_count: self.domain_count,
        layers: self.layers.len(),
      });
    }

    if !(self.gravity > 0.0) {
      return Err(ConfigurationError::NonPositiveGravity(self.gravity));
    }
    if !(self.depth > 0.0) {
      return Err(ConfigurationError::NonPositiveDepth(self.depth));
    }
    if !(self.low_cutoff > 0.0 && self.high_cutoff > self.low_cutoff) {
      return Err(ConfigurationError::InvalidCutoff {
        low: self.low_cutoff,
        high: self.high_cutoff,
      });
    }

    for (layer_index, layer) in self.layers.iter().enumerate() {
      if !(layer.domain_size > 0.0) {
        return Err(ConfigurationError::NonPositiveDomainSize {
          layer: layer_index,
          domain_size: layer.domain_size,
        });
      }

      for (spectrum_index, spectrum) in layer.spectra.iter().enumerate() {
        if !(spectrum.wind_speed > 0.0) {
          return Err(ConfigurationError::NonPositiveWindSpeed {
            layer: layer_index,
            spectrum: spectrum_index,
            wind_speed: spectrum.wind_speed,
          });
        }
        if !(spectrum.fetch > 0.0) {
          return Err(ConfigurationError::NonPositiveFetch {
            layer: layer_index,
            spectrum: spectrum_index,
            fetch: spectrum.fetch,
          });
        }
      }
    }

    self.frame.validate()
  }
}

impl FrameParameters {
  pub fn validate(&self) -> Result<(), ConfigurationError> {
    if !(self.repeat_time > 0.0) {
      return Err(ConfigurationError::NonPositiveRepeatTime(self.repeat_time));
    }
    Ok(())
  }
}

fn spectrum(
  scale: f32,
  wind_speed: f32,
  wind_direction: f32,
  fetch: f32,
  spread_blend: f32,
  swell: f32,
  short_waves_fade: f32,
) -> SpectrumParameters {
  SpectrumParameters {
    scale,
    wind_speed,
    wind_direction,
    fetch,
    spread_blend,
    swell,
    peak_enhancement: 1.0,
    short_waves_fade,
  }
}

impl Default for OceanSimulationConfig {
  fn default() -> OceanSimulationConfig {
    let layers = vec![
      LayerParameters {
        domain_size: 94.0,
        spectra: [
          spectrum(0.1, 2.0, 22.0, 100000.0, 0.642, 1.0, 0.025),
          spectrum(0.07, 2.0, 59.0, 1000.0, 0.0, 1.0, 0.01),
        ],
      },
      LayerParameters {
        domain_size: 128.0,
        spectra: [
          spectrum(0.25, 20.0, 97.0, 1e8, 0.14, 1.0, 0.5),
          spectrum(0.25, 20.0, 67.0, 1000000.0, 0.47, 1.0, 0.5),
        ],
      },
      LayerParameters {
        domain_size: 64.0,
        spectra: [
          spectrum(0.15, 5.0, 105.0, 1000000.0, 0.2, 1.0, 0.5),
          spectrum(0.1, 1.0, 19.0, 10000.0, 0.298, 0.695, 0.5),
        ],
      },
      LayerParameters {
        domain_size: 32.0,
        spectra: [
          spectrum(1.0, 1.0, 209.0, 200000.0, 0.56, 1.0, 0.0001),
          spectrum(0.23, 1.0, 0.0, 1000.0, 0.0, 0.01, 0.0001),
        ],
      },
    ];

    OceanSimulationConfig {
      texture_size: 256,
      domain_count: layers.len(),
      seed: 1,
      low_cutoff: 0.0001,
      high_cutoff: 9000.0,
      depth: 20.0,
      gravity: 9.81,
      layers,
      frame: FrameParameters::default(),
    }
  }
}
