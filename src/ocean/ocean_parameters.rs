use serde::{Deserialize, Serialize};

use crate::ocean::utils::clamp;

pub const MIN_SWELL: f32 = 0.01;
pub const MAX_SWELL: f32 = 1.0;

/// User-facing description of one directional wave spectrum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumParameters {
  pub scale: f32,
  pub wind_speed: f32,
  /// Degrees.
  pub wind_direction: f32,
  pub fetch: f32,
  pub spread_blend: f32,
  pub swell: f32,
  pub peak_enhancement: f32,
  pub short_waves_fade: f32,
}

impl Default for SpectrumParameters {
  fn default() -> SpectrumParameters {
    SpectrumParameters {
      scale: 1.0,
      wind_speed: 0.5,
      wind_direction: 200.0,
      fetch: 100000.0,
      spread_blend: 1.0,
      swell: 0.7,
      peak_enhancement: 3.3,
      short_waves_fade: 0.01,
    }
  }
}

/// One simulated domain: its world-space patch size and the two spectra summed into it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerParameters {
  pub domain_size: f32,
  pub spectra: [SpectrumParameters; 2],
}

/// Values that may change between frames without a re-bake.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameParameters {
  pub speed: f32,
  pub repeat_time: f32,
  pub lambda: [f32; 2],
  pub foam_bias: f32,
  pub foam_threshold: f32,
  pub foam_intensity: f32,
}

impl Default for FrameParameters {
  fn default() -> FrameParameters {
    FrameParameters {
      speed: 1.0,
      repeat_time: 200.0,
      lambda: [1.0, 1.0],
      foam_bias: 0.85,
      foam_threshold: 0.0,
      foam_intensity: 1.0,
    }
  }
}

/// GPU layout of a baked spectrum, one entry per (layer, spectrum) in a storage buffer.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ComputeSpectrumRecord {
  pub scale: f32,
  pub angle: f32,
  pub spread_blend: f32,
  pub swell: f32,
  pub alpha: f32,
  pub peak_omega: f32,
  pub gamma: f32,
  pub short_waves_fade: f32,
}

impl ComputeSpectrumRecord {
  /// Wind speed and fetch must be positive; `OceanSimulationConfig::validate` guarantees it.
  pub fn from_parameters(o: &SpectrumParameters, gravity: f32) -> Self {
    if o.swell < MIN_SWELL || o.swell > MAX_SWELL {
      log::warn!(
        "swell {} outside [{}, {}], clamping",
        o.swell,
        MIN_SWELL,
        MAX_SWELL
      );
    }

    Self {
      scale: o.scale,
      angle: o.wind_direction / 180.0 * std::f32::consts::PI,
      spread_blend: o.spread_blend,
      swell: clamp(o.swell, MIN_SWELL, MAX_SWELL),
      alpha: jonswap_alpha(gravity, o.fetch, o.wind_speed),
      peak_omega: jonswap_peak_frequency(gravity, o.fetch, o.wind_speed),
      gamma: o.peak_enhancement,
      short_waves_fade: o.short_waves_fade,
    }
  }
}

/// JONSWAP energy scale.
pub fn jonswap_alpha(g: f32, fetch: f32, wind_speed: f32) -> f32 {
  debug_assert!(wind_speed > 0.0, "wind speed must be positive");
  0.076 * f32::powf(g * fetch / wind_speed / wind_speed, -0.22)
}

/// JONSWAP peak angular frequency.
pub fn jonswap_peak_frequency(g: f32, fetch: f32, wind_speed: f32) -> f32 {
  debug_assert!(wind_speed > 0.0, "wind speed must be positive");
  22.0 * f32::powf(wind_speed * fetch / g / g, -0.33)
}

/// Records in upload order: layer 0 spectrum 0, layer 0 spectrum 1, layer 1 spectrum 0, ...
pub fn bake_spectrum_records(layers: &[LayerParameters], gravity: f32) -> Vec<ComputeSpectrumRecord> {
  layers
    .iter()
    .flat_map(|layer| layer.spectra.iter())
    .map(|spectrum| ComputeSpectrumRecord::from_parameters(spectrum, gravity))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn relative_error(actual: f32, expected: f64) -> f64 {
    ((actual as f64 - expected) / expected).abs()
  }

  #[test]
  fn jonswap_alpha_matches_reference() {
    let expected = 0.076 * (9.81f64 * 100000.0 / 2.0 / 2.0).powf(-0.22);
    let alpha = jonswap_alpha(9.81, 100000.0, 2.0);
    assert!(relative_error(alpha, expected) < 1e-4, "alpha = {}", alpha);
    assert!((alpha - 0.004955).abs() < 1e-5);
  }

  #[test]
  fn jonswap_peak_frequency_matches_reference() {
    let expected = 22.0 * (2.0f64 * 100000.0 / 9.81 / 9.81).powf(-0.33);
    let peak = jonswap_peak_frequency(9.81, 100000.0, 2.0);
    assert!(relative_error(peak, expected) < 1e-4, "peak = {}", peak);
  }

  #[test]
  fn record_converts_degrees_and_clamps_swell() {
    let parameters = SpectrumParameters {
      wind_direction: 90.0,
      swell: 0.0,
      ..Default::default()
    };
    let record = ComputeSpectrumRecord::from_parameters(&parameters, 9.81);
    assert!((record.angle - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
    assert_eq!(record.swell, MIN_SWELL);

    let record = ComputeSpectrumRecord::from_parameters(
      &SpectrumParameters {
        swell: 3.0,
        ..parameters
      },
      9.81,
    );
    assert_eq!(record.swell, MAX_SWELL);
  }

  #[test]
  fn baked_records_are_two_per_layer_in_order() {
    let mut first = SpectrumParameters::default();
    first.scale = 0.5;
    let mut second = SpectrumParameters::default();
    second.scale = 0.25;
    let layer = LayerParameters {
      domain_size: 64.0,
      spectra: [first, second],
    };

    let records = bake_spectrum_records(&[layer, layer, layer], 9.81);
    assert_eq!(records.len(), 6);
    assert_eq!(records[0].scale, 0.5);
    assert_eq!(records[1].scale, 0.25);
    assert_eq!(records[4].scale, 0.5);
    assert_eq!(std::mem::size_of::<ComputeSpectrumRecord>(), 32);
  }
}
