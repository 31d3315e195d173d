//! Host-side mirror of the GPU inverse FFT.
//!
//! Uses the same twiddle table layout, butterfly formula and ping-pong schedule as the
//! compute kernels, in `f32`, so GPU readbacks can be compared texel for texel.

use std::f32::consts::PI;

use num_complex::Complex32;

use crate::ocean::error::ConfigurationError;
use crate::ocean::ocean_parameters::FrameParameters;
use crate::ocean::schedule::{self, BufferRole, FftAxis, FftStep, Schedule};

/// CPU copy of the twiddle texture: `log2(N)` columns by `N` rows of
/// `(w.re, w.im, first_index, second_index)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TwiddleTable {
  size: u32,
  log_size: u32,
  texels: Vec<[f32; 4]>,
}

impl TwiddleTable {
  pub fn new(size: u32) -> Result<Self, ConfigurationError> {
    let log_size = crate::ocean::utils::exact_log2(size)?;
    let half_size = size / 2;
    let mut texels = vec![[0.0f32; 4]; (log_size * size) as usize];

    for stage in 0..log_size {
      let b = size >> (stage + 1);
      for y in 0..half_size {
        let i = (2 * b * (y / b) + y % b) % size;
        let angle = -2.0 * PI * ((y / b) * b) as f32 / size as f32;
        let (re, im) = (angle.cos(), angle.sin());
        let indices = [i as f32, (i + b) as f32];

        texels[(y * log_size + stage) as usize] = [re, im, indices[0], indices[1]];
        texels[((y + half_size) * log_size + stage) as usize] = [-re, -im, indices[0], indices[1]];
      }
    }

    Ok(Self {
      size,
      log_size,
      texels,
    })
  }

  pub fn size(&self) -> u32 {
    self.size
  }

  pub fn texel(&self, stage: u32, y: u32) -> [f32; 4] {
    self.texels[(y * self.log_size + stage) as usize]
  }

  /// Row-major texels, the layout a readback of the twiddle texture produces.
  pub fn texture_data(&self) -> Vec<f32> {
    self.texels.iter().flatten().copied().collect()
  }

  fn butterfly(&self, stage: u32, output: u32) -> (Complex32, usize, usize) {
    let [re, im, first, second] = self.texel(stage, output);
    // The inverse transform rotates by the conjugate.
    (Complex32::new(re, -im), first as usize, second as usize)
  }
}

/// One butterfly stage over an `N x N` row-major grid.
pub fn butterfly_step(
  table: &TwiddleTable,
  axis: FftAxis,
  stage: u32,
  source: &[Complex32],
  destination: &mut [Complex32],
) {
  let size = table.size() as usize;
  for y in 0..size {
    for x in 0..size {
      destination[y * size + x] = match axis {
        FftAxis::Horizontal => {
          let (w, first, second) = table.butterfly(stage, x as u32);
          source[y * size + first] + w * source[y * size + second]
        }
        FftAxis::Vertical => {
          let (w, first, second) = table.butterfly(stage, y as u32);
          source[first * size + x] + w * source[second * size + x]
        }
      };
    }
  }
}

/// Runs `steps` with two buffers exactly like the GPU, including the final copy-back.
/// Returns whether the copy-back happened.
fn run_steps(table: &TwiddleTable, steps: &[FftStep], spectrum: &mut [Complex32]) -> bool {
  let mut ping_pong = vec![Complex32::default(); spectrum.len()];

  for step in steps {
    match step.source {
      BufferRole::Spectrum => butterfly_step(table, step.axis, step.stage, spectrum, &mut ping_pong),
      BufferRole::PingPong => butterfly_step(table, step.axis, step.stage, &ping_pong, spectrum),
    }
  }

  let copy_back = schedule::steps_need_copy_back(steps);
  if copy_back {
    spectrum.copy_from_slice(&ping_pong);
  }
  copy_back
}

/// Unnormalised 2D inverse DFT in natural order, in place.
pub fn inverse_fft_2d(table: &TwiddleTable, grid: &mut [Complex32]) -> Result<(), ConfigurationError> {
  let schedule = Schedule::new(table.size(), 1)?;
  run_steps(table, &schedule.inverse_fft_steps(), grid);
  Ok(())
}

/// Unnormalised 1D inverse DFT of every row (`Horizontal`) or column (`Vertical`).
pub fn inverse_fft_axis(
  table: &TwiddleTable,
  axis: FftAxis,
  grid: &mut [Complex32],
) -> Result<bool, ConfigurationError> {
  let schedule = Schedule::new(table.size(), 1)?;
  Ok(run_steps(table, &schedule.axis_steps(axis), grid))
}

/// Sign the assembler multiplies texel `(x, y)` by.
pub fn permute_sign(x: u32, y: u32) -> f32 {
  1.0 - 2.0 * ((x + y) % 2) as f32
}

/// Texel index holding wave number `k` (in cycles per domain) for a spectrum centred at N/2.
pub fn spectrum_index(k: i32, size: u32) -> u32 {
  (k + size as i32 / 2).rem_euclid(size as i32) as u32
}

pub fn dispersion(k: f32, gravity: f32, depth: f32) -> f32 {
  (gravity * k * (k * depth).min(20.0).tanh()).sqrt()
}

/// Phase the evolution kernel applies at `time`, with frequencies snapped to `2*pi/repeat_time`.
pub fn quantized_phase(k: f32, gravity: f32, depth: f32, repeat_time: f32, time: f32) -> f32 {
  let w0 = 2.0 * PI / repeat_time;
  (dispersion(k, gravity, depth) / w0).floor() * w0 * time
}

/// Wave vector of texel `(x, y)` in a domain `domain_size` metres wide.
pub fn wave_vector(x: u32, y: u32, size: u32, domain_size: f32) -> [f32; 2] {
  let half_size = size as f32 * 0.5;
  let delta_k = 2.0 * PI / domain_size;
  [
    (x as f32 - half_size) * delta_k,
    (y as f32 - half_size) * delta_k,
  ]
}

/// `h0 * e^(i*phase) + conj(h0(-k)) * e^(-i*phase)`, the height amplitude at one texel.
pub fn evolve_amplitude(h0: Complex32, h0_minus_k_conj: Complex32, phase: f32) -> Complex32 {
  let rotation = Complex32::from_polar(1.0, phase);
  h0 * rotation + h0_minus_k_conj * rotation.conj()
}

/// Displacement (xyz, foam) and slope of one texel, from the two transformed layers of a domain.
pub fn assemble_texel(
  x: u32,
  y: u32,
  displacement_layer: [f32; 4],
  slope_layer: [f32; 4],
  frame: &FrameParameters,
) -> ([f32; 4], [f32; 2]) {
  let sign = permute_sign(x, y);
  let [dx, dz, dy, dxz] = displacement_layer.map(|v| v * sign);
  let [dyx, dyz, dxx, dzz] = slope_layer.map(|v| v * sign);
  let [lx, lz] = frame.lambda;

  let jacobian = (1.0 + lx * dxx) * (1.0 + lz * dzz) - lx * lz * dxz * dxz;
  let biased = (frame.foam_bias - jacobian).max(0.0);
  let foam = if biased > frame.foam_threshold {
    (frame.foam_intensity * biased).clamp(0.0, 1.0)
  } else {
    0.0
  };

  (
    [lx * dx, dy, lz * dz, foam],
    [dyx / (1.0 + (dxx * lx).abs()), dyz / (1.0 + (dzz * lz).abs())],
  )
}

/// 2x2 box filter of a square level `width` texels wide with `components` floats per texel.
pub fn box_filter(level: &[f32], width: u32, components: u32) -> Vec<f32> {
  let target = (width / 2).max(1);
  let components = components as usize;
  let texel = |x: u32, y: u32| {
    let start = (y.min(width - 1) * width + x.min(width - 1)) as usize * components;
    &level[start..start + components]
  };

  let mut filtered = Vec::with_capacity((target * target) as usize * components);
  for y in 0..target {
    for x in 0..target {
      for c in 0..components {
        let sum = texel(2 * x, 2 * y)[c]
          + texel(2 * x + 1, 2 * y)[c]
          + texel(2 * x, 2 * y + 1)[c]
          + texel(2 * x + 1, 2 * y + 1)[c];
        filtered.push(sum * 0.25);
      }
    }
  }
  filtered
}

pub fn max_abs_error(actual: &[f32], expected: &[f32]) -> f32 {
  debug_assert_eq!(actual.len(), expected.len());
  actual
    .iter()
    .zip(expected)
    .map(|(a, e)| (a - e).abs())
    .fold(0.0, f32::max)
}
