use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use image::{GrayImage, Luma};
use num_complex::Complex32;

use ocean_fft::ocean::readback::{read_texture_layers, TextureLayers};
use ocean_fft::ocean::reference::{self, TwiddleTable};
use ocean_fft::{GpuContext, OceanSimulationConfig, OceanSurface};

#[derive(Parser, Debug)]
#[command(name = "ocean_fft")]
#[command(about = "Bake an FFT ocean on the GPU and export a height field", long_about = None)]
struct Args {
  /// JSON simulation config; the built-in four domain preset when omitted
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Override the texture size of the config
  #[arg(long)]
  size: Option<u32>,

  /// Number of frames to simulate
  #[arg(long, default_value_t = 60)]
  frames: u32,

  /// Simulated seconds between frames
  #[arg(long, default_value_t = 1.0 / 60.0)]
  time_step: f32,

  /// Height field of domain 0 after the last frame
  #[arg(long, default_value = "ocean_height.png")]
  output: PathBuf,

  /// Check the GPU inverse FFT against the CPU reference on the last frame
  #[arg(long)]
  verify: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
  env_logger::init();
  let args = Args::parse();

  let mut config = match &args.config {
    Some(path) => OceanSimulationConfig::from_json_file(path)?,
    None => OceanSimulationConfig::default(),
  };
  if let Some(size) = args.size {
    config.texture_size = size;
  }

  let gpu = GpuContext::blocking()?;
  let ocean = OceanSurface::new(&gpu.device, &gpu.queue, &config)?;

  let mut encoder = gpu
    .device
    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
      label: Some("Initial spectrum encoder"),
    });
  ocean.calculate_spectrum(&mut encoder);
  gpu.queue.submit(Some(encoder.finish()));

  let start = Instant::now();
  let last_frame = args.frames.max(1) - 1;
  for frame in 0..last_frame {
    let mut encoder = gpu
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Ocean frame encoder"),
      });
    ocean.dispatch_frame(&mut encoder, frame as f32 * args.time_step);
    gpu.queue.submit(Some(encoder.finish()));
  }

  let time = last_frame as f32 * args.time_step;
  if args.verify {
    let error = verify_last_frame(&gpu, &ocean, time)?;
    log::info!("GPU inverse FFT matches the CPU reference, max relative error {:e}", error);
  } else {
    let mut encoder = gpu
      .device
      .create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Ocean frame encoder"),
      });
    ocean.dispatch_frame(&mut encoder, time);
    gpu.queue.submit(Some(encoder.finish()));
  }
  gpu.device.poll(wgpu::Maintain::Wait);

  let elapsed = start.elapsed();
  log::info!(
    "{} frames in {:.2}ms ({:.3}ms per frame)",
    args.frames.max(1),
    elapsed.as_secs_f64() * 1000.0,
    elapsed.as_secs_f64() * 1000.0 / args.frames.max(1) as f64
  );

  let displacement = read_texture_layers(
    &gpu.device,
    &gpu.queue,
    ocean.displacement_texture(),
    0,
    0..1,
  )?;
  save_height_field(&displacement, &args.output)?;
  log::info!("height field written to {}", args.output.display());

  Ok(())
}

/// Runs the last frame in two submissions so the spectrum can be read on both sides of the IFFT.
fn verify_last_frame(
  gpu: &GpuContext,
  ocean: &OceanSurface,
  time: f32,
) -> Result<f32, Box<dyn std::error::Error>> {
  let layers = 0..ocean.schedule().spectrum_layers();
  let size = ocean.schedule().size();

  let mut encoder = gpu
    .device
    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
      label: Some("Verify evolve encoder"),
    });
  ocean.evolve_spectrum(&mut encoder, time);
  gpu.queue.submit(Some(encoder.finish()));
  let spectrum = read_texture_layers(
    &gpu.device,
    &gpu.queue,
    ocean.textures().spectrum(),
    0,
    layers.clone(),
  )?;

  let mut encoder = gpu
    .device
    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
      label: Some("Verify transform encoder"),
    });
  ocean.inverse_fft(&mut encoder);
  gpu.queue.submit(Some(encoder.finish()));
  let transformed = read_texture_layers(
    &gpu.device,
    &gpu.queue,
    ocean.textures().spectrum(),
    0,
    layers.clone(),
  )?;

  let mut encoder = gpu
    .device
    .create_command_encoder(&wgpu::CommandEncoderDescriptor {
      label: Some("Verify assemble encoder"),
    });
  ocean.assemble_textures(&mut encoder);
  gpu.queue.submit(Some(encoder.finish()));

  let table = TwiddleTable::new(size)?;
  let mut worst = 0.0f32;
  for layer in layers {
    for channel in 0..2 {
      let mut expected = complex_channel(spectrum.layer(layer), channel);
      reference::inverse_fft_2d(&table, &mut expected)?;
      let actual = complex_channel(transformed.layer(layer), channel);

      let scale = expected
        .iter()
        .map(|c| c.re.abs().max(c.im.abs()))
        .fold(1.0, f32::max);
      let error = actual
        .iter()
        .zip(&expected)
        .map(|(a, e)| (a.re - e.re).abs().max((a.im - e.im).abs()))
        .fold(0.0, f32::max)
        / scale;
      log::debug!("layer {} channel {}: relative error {:e}", layer, channel, error);
      worst = worst.max(error);
    }
  }

  if worst > 1e-3 {
    return Err(format!("GPU inverse FFT deviates from the CPU reference by {:e}", worst).into());
  }
  Ok(worst)
}

/// Complex pair `channel` (0 = `xy`, 1 = `zw`) of an rgba layer.
fn complex_channel(layer: &[f32], channel: usize) -> Vec<Complex32> {
  layer
    .chunks_exact(4)
    .map(|texel| Complex32::new(texel[2 * channel], texel[2 * channel + 1]))
    .collect()
}

fn save_height_field(
  displacement: &TextureLayers,
  path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
  let heights: Vec<f32> = displacement
    .layer(0)
    .chunks_exact(displacement.components as usize)
    .map(|texel| texel[1])
    .collect();

  let (min, max) = heights
    .iter()
    .fold((f32::MAX, f32::MIN), |(min, max), &h| (min.min(h), max.max(h)));
  let range = (max - min).max(f32::EPSILON);
  log::info!("height range [{:.3}, {:.3}]", min, max);

  let mut img = GrayImage::new(displacement.width, displacement.height);
  for y in 0..displacement.height {
    for x in 0..displacement.width {
      let height = heights[(y * displacement.width + x) as usize];
      let gray = ((height - min) / range * 255.0).clamp(0.0, 255.0) as u8;
      img.put_pixel(x, y, Luma([gray]));
    }
  }

  img.save(path)?;
  Ok(())
}
