use num_complex::Complex32;
use ocean_fft::ocean::readback::read_texture_layers;
use ocean_fft::ocean::reference::{self, TwiddleTable};
use ocean_fft::ocean::{FftAxis, FrameParameters, OceanSurface};
use ocean_fft::{GpuContext, OceanSimulationConfig};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Set on CI runners with a GPU so a missing adapter fails the run instead of skipping.
const REQUIRE_GPU: &str = "OCEAN_REQUIRE_GPU";

// Machines without a suitable adapter skip the GPU checks unless REQUIRE_GPU is set.
fn gpu() -> Option<GpuContext> {
  match GpuContext::blocking() {
    Ok(gpu) => Some(gpu),
    Err(error) if std::env::var_os(REQUIRE_GPU).is_some() => {
      panic!("{} is set but no GPU is available: {}", REQUIRE_GPU, error)
    }
    Err(error) => {
      eprintln!("skipping GPU test: {}", error);
      None
    }
  }
}

fn single_domain_config(size: u32) -> OceanSimulationConfig {
  let preset = OceanSimulationConfig::default();
  OceanSimulationConfig {
    texture_size: size,
    domain_count: 1,
    layers: vec![preset.layers[0]],
    ..preset
  }
}

fn submit(gpu: &GpuContext, encode: impl FnOnce(&mut wgpu::CommandEncoder)) {
  let mut encoder = gpu
    .device
    .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("test") });
  encode(&mut encoder);
  gpu.queue.submit(Some(encoder.finish()));
}

/// Fills both spectrum layers of domain 0 with `texels`.
fn write_spectrum(gpu: &GpuContext, ocean: &OceanSurface, texels: &[[f32; 4]]) {
  let size = ocean.schedule().size();
  gpu.queue.write_texture(
    wgpu::ImageCopyTexture {
      texture: ocean.textures().spectrum(),
      mip_level: 0,
      origin: wgpu::Origin3d::ZERO,
      aspect: wgpu::TextureAspect::All,
    },
    bytemuck::cast_slice(texels),
    wgpu::ImageDataLayout {
      offset: 0,
      bytes_per_row: Some(16 * size),
      rows_per_image: Some(size),
    },
    wgpu::Extent3d {
      width: size,
      height: size,
      depth_or_array_layers: 2,
    },
  );
}

fn random_texels(count: usize, seed: u64) -> Vec<[f32; 4]> {
  let mut rng = StdRng::seed_from_u64(seed);
  (0..count)
    .map(|_| {
      [
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
        rng.gen_range(-1.0..1.0),
      ]
    })
    .collect()
}

fn channel(layer: &[f32], channel: usize) -> Vec<Complex32> {
  layer
    .chunks_exact(4)
    .map(|texel| Complex32::new(texel[2 * channel], texel[2 * channel + 1]))
    .collect()
}

fn relative_error(actual: &[Complex32], expected: &[Complex32]) -> f32 {
  let scale = expected
    .iter()
    .map(|c| c.re.abs().max(c.im.abs()))
    .fold(1.0, f32::max);
  actual
    .iter()
    .zip(expected)
    .map(|(a, e)| (a.re - e.re).abs().max((a.im - e.im).abs()))
    .fold(0.0, f32::max)
    / scale
}

/// Transforms random data on the GPU and checks every channel of both layers against the CPU.
fn check_transform_against_reference(size: u32, axis: Option<FftAxis>) {
  let Some(gpu) = gpu() else { return };
  let ocean = OceanSurface::new(&gpu.device, &gpu.queue, &single_domain_config(size)).unwrap();

  let layer_len = (size * size) as usize;
  let input = random_texels(2 * layer_len, size as u64);
  write_spectrum(&gpu, &ocean, &input);

  let mut copied_back = None;
  submit(&gpu, |encoder| match axis {
    Some(axis) => copied_back = Some(ocean.inverse_fft_axis(encoder, axis)),
    None => ocean.inverse_fft(encoder),
  });
  let output =
    read_texture_layers(&gpu.device, &gpu.queue, ocean.textures().spectrum(), 0, 0..2).unwrap();

  let table = TwiddleTable::new(size).unwrap();
  let flat: Vec<f32> = input.iter().flatten().copied().collect();
  for layer in 0..2u32 {
    let start = layer as usize * layer_len * 4;
    let source = &flat[start..start + layer_len * 4];
    for c in 0..2 {
      let mut expected = channel(source, c);
      match axis {
        Some(axis) => {
          let cpu_copied_back = reference::inverse_fft_axis(&table, axis, &mut expected).unwrap();
          assert_eq!(copied_back, Some(cpu_copied_back));
        }
        None => reference::inverse_fft_2d(&table, &mut expected).unwrap(),
      }

      let error = relative_error(&channel(output.layer(layer), c), &expected);
      assert!(error < 1e-3, "size {}, layer {}, channel {}: {}", size, layer, c, error);
    }
  }
}

#[test]
fn twiddle_texture_matches_cpu_table() {
  let Some(gpu) = gpu() else { return };
  let ocean = OceanSurface::new(&gpu.device, &gpu.queue, &single_domain_config(64)).unwrap();

  let twiddle =
    read_texture_layers(&gpu.device, &gpu.queue, ocean.textures().twiddle(), 0, 0..1).unwrap();
  let table = TwiddleTable::new(64).unwrap();
  assert_eq!((twiddle.width, twiddle.height), (6, 64));

  for y in 0..64 {
    for stage in 0..6 {
      let gpu_texel = twiddle.texel(0, stage, y);
      let cpu_texel = table.texel(stage, y);
      assert!((gpu_texel[0] - cpu_texel[0]).abs() < 1e-4, "stage {} y {}", stage, y);
      assert!((gpu_texel[1] - cpu_texel[1]).abs() < 1e-4, "stage {} y {}", stage, y);
      assert_eq!(gpu_texel[2], cpu_texel[2]);
      assert_eq!(gpu_texel[3], cpu_texel[3]);
    }
  }
}

#[test]
fn initial_spectrum_packs_its_mirrored_conjugate() {
  let Some(gpu) = gpu() else { return };
  let config = OceanSimulationConfig {
    texture_size: 32,
    ..Default::default()
  };
  let ocean = OceanSurface::new(&gpu.device, &gpu.queue, &config).unwrap();
  submit(&gpu, |encoder| ocean.calculate_spectrum(encoder));

  let domains = ocean.layer_count();
  let spectrum = read_texture_layers(
    &gpu.device,
    &gpu.queue,
    ocean.textures().initial_spectrum(),
    0,
    0..domains,
  )
  .unwrap();

  for domain in 0..domains {
    let mut energy = 0.0;
    for y in 0..32 {
      for x in 0..32 {
        let texel = spectrum.texel(domain, x, y);
        let mirrored = spectrum.texel(domain, (32 - x) % 32, (32 - y) % 32);
        assert_eq!(texel[2], mirrored[0]);
        assert_eq!(texel[3], -mirrored[1]);
        energy += texel[0] * texel[0] + texel[1] * texel[1];
      }
    }
    assert!(energy > 0.0, "domain {} has an empty spectrum", domain);
  }
}

#[test]
fn single_frequency_round_trips_to_a_cosine() {
  let Some(gpu) = gpu() else { return };
  let size = 64u32;
  let ocean = OceanSurface::new(&gpu.device, &gpu.queue, &single_domain_config(size)).unwrap();

  let (kx, ky) = (2i32, 5i32);
  let amplitude = 1.5f32;
  let h = Complex32::from_polar(amplitude * 0.5, 0.3);
  let at = |kx: i32, ky: i32| {
    (reference::spectrum_index(ky, size) * size + reference::spectrum_index(kx, size)) as usize
  };

  let mut texels = vec![[0.0f32; 4]; 2 * (size * size) as usize];
  texels[at(kx, ky)] = [h.re, h.im, 0.0, 0.0];
  texels[at(-kx, -ky)] = [h.re, -h.im, 0.0, 0.0];
  write_spectrum(&gpu, &ocean, &texels);

  submit(&gpu, |encoder| ocean.inverse_fft(encoder));
  let output =
    read_texture_layers(&gpu.device, &gpu.queue, ocean.textures().spectrum(), 0, 0..1).unwrap();

  let mut actual = Vec::new();
  let mut expected = Vec::new();
  for y in 0..size {
    for x in 0..size {
      let texel = output.texel(0, x, y);
      actual.push(texel[0] * reference::permute_sign(x, y));
      let angle = 2.0 * std::f32::consts::PI * (kx * x as i32 + ky * y as i32) as f32
        / size as f32
        + 0.3;
      expected.push(amplitude * angle.cos());
      assert!(texel[1].abs() < 1e-3);
    }
  }
  assert!(reference::max_abs_error(&actual, &expected) < 1e-3);
}

#[test]
fn even_stage_count_matches_cpu_without_copy_back() {
  let schedule = ocean_fft::ocean::Schedule::new(256, 1).unwrap();
  assert!(!schedule.fft_needs_copy_back());
  check_transform_against_reference(256, None);
}

#[test]
fn odd_stage_count_copies_back_and_matches_cpu() {
  check_transform_against_reference(128, Some(FftAxis::Horizontal));
  check_transform_against_reference(128, Some(FftAxis::Vertical));
}

#[test]
fn frames_at_the_same_time_are_identical() {
  let Some(gpu) = gpu() else { return };
  let config = OceanSimulationConfig {
    texture_size: 64,
    ..Default::default()
  };
  let ocean = OceanSurface::new(&gpu.device, &gpu.queue, &config).unwrap();
  submit(&gpu, |encoder| ocean.calculate_spectrum(encoder));

  let frame = |time: f32| {
    submit(&gpu, |encoder| ocean.dispatch_frame(encoder, time));
    read_texture_layers(
      &gpu.device,
      &gpu.queue,
      ocean.displacement_texture(),
      0,
      0..ocean.layer_count(),
    )
    .unwrap()
  };

  let first = frame(3.25);
  let other = frame(7.0);
  let again = frame(3.25);
  assert_eq!(first, again);
  assert_ne!(first, other);

  let mip = read_texture_layers(
    &gpu.device,
    &gpu.queue,
    ocean.displacement_texture(),
    ocean.schedule().mip_level_count() - 1,
    0..1,
  )
  .unwrap();
  assert_eq!((mip.width, mip.height), (1, 1));
  assert!(mip.data.iter().all(|v| v.is_finite()));
}

#[test]
fn failed_bake_keeps_the_previous_surface() {
  let Some(gpu) = gpu() else { return };
  let config = single_domain_config(32);
  let mut ocean = OceanSurface::new(&gpu.device, &gpu.queue, &config).unwrap();

  let broken = OceanSimulationConfig {
    texture_size: 48,
    ..config.clone()
  };
  assert!(ocean.bake(&gpu.device, &gpu.queue, &broken).is_err());
  assert_eq!(ocean.config(), &config);
  assert_eq!(ocean.displacement_texture().width(), 32);

  let bigger = single_domain_config(64);
  ocean.bake(&gpu.device, &gpu.queue, &bigger).unwrap();
  assert_eq!(ocean.displacement_texture().width(), 64);
  assert_eq!(ocean.schedule().mip_level_count(), 7);
}

#[test]
fn assembled_height_is_the_cosine_of_a_single_frequency() {
  let Some(gpu) = gpu() else { return };
  let size = 64u32;
  let ocean = OceanSurface::new(&gpu.device, &gpu.queue, &single_domain_config(size)).unwrap();

  let (kx, ky) = (3i32, -4i32);
  let amplitude = 0.8f32;
  let h = Complex32::from_polar(amplitude * 0.5, -1.1);
  let at = |kx: i32, ky: i32| {
    (reference::spectrum_index(ky, size) * size + reference::spectrum_index(kx, size)) as usize
  };

  // Height lives in the zw pair of the displacement layer.
  let mut texels = vec![[0.0f32; 4]; 2 * (size * size) as usize];
  texels[at(kx, ky)] = [0.0, 0.0, h.re, h.im];
  texels[at(-kx, -ky)] = [0.0, 0.0, h.re, -h.im];
  write_spectrum(&gpu, &ocean, &texels);

  submit(&gpu, |encoder| {
    ocean.inverse_fft(encoder);
    ocean.assemble_textures(encoder);
  });
  let displacement =
    read_texture_layers(&gpu.device, &gpu.queue, ocean.displacement_texture(), 0, 0..1).unwrap();

  let mut heights = Vec::new();
  let mut expected = Vec::new();
  for y in 0..size {
    for x in 0..size {
      let texel = displacement.texel(0, x, y);
      heights.push(texel[1]);
      let angle = 2.0 * std::f32::consts::PI * (kx * x as i32 + ky * y as i32) as f32
        / size as f32
        - 1.1;
      expected.push(amplitude * angle.cos());
      assert!(texel[0].abs() < 1e-3 && texel[2].abs() < 1e-3, "({}, {})", x, y);
      assert_eq!(texel[3], 0.0, "flat horizontal field foams at ({}, {})", x, y);
    }
  }
  assert!(reference::max_abs_error(&heights, &expected) < 1e-3);
}

#[test]
fn evolved_spectrum_follows_the_quantized_phase() {
  let Some(gpu) = gpu() else { return };
  let size = 32u32;
  let config = single_domain_config(size);
  let ocean = OceanSurface::new(&gpu.device, &gpu.queue, &config).unwrap();
  let time = 3.25f32;

  submit(&gpu, |encoder| {
    ocean.calculate_spectrum(encoder);
    ocean.evolve_spectrum(encoder, time);
  });
  let initial = read_texture_layers(
    &gpu.device,
    &gpu.queue,
    ocean.textures().initial_spectrum(),
    0,
    0..1,
  )
  .unwrap();
  let evolved =
    read_texture_layers(&gpu.device, &gpu.queue, ocean.textures().spectrum(), 0, 0..1).unwrap();

  let frame = &config.frame;
  let w0 = 2.0 * std::f32::consts::PI / frame.repeat_time;
  let domain_size = config.layers[0].domain_size;

  // On the kx = 0 column the horizontal terms vanish and the zw pair is the height amplitude.
  let x = size / 2;
  let mut compared = 0;
  for y in (0..size).filter(|&y| y != size / 2) {
    let [_, kz] = reference::wave_vector(x, y, size, domain_size);
    let k = kz.abs();
    let steps = reference::dispersion(k, config.gravity, config.depth) / w0;
    if (steps - steps.round()).abs() < 1e-3 {
      continue;
    }

    let phase = reference::quantized_phase(
      k,
      config.gravity,
      config.depth,
      frame.repeat_time,
      time * frame.speed,
    );
    let h0 = initial.texel(0, x, y);
    let expected = reference::evolve_amplitude(
      Complex32::new(h0[0], h0[1]),
      Complex32::new(h0[2], h0[3]),
      phase,
    );

    let texel = evolved.texel(0, x, y);
    let actual = Complex32::new(texel[2], texel[3]);
    let tolerance = 1e-4 + 1e-3 * expected.norm();
    assert!(
      (actual - expected).norm() < tolerance,
      "y {}: {} vs {}",
      y,
      actual,
      expected
    );
    compared += 1;
  }
  assert!(compared > size / 2);
}

#[test]
fn assembler_and_mips_match_cpu() {
  let Some(gpu) = gpu() else { return };
  let size = 32u32;
  let mut ocean = OceanSurface::new(&gpu.device, &gpu.queue, &single_domain_config(size)).unwrap();
  let frame = FrameParameters {
    lambda: [0.8, 1.2],
    foam_bias: 0.9,
    foam_threshold: 0.0,
    foam_intensity: 2.0,
    ..Default::default()
  };
  ocean.set_frame_parameters(frame).unwrap();

  let layer_len = (size * size) as usize;
  let input = random_texels(2 * layer_len, 7);
  write_spectrum(&gpu, &ocean, &input);
  submit(&gpu, |encoder| ocean.assemble_textures(encoder));

  let read = |texture: &wgpu::Texture, mip_level: u32| {
    read_texture_layers(&gpu.device, &gpu.queue, texture, mip_level, 0..1).unwrap()
  };
  let displacement = read(ocean.displacement_texture(), 0);
  let slope = read(ocean.slope_texture(), 0);
  assert_eq!(slope.components, 2);

  let mut foaming = 0;
  for y in 0..size {
    for x in 0..size {
      let index = (y * size + x) as usize;
      let (expected_displacement, expected_slope) =
        reference::assemble_texel(x, y, input[index], input[layer_len + index], &frame);

      let actual = displacement.texel(0, x, y);
      let error = reference::max_abs_error(actual, &expected_displacement);
      assert!(
        error < 1e-4,
        "displacement ({}, {}): {:?} vs {:?}",
        x,
        y,
        actual,
        expected_displacement
      );
      let actual = slope.texel(0, x, y);
      let error = reference::max_abs_error(actual, &expected_slope);
      assert!(error < 1e-4, "slope ({}, {}): {:?} vs {:?}", x, y, actual, expected_slope);

      if expected_displacement[3] > 0.0 {
        foaming += 1;
      }
    }
  }
  assert!(foaming > 0, "random field produced no foam");

  for (texture, level) in [
    (ocean.displacement_texture(), &displacement),
    (ocean.slope_texture(), &slope),
  ] {
    let mip = read(texture, 1);
    assert_eq!((mip.width, mip.height), (size / 2, size / 2));
    let expected = reference::box_filter(level.layer(0), size, level.components);
    assert!(reference::max_abs_error(mip.layer(0), &expected) < 1e-5);
  }
}
