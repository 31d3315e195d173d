//! Dispatch arguments for every compute stage of the ocean simulation.
//!
//! The pipelines never compute workgroup counts themselves: they encode exactly the
//! [`Dispatch`] values produced here. Consecutive dispatches are separate usage scopes,
//! so every write is visible to the dispatch that follows it.

use crate::ocean::error::ConfigurationError;
use crate::ocean::utils::{compute_work_group_count, exact_log2};

/// Workgroup edge of the spectrum, evolution and assembly kernels.
pub const SPECTRUM_WORKGROUP: u32 = 16;
/// Workgroup edge of the butterfly kernels.
pub const FFT_WORKGROUP: u32 = 8;
/// Workgroup height of the twiddle precompute kernel (its width is 1).
pub const TWIDDLE_WORKGROUP_HEIGHT: u32 = 8;

/// The two texture arrays the IFFT alternates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferRole {
  Spectrum,
  PingPong,
}

impl BufferRole {
  pub fn other(self) -> Self {
    match self {
      BufferRole::Spectrum => BufferRole::PingPong,
      BufferRole::PingPong => BufferRole::Spectrum,
    }
  }

  /// Buffer read by the stage at `stage_index`, counted across both axes.
  pub fn source_for_stage(stage_index: u32) -> Self {
    if stage_index % 2 == 0 {
      BufferRole::Spectrum
    } else {
      BufferRole::PingPong
    }
  }
}

/// Buffer holding the result once `total_stages` butterfly stages have run.
pub fn final_buffer(total_stages: u32) -> BufferRole {
  BufferRole::source_for_stage(total_stages)
}

pub fn needs_copy_back(total_stages: u32) -> bool {
  final_buffer(total_stages) == BufferRole::PingPong
}

/// Whether the last of `steps` wrote the ping-pong array. An empty run writes nothing.
pub fn steps_need_copy_back(steps: &[FftStep]) -> bool {
  steps
    .last()
    .map_or(false, |step| step.destination() == BufferRole::PingPong)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FftAxis {
  Horizontal,
  Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FftStep {
  pub axis: FftAxis,
  /// Butterfly stage within the axis, `0..log2(N)`.
  pub stage: u32,
  pub source: BufferRole,
}

impl FftStep {
  pub fn destination(&self) -> BufferRole {
    self.source.other()
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
  TwiddleFactors,
  InitialSpectrum,
  ConjugateSpectrum,
  EvolveSpectrum,
  Fft(FftStep),
  AssembleTextures,
  Mipmap { level: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
  pub kernel: Kernel,
  pub workgroups: [u32; 3],
}

/// Dispatch plan for one transform size and domain count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
  size: u32,
  log_size: u32,
  domain_count: u32,
}

impl Schedule {
  pub fn new(size: u32, domain_count: u32) -> Result<Self, ConfigurationError> {
    let log_size = exact_log2(size)?;
    if domain_count == 0 {
      return Err(ConfigurationError::DomainCount {
        count: 0,
        max: crate::ocean::config::MAX_DOMAINS,
      });
    }

    Ok(Self {
      size,
      log_size,
      domain_count,
    })
  }

  pub fn size(&self) -> u32 {
    self.size
  }

  pub fn log_size(&self) -> u32 {
    self.log_size
  }

  pub fn domain_count(&self) -> u32 {
    self.domain_count
  }

  /// Depth of the evolved spectrum and ping-pong arrays.
  pub fn spectrum_layers(&self) -> u32 {
    2 * self.domain_count
  }

  /// Full mip chain down to 1x1.
  pub fn mip_level_count(&self) -> u32 {
    self.log_size + 1
  }

  pub fn total_fft_stages(&self) -> u32 {
    2 * self.log_size
  }

  pub fn fft_needs_copy_back(&self) -> bool {
    needs_copy_back(self.total_fft_stages())
  }

  fn spectrum_grid(&self) -> (u32, u32) {
    compute_work_group_count(
      (self.size, self.size),
      (SPECTRUM_WORKGROUP, SPECTRUM_WORKGROUP),
    )
  }

  pub fn twiddle(&self) -> Dispatch {
    let (_, height) = compute_work_group_count(
      (self.log_size, self.size / 2),
      (1, TWIDDLE_WORKGROUP_HEIGHT),
    );
    Dispatch {
      kernel: Kernel::TwiddleFactors,
      workgroups: [self.log_size, height, 1],
    }
  }

  /// Spectrum synthesis followed by the conjugate packing pass.
  pub fn initial_spectrum(&self) -> [Dispatch; 2] {
    let (x, y) = self.spectrum_grid();
    [
      Dispatch {
        kernel: Kernel::InitialSpectrum,
        workgroups: [x, y, self.domain_count],
      },
      Dispatch {
        kernel: Kernel::ConjugateSpectrum,
        workgroups: [x, y, self.domain_count],
      },
    ]
  }

  pub fn evolve(&self) -> Dispatch {
    let (x, y) = self.spectrum_grid();
    Dispatch {
      kernel: Kernel::EvolveSpectrum,
      workgroups: [x, y, self.domain_count],
    }
  }

  /// Horizontal stages then vertical stages, sharing one alternation count.
  pub fn inverse_fft(&self) -> Vec<Dispatch> {
    self.fft_dispatches(&self.inverse_fft_steps())
  }

  /// The stages of a single axis, starting from the spectrum buffer.
  pub fn fft_axis(&self, axis: FftAxis) -> Vec<Dispatch> {
    self.fft_dispatches(&self.axis_steps(axis))
  }

  pub fn inverse_fft_steps(&self) -> Vec<FftStep> {
    self.fft_steps(&[FftAxis::Horizontal, FftAxis::Vertical])
  }

  pub fn axis_steps(&self, axis: FftAxis) -> Vec<FftStep> {
    self.fft_steps(&[axis])
  }

  /// Workgroups of every butterfly dispatch: the whole grid, all spectrum layers deep.
  pub fn fft_workgroups(&self) -> [u32; 3] {
    let (x, y) = compute_work_group_count((self.size, self.size), (FFT_WORKGROUP, FFT_WORKGROUP));
    [x, y, self.spectrum_layers()]
  }

  fn fft_steps(&self, axes: &[FftAxis]) -> Vec<FftStep> {
    axes
      .iter()
      .flat_map(|&axis| (0..self.log_size).map(move |stage| (axis, stage)))
      .enumerate()
      .map(|(index, (axis, stage))| FftStep {
        axis,
        stage,
        source: BufferRole::source_for_stage(index as u32),
      })
      .collect()
  }

  fn fft_dispatches(&self, steps: &[FftStep]) -> Vec<Dispatch> {
    let workgroups = self.fft_workgroups();
    steps
      .iter()
      .map(|&step| Dispatch {
        kernel: Kernel::Fft(step),
        workgroups,
      })
      .collect()
  }

  pub fn assemble(&self) -> Dispatch {
    let (x, y) = self.spectrum_grid();
    Dispatch {
      kernel: Kernel::AssembleTextures,
      workgroups: [x, y, self.domain_count],
    }
  }

  /// One dispatch per generated level, each covering the target level's extent.
  pub fn mipmaps(&self) -> Vec<Dispatch> {
    (1..self.mip_level_count())
      .map(|level| {
        let extent = (self.size >> level).max(1);
        let (x, y) =
          compute_work_group_count((extent, extent), (SPECTRUM_WORKGROUP, SPECTRUM_WORKGROUP));
        Dispatch {
          kernel: Kernel::Mipmap { level },
          workgroups: [x, y, self.domain_count],
        }
      })
      .collect()
  }

  /// Everything one frame encodes after evolution, in order.
  pub fn frame(&self) -> Vec<Dispatch> {
    let mut dispatches = vec![self.evolve()];
    dispatches.extend(self.inverse_fft());
    dispatches.push(self.assemble());
    dispatches.extend(self.mipmaps());
    dispatches
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn fft_steps(schedule: &Schedule) -> Vec<FftStep> {
    schedule.inverse_fft_steps()
  }

  #[test]
  fn rejects_non_power_of_two() {
    assert!(matches!(
      Schedule::new(96, 4),
      Err(ConfigurationError::NonPowerOfTwoSize(96))
    ));
    assert!(Schedule::new(256, 0).is_err());
  }

  #[test]
  fn dispatch_depths_follow_domain_count() {
    for domains in [1u32, 4] {
      let schedule = Schedule::new(256, domains).unwrap();

      for dispatch in schedule.initial_spectrum() {
        assert_eq!(dispatch.workgroups, [16, 16, domains]);
      }
      assert_eq!(schedule.evolve().workgroups, [16, 16, domains]);
      assert_eq!(schedule.assemble().workgroups, [16, 16, domains]);

      let fft = schedule.inverse_fft();
      assert_eq!(fft.len(), 16);
      for dispatch in &fft {
        assert_eq!(dispatch.workgroups, [32, 32, 2 * domains]);
      }

      for dispatch in schedule.mipmaps() {
        assert_eq!(dispatch.workgroups[2], domains);
      }
      assert_eq!(schedule.twiddle().workgroups, [8, 16, 1]);
    }
  }

  #[test]
  fn every_stage_reads_what_the_previous_stage_wrote() {
    let schedule = Schedule::new(128, 2).unwrap();
    let steps = fft_steps(&schedule);

    assert_eq!(steps[0].source, BufferRole::Spectrum);
    for pair in steps.windows(2) {
      assert_eq!(pair[1].source, pair[0].destination());
    }
  }

  #[test]
  fn vertical_pass_continues_horizontal_alternation() {
    let schedule = Schedule::new(128, 1).unwrap();
    let steps = fft_steps(&schedule);

    let horizontal: Vec<_> = steps.iter().filter(|s| s.axis == FftAxis::Horizontal).collect();
    let vertical: Vec<_> = steps.iter().filter(|s| s.axis == FftAxis::Vertical).collect();
    assert_eq!(horizontal.len(), 7);
    assert_eq!(vertical.len(), 7);

    // Seven horizontal stages leave the data in the ping-pong array.
    assert_eq!(horizontal[6].destination(), BufferRole::PingPong);
    assert_eq!(vertical[0].source, BufferRole::PingPong);
    assert_eq!(vertical[0].stage, 0);
    assert_eq!(vertical[6].stage, 6);
  }

  #[test]
  fn single_odd_axis_ends_in_ping_pong() {
    let schedule = Schedule::new(128, 1).unwrap();
    let axis = schedule.fft_axis(FftAxis::Vertical);
    assert_eq!(axis.len(), 7);
    assert!(needs_copy_back(axis.len() as u32));
    match axis[0].kernel {
      Kernel::Fft(step) => assert_eq!(step.source, BufferRole::Spectrum),
      other => panic!("unexpected kernel {:?}", other),
    }
  }

  #[test]
  fn copy_back_follows_the_last_step_run() {
    let schedule = Schedule::new(128, 1).unwrap();
    let horizontal = schedule.axis_steps(FftAxis::Horizontal);
    assert!(steps_need_copy_back(&horizontal));
    assert!(!steps_need_copy_back(&horizontal[..6]));
    assert!(!steps_need_copy_back(&schedule.inverse_fft_steps()));
    assert!(!steps_need_copy_back(&[]));

    for steps in [schedule.inverse_fft_steps(), horizontal] {
      assert_eq!(
        steps_need_copy_back(&steps),
        needs_copy_back(steps.len() as u32)
      );
    }
  }

  #[test]
  fn parity_decides_copy_back() {
    assert_eq!(final_buffer(0), BufferRole::Spectrum);
    assert_eq!(final_buffer(7), BufferRole::PingPong);
    assert!(needs_copy_back(7));
    assert!(!needs_copy_back(8));
    assert!(!needs_copy_back(14));
    assert!(!needs_copy_back(16));
  }

  #[test]
  fn full_transforms_end_in_spectrum_for_both_parities() {
    for (size, log_size) in [(256u32, 8u32), (128, 7)] {
      let schedule = Schedule::new(size, 4).unwrap();
      assert_eq!(schedule.log_size(), log_size);
      assert_eq!(schedule.total_fft_stages(), 2 * log_size);
      assert!(!schedule.fft_needs_copy_back());

      let last = *fft_steps(&schedule).last().unwrap();
      assert_eq!(last.destination(), BufferRole::Spectrum);
    }
  }

  #[test]
  fn mip_chain_reaches_one_texel() {
    let schedule = Schedule::new(64, 1).unwrap();
    let mips = schedule.mipmaps();
    assert_eq!(schedule.mip_level_count(), 7);
    assert_eq!(mips.len(), 6);
    assert_eq!(mips[0].kernel, Kernel::Mipmap { level: 1 });
    assert_eq!(mips[0].workgroups, [2, 2, 1]);
    assert_eq!(mips[5].workgroups, [1, 1, 1]);
  }

  #[test]
  fn frame_orders_evolve_fft_assemble() {
    let schedule = Schedule::new(32, 3).unwrap();
    let frame = schedule.frame();
    assert_eq!(frame[0].kernel, Kernel::EvolveSpectrum);
    assert!(matches!(frame[1].kernel, Kernel::Fft(_)));
    assert!(matches!(frame[10].kernel, Kernel::Fft(_)));
    assert_eq!(frame[11].kernel, Kernel::AssembleTextures);
    assert!(matches!(frame[12].kernel, Kernel::Mipmap { level: 1 }));
    assert_eq!(frame.len(), 1 + 10 + 1 + 5);
  }
}
