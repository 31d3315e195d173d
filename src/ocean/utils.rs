use crate::ocean::error::ConfigurationError;

pub fn compute_work_group_count(
  (width, height): (u32, u32),
  (workgroup_width, workgroup_height): (u32, u32),
) -> (u32, u32) {
  let x = (width + workgroup_width - 1) / workgroup_width;
  let y = (height + workgroup_height - 1) / workgroup_height;

  (x, y)
}

#[inline]
pub fn clamp<T: PartialOrd>(input: T, min: T, max: T) -> T {
  debug_assert!(min <= max, "min must be less than or equal to max");
  if input < min {
    min
  } else if input > max {
    max
  } else {
    input
  }
}

/// Number of butterfly stages for one axis of a transform of `size` texels.
pub fn exact_log2(size: u32) -> Result<u32, ConfigurationError> {
  if !size.is_power_of_two() {
    return Err(ConfigurationError::NonPowerOfTwoSize(size));
  }

  Ok(size.trailing_zeros())
}
