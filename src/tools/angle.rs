use core::f32::consts::{PI, TAU};

/// bring the given angle in range of -pi .. pi
/// callers feed angles that moved at most a few rad since the last wrap,
/// so the loops run a handful of iterations at worst
pub fn wrap_pm_pi(angle: f32) -> f32 {
  let mut result = angle;
  while result >= PI {
    result -= TAU;
  }
  while result < -PI {
    result += TAU;
  }
  result
}
