pub mod acim_estimator;

#[cfg(feature = "embassy")]
pub mod acim_embassy;

pub const MAX_MOTOR_NR: usize = 2;
