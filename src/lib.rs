#![no_std]
#![allow(dead_code)]

pub use crate::foc::acim_estimator::{AcimConfig, AcimEstimator};
pub use crate::tools::input_port::InputPort;

pub mod foc;
pub mod tools;

#[derive(Clone, Debug, Copy, PartialEq)]
pub enum EFocAcimError {
  ConfigError,
  MotorNrError,
}
pub type Result<T> = core::result::Result<T, EFocAcimError>;

/// stator current decomposed in the rotating d-q frame, in amperes
/// d is the flux producing component, q the torque producing component
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct Idq {
  pub d: f32,
  pub q: f32,
}
impl Idq {
  pub fn new(d: f32, q: f32) -> Self {
    Idq { d, q }
  }
}

/// snapshot of the outputs of a phase estimator, taken after an update
/// the phase and velocity are only usable by a consumer when active is true,
/// on inactive cycles they hold the last computed values
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct PhaseEstimate {
  pub phase: f32,     // electrical angle in rad, wrapped to -pi .. pi
  pub phase_vel: f32, // electrical angular velocity in rad/s
  pub active: bool,
}
impl PhaseEstimate {
  pub fn new() -> Self {
    PhaseEstimate {
      phase: 0.0,
      phase_vel: 0.0,
      active: false,
    }
  }
}

/// The trait for the family of phase/velocity estimators feeding the foc loop.
/// Sensored pmsm, sensorless pmsm and the acim observer all fit this contract,
/// so the foc consumer does not care which estimator variant is wired in.
pub trait PhaseEstimator {
  /// advance the estimator to the given hardware tick count.
  /// must be called once per control cycle, from the control loop context only
  fn update(&mut self, timestamp: u32);
  /// the outputs as of the last completed update. Gate on active before use
  fn estimate(&self) -> PhaseEstimate;
}
