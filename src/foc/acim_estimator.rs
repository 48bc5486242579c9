use libm::fabsf;

use crate::tools::angle::wrap_pm_pi;
use crate::tools::input_port::InputPort;
use crate::{EFocAcimError, Idq, PhaseEstimate, PhaseEstimator, Result};

/// configuration of the acim estimator, immutable after construction.
/// both values come from outside: the slip gain from a motor calibration
/// procedure, the clock rate from the timer the control loop timestamps with
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct AcimConfig {
  slip_gain: f32, // rad/s per unit iq/flux, combines 1/tau_rotor and Lm normalization
  clock_hz: f32,  // tick rate of the timestamps passed to update
}

impl AcimConfig {
  pub fn new(slip_gain: f32, clock_hz: f32) -> Result<Self> {
    // negated comparisons so that NaN parameters are rejected as well
    if !(slip_gain >= 0.0) || !(clock_hz > 0.0) {
      return Err(EFocAcimError::ConfigError);
    }
    Ok(AcimConfig { slip_gain, clock_hz })
  }
  pub fn get_slip_gain(&self) -> f32 {
    self.slip_gain
  }
  pub fn get_clock_hz(&self) -> f32 {
    self.clock_hz
  }
}

/// Sensorless rotor flux observer for ac induction motors.
///
/// An induction machine has no rotor flux sensor, so the stator electrical
/// angle the foc stage needs is estimated here: the rotor flux magnitude is
/// integrated from the d axis current with a first order lag model, the slip
/// frequency follows from the q axis current over that flux, and the stator
/// phase is the rotor mechanical phase plus the accumulated slip phase.
///
/// All inputs arrive through option carrying ports. Any absent input
/// deactivates the observer for that cycle; the first cycle with all inputs
/// back is spent on a bootstrap that zeroes the flux state, so garbage is
/// never integrated. Outputs are held across inactive cycles and only usable
/// while active.
pub struct AcimEstimator {
  config: AcimConfig,
  // input ports, written by the position and current stages
  rotor_phase: InputPort<f32>,     // rad, wrapped -pi .. pi
  rotor_phase_vel: InputPort<f32>, // rad/s
  idq: InputPort<Idq>,             // amperes
  // integration state
  rotor_flux: f32,   // estimated rotor flux, in the same units as id
  phase_offset: f32, // accumulated slip phase relative to the rotor, rad, -pi .. pi
  last_timestamp: u32,
  active: bool,
  // outputs, written every active cycle, held otherwise
  stator_phase: f32,     // rad, wrapped -pi .. pi
  stator_phase_vel: f32, // rad/s
  slip_vel: f32,         // rad/s
}

impl AcimEstimator {
  pub fn new(config: AcimConfig) -> Self {
    AcimEstimator {
      config,
      rotor_phase: InputPort::new(),
      rotor_phase_vel: InputPort::new(),
      idq: InputPort::new(),
      rotor_flux: 0.0,
      phase_offset: 0.0,
      last_timestamp: 0,
      active: false,
      stator_phase: 0.0,
      stator_phase_vel: 0.0,
      slip_vel: 0.0,
    }
  }

  /// port for the rotor mechanical electrical angle from the position source
  pub fn rotor_phase_port(&mut self) -> &mut InputPort<f32> {
    &mut self.rotor_phase
  }
  /// port for the rotor mechanical electrical angular velocity
  pub fn rotor_phase_vel_port(&mut self) -> &mut InputPort<f32> {
    &mut self.rotor_phase_vel
  }
  /// port for the measured d-q stator current pair
  pub fn idq_port(&mut self) -> &mut InputPort<Idq> {
    &mut self.idq
  }

  /// stator electrical angle for the park reference, rad in -pi .. pi
  pub fn get_stator_phase(&self) -> f32 {
    self.stator_phase
  }
  /// stator electrical frequency in rad/s
  pub fn get_stator_phase_vel(&self) -> f32 {
    self.stator_phase_vel
  }
  /// slip frequency in rad/s, for diagnostics
  pub fn get_slip_vel(&self) -> f32 {
    self.slip_vel
  }
  /// estimated rotor flux in current equivalent units, for diagnostics
  pub fn get_rotor_flux(&self) -> f32 {
    self.rotor_flux
  }
  pub fn get_phase_offset(&self) -> f32 {
    self.phase_offset
  }
  /// false while any input is missing and during the bootstrap cycle.
  /// outputs are stale whenever this is false
  pub fn is_active(&self) -> bool {
    self.active
  }

  /// advance the observer to the given hardware tick count.
  /// called once per control cycle. Never blocks, never allocates, every
  /// branch is O(1). Missing inputs and numerically implausible slip are
  /// recovered locally, there is no error channel
  pub fn update(&mut self, timestamp: u32) {
    let (rotor_phase, rotor_phase_vel, idq) = match (
      self.rotor_phase.present(),
      self.rotor_phase_vel.present(),
      self.idq.present(),
    ) {
      (Some(phase), Some(phase_vel), Some(idq)) => (phase, phase_vel, idq),
      // upstream not producing: halt integration until all inputs are back
      _ => {
        self.active = false;
        return;
      }
    };

    // wrapping subtraction on the raw ticks, so a single counter overflow
    // between calls still yields the correct delta
    let dt = timestamp.wrapping_sub(self.last_timestamp) as f32 / self.config.clock_hz;
    self.last_timestamp = timestamp;

    if !self.active {
      // first cycle with all inputs present: start from clean state instead
      // of integrating whatever was left over. No new phase this cycle
      self.rotor_flux = 0.0;
      self.phase_offset = 0.0;
      self.active = true;
      return;
    }

    if dt <= 0.0 {
      // repeated timestamp. Integrating would make the slip bound 0.1/dt
      // meaningless, so hold this cycle
      return;
    }

    // first order lag of the rotor flux towards id. The rotor time constant
    // (0.1 .. 1 s) is far slower than a control period, so treating the
    // current command as instantly realized costs no accuracy
    let dflux_by_dt = self.config.slip_gain * (idq.d - self.rotor_flux);
    self.rotor_flux += dflux_by_dt * dt;

    // slip frequency from the torque current over the flux. With the flux
    // near zero this blows up, so anything beyond 0.1 rad of slip phase in
    // one step, or NaN, is rejected and replaced by zero
    let mut slip_velocity = self.config.slip_gain * (idq.q / self.rotor_flux);
    if slip_velocity.is_nan() || fabsf(slip_velocity) > 0.1 / dt {
      slip_velocity = 0.0;
    }
    self.slip_vel = slip_velocity;

    // stator frequency = rotor mechanical frequency + slip frequency
    self.stator_phase_vel = rotor_phase_vel + slip_velocity;

    // integrate the slip into the offset, wrapped every cycle so it cannot
    // grow without bound over long uptimes
    self.phase_offset = wrap_pm_pi(self.phase_offset + slip_velocity * dt);
    self.stator_phase = wrap_pm_pi(rotor_phase + self.phase_offset);
  }
}

impl PhaseEstimator for AcimEstimator {
  fn update(&mut self, timestamp: u32) {
    AcimEstimator::update(self, timestamp)
  }
  fn estimate(&self) -> PhaseEstimate {
    PhaseEstimate {
      phase: self.stator_phase,
      phase_vel: self.stator_phase_vel,
      active: self.active,
    }
  }
}
