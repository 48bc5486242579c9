use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::{Instant, Ticker};
use rtt_target::rprintln;

use crate::foc::acim_estimator::AcimEstimator;
use crate::foc::MAX_MOTOR_NR;
use crate::{EFocAcimError, Idq, PhaseEstimate, PhaseEstimator, Result};

/// one sample from the position stage: rotor mechanical electrical angle and velocity
#[derive(Clone, Debug, Copy, PartialEq)]
pub struct RotorSample {
  pub phase: f32,     // rad, wrapped -pi .. pi
  pub phase_vel: f32, // rad/s
}

// per motor plumbing between the pipeline stages and the estimator task.
// upstream signals Some with a fresh sample, or None to report a dropout
pub static ROTOR_SAMPLES: [Signal<CriticalSectionRawMutex, Option<RotorSample>>; MAX_MOTOR_NR] =
  [Signal::new(), Signal::new()];
pub static IDQ_SAMPLES: [Signal<CriticalSectionRawMutex, Option<Idq>>; MAX_MOTOR_NR] = [Signal::new(), Signal::new()];
// latest estimate for the foc consumer and telemetry
pub static STATOR_ESTIMATES: [Signal<CriticalSectionRawMutex, PhaseEstimate>; MAX_MOTOR_NR] =
  [Signal::new(), Signal::new()];

/// the tick rate update timestamps are taken at, for building the AcimConfig
pub fn timestamp_clock_hz() -> f32 {
  embassy_time::TICK_HZ as f32
}

/// Embassy task wrapper around the acim estimator. Runs the observer at the
/// ticker cadence, feeds it from the sample signals and publishes every
/// estimate. The estimator itself never sees the async machinery.
pub struct AcimEmbassy {
  motor_nr: usize,
  estimator: AcimEstimator,
  ticker: Ticker,
  was_active: bool,
}

impl AcimEmbassy {
  /// the estimator config must use timestamp_clock_hz() as its clock rate
  pub fn new(motor_nr: usize, estimator: AcimEstimator, ticker: Ticker) -> Result<AcimEmbassy> {
    if motor_nr >= MAX_MOTOR_NR {
      rprintln!("Incorrect motor number {}", motor_nr);
      return Err(EFocAcimError::MotorNrError);
    }
    Ok(AcimEmbassy {
      motor_nr,
      estimator,
      ticker,
      was_active: false,
    })
  }

  pub fn get_estimator(&mut self) -> &mut AcimEstimator {
    &mut self.estimator
  }

  /// the task will become the owner of Self
  pub async fn task(&mut self) {
    let nr = self.motor_nr;
    rprintln!("Start acim estimator task for motor {}", nr);
    loop {
      self.ticker.next().await;

      // move fresh samples into the ports. A port is only cleared when the
      // source explicitly reported a dropout, a quiet signal keeps the last value
      if let Some(sample) = ROTOR_SAMPLES[nr].try_take() {
        match sample {
          Some(s) => {
            self.estimator.rotor_phase_port().write(s.phase);
            self.estimator.rotor_phase_vel_port().write(s.phase_vel);
          }
          None => {
            self.estimator.rotor_phase_port().clear();
            self.estimator.rotor_phase_vel_port().clear();
          }
        }
      }
      if let Some(sample) = IDQ_SAMPLES[nr].try_take() {
        match sample {
          Some(idq) => self.estimator.idq_port().write(idq),
          None => self.estimator.idq_port().clear(),
        }
      }

      self.estimator.update(Instant::now().as_ticks() as u32);

      let estimate = self.estimator.estimate();
      STATOR_ESTIMATES[nr].signal(estimate);

      if estimate.active != self.was_active {
        self.was_active = estimate.active;
        if estimate.active {
          rprintln!("Acim estimator {} active", nr);
        } else {
          rprintln!("Acim estimator {} lost its inputs", nr);
        }
      }
    }
  }
}
