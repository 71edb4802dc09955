//! Boiler regulator
//!
//! Drives the boiler's operating percentage toward the building's set
//! temperature with a PID-shaped heuristic:
//!
//! - the P, I and D terms are computed on the **absolute** error and combined
//!   into an adjustment *rate*,
//! - the signed error multiplies that rate to give the adjustment applied to the
//!   operating percentage, which is then clamped to [0, 100].
//!
//! Output = e * (Kp * |e| + Ki * Σ|e| + Kd * (|e| - |e_prev|))
//!
//! The integral accumulator has no decay. Without an `integral_limit` it grows
//! for as long as the simulation runs and the operating point can sit at a bound
//! for a while before recovering.
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::simulation::Building;

pub const DEFAULT_KP: f64 = 0.1;
pub const DEFAULT_KI: f64 = 0.005;
pub const DEFAULT_KD: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regulator {
    /// Proportional gain
    kp: f64,
    /// Integral gain
    ki: f64,
    /// Derivative gain
    kd: f64,

    /// Sum of absolute errors
    cumulative_error: f64,
    /// Absolute error of the previous call
    previous_error: f64,

    /// Optional anti-windup bound on `cumulative_error`
    integral_limit: Option<f64>,
}

impl Default for Regulator {
    fn default() -> Self {
        Self::new(DEFAULT_KP, DEFAULT_KI, DEFAULT_KD)
    }
}

impl Regulator {
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            cumulative_error: 0.0,
            previous_error: 0.0,
            integral_limit: None,
        }
    }

    /// Caps the integral accumulator at `limit`. `None` keeps it unbounded.
    pub fn with_integral_limit(mut self, limit: Option<f64>) -> Self {
        self.integral_limit = limit.map(f64::abs);
        self
    }

    pub fn gains(&self) -> (f64, f64, f64) {
        (self.kp, self.ki, self.kd)
    }

    pub fn cumulative_error(&self) -> f64 {
        self.cumulative_error
    }

    pub fn previous_error(&self) -> f64 {
        self.previous_error
    }

    pub fn integral_limit(&self) -> Option<f64> {
        self.integral_limit
    }

    pub fn reset(&mut self) {
        self.cumulative_error = 0.0;
        self.previous_error = 0.0;
    }

    /// Updates the accumulators with `abs_error` and returns the adjustment rate.
    pub fn adjustment_rate(&mut self, abs_error: f64) -> f64 {
        self.cumulative_error += abs_error;
        if let Some(limit) = self.integral_limit {
            self.cumulative_error = self.cumulative_error.min(limit);
        }
        let derivative = abs_error - self.previous_error;
        self.previous_error = abs_error;

        self.kp * abs_error + self.ki * self.cumulative_error + self.kd * derivative
    }

    /// Adjusts the building's boiler and returns the new operating percentage.
    pub fn regulate(&mut self, building: &mut Building) -> f64 {
        let error = building.set_temperature_c() - building.temperature_c();
        let rate = self.adjustment_rate(error.abs());
        let adjustment = error * rate;

        let boiler = building.boiler_mut();
        let previous = boiler.operating_percentage();
        boiler.set_operating_percentage(previous + adjustment);

        trace!(
            error,
            rate,
            adjustment,
            operating_percentage = boiler.operating_percentage(),
            "regulator step"
        );
        boiler.operating_percentage()
    }
}
