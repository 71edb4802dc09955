use serde::{Deserialize, Serialize};

use crate::domain::{Fuel, SimulationError, SimulationResult};

pub const MIN_OPERATING_PERCENTAGE: f64 = 0.0;
pub const MAX_OPERATING_PERCENTAGE: f64 = 100.0;

const HOURS_PER_YEAR: f64 = 24.0 * 365.0;

/// Fuel-fired boiler with a modulating operating point.
///
/// `current_power_w` is derived from `power_w` and `operating_percentage`; every
/// mutation of either goes through a setter that recomputes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boiler {
    power_w: f64,
    operating_percentage: f64,
    fuel: Fuel,
    current_power_w: f64,
}

impl Boiler {
    pub fn new(power_w: f64, operating_percentage: f64, fuel: Fuel) -> SimulationResult<Self> {
        if !(power_w > 0.0) {
            return Err(SimulationError::invalid("Boiler power must be positive"));
        }
        if !(MIN_OPERATING_PERCENTAGE..=MAX_OPERATING_PERCENTAGE).contains(&operating_percentage) {
            return Err(SimulationError::invalid(
                "Operating percentage must be between 0 and 100",
            ));
        }

        let mut boiler = Self {
            power_w,
            operating_percentage,
            fuel,
            current_power_w: 0.0,
        };
        boiler.update_heating_power();
        Ok(boiler)
    }

    /// Parses the fuel name first, so an unknown fuel is rejected like any other bad argument.
    pub fn from_fuel_name(power_w: f64, operating_percentage: f64, fuel: &str) -> SimulationResult<Self> {
        Self::new(power_w, operating_percentage, fuel.parse()?)
    }

    pub fn power_w(&self) -> f64 {
        self.power_w
    }

    pub fn operating_percentage(&self) -> f64 {
        self.operating_percentage
    }

    pub fn fuel(&self) -> Fuel {
        self.fuel
    }

    pub fn current_power_w(&self) -> f64 {
        self.current_power_w
    }

    pub fn set_power_w(&mut self, power_w: f64) {
        self.power_w = power_w;
        self.update_heating_power();
    }

    /// Clamps into [0, 100].
    pub fn set_operating_percentage(&mut self, percentage: f64) {
        self.operating_percentage =
            percentage.clamp(MIN_OPERATING_PERCENTAGE, MAX_OPERATING_PERCENTAGE);
        self.update_heating_power();
    }

    pub fn set_fuel(&mut self, fuel: Fuel) {
        self.fuel = fuel;
    }

    pub fn update_heating_power(&mut self) -> f64 {
        self.current_power_w = self.power_w * (self.operating_percentage / 100.0);
        self.current_power_w
    }

    /// Fuel burned per hour at the current output, in the fuel's physical unit.
    pub fn fuel_consumption(&self) -> f64 {
        let power_kw = self.current_power_w / 1000.0;
        power_kw / self.fuel.calorific_value_kwh()
    }

    /// Yearly cost of running continuously at the current output.
    pub fn annual_fuel_cost(&self) -> f64 {
        let price_per_kwh = self.fuel.price_cents_per_kwh() / 100.0;
        self.fuel_consumption() * HOURS_PER_YEAR * price_per_kwh
    }
}
