use serde::{Deserialize, Serialize};

use super::boiler::Boiler;
use crate::domain::{HeatCapacityVariant, SimulationError, SimulationResult, TimeStep};

/// Faces exchanging heat with the outside; the sixth face sits on the ground.
pub const EXPOSED_FACES: f64 = 5.0;
/// Bound on the temperature change of a single tick.
pub const MAX_DELTA_TEMPERATURE: f64 = 50.0;
/// kW → kWh scaling of the displayed consumption figure. Fixed, independent of the time step.
pub const ENERGY_REPORTING_FACTOR: f64 = 60.0;

const LITERS_PER_M3: f64 = 1000.0;

/// Initial values for a [`Building`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingConfig {
    pub temperature_c: f64,
    pub set_temperature_c: f64,
    pub outside_temperature_c: f64,
    pub edge_m: f64,
    /// U-value, W/m²K.
    pub heat_transfer_coefficient: f64,
    /// J/m³K.
    pub volume_heat_capacity: f64,
}

impl Default for BuildingConfig {
    fn default() -> Self {
        Self {
            temperature_c: 15.0,
            set_temperature_c: 20.0,
            outside_temperature_c: 15.0,
            edge_m: 10.0,
            heat_transfer_coefficient: 0.2,
            volume_heat_capacity: HeatCapacityVariant::House.capacity(),
        }
    }
}

/// Cubic building modelled as one lumped thermal mass, heated by its boiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    temperature_c: f64,
    set_temperature_c: f64,
    outside_temperature_c: f64,
    edge_m: f64,
    heat_transfer_coefficient: f64,
    volume_heat_capacity: f64,
    use_real_weather: bool,
    boiler: Boiler,
}

impl Building {
    pub fn new(config: BuildingConfig, boiler: Boiler) -> SimulationResult<Self> {
        if !(config.heat_transfer_coefficient > 0.0)
            || !(config.edge_m > 0.0)
            || !(config.volume_heat_capacity > 0.0)
        {
            return Err(SimulationError::invalid(
                "Heat transfer coefficient, building edge and volume heat capacity must be positive",
            ));
        }

        Ok(Self {
            temperature_c: config.temperature_c,
            set_temperature_c: config.set_temperature_c,
            outside_temperature_c: config.outside_temperature_c,
            edge_m: config.edge_m,
            heat_transfer_coefficient: config.heat_transfer_coefficient,
            volume_heat_capacity: config.volume_heat_capacity,
            use_real_weather: false,
            boiler,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn temperature_c(&self) -> f64 {
        self.temperature_c
    }

    pub fn set_temperature_c(&self) -> f64 {
        self.set_temperature_c
    }

    pub fn outside_temperature_c(&self) -> f64 {
        self.outside_temperature_c
    }

    pub fn edge_m(&self) -> f64 {
        self.edge_m
    }

    pub fn heat_transfer_coefficient(&self) -> f64 {
        self.heat_transfer_coefficient
    }

    pub fn volume_heat_capacity(&self) -> f64 {
        self.volume_heat_capacity
    }

    /// Preset matching the current capacity, if any.
    pub fn heat_capacity_variant(&self) -> Option<HeatCapacityVariant> {
        HeatCapacityVariant::from_capacity(self.volume_heat_capacity)
    }

    pub fn use_real_weather(&self) -> bool {
        self.use_real_weather
    }

    pub fn boiler(&self) -> &Boiler {
        &self.boiler
    }

    pub fn boiler_mut(&mut self) -> &mut Boiler {
        &mut self.boiler
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    pub fn update_set_temperature(&mut self, value: f64) {
        self.set_temperature_c = value;
    }

    /// Manual outside-temperature write. Rejected while the weather feed owns the value.
    pub fn update_outside_temperature(&mut self, value: f64) -> SimulationResult<()> {
        if self.use_real_weather {
            return Err(SimulationError::RealWeatherActive);
        }
        self.outside_temperature_c = value;
        Ok(())
    }

    /// Outside temperature coming from the weather feed.
    pub(crate) fn apply_weather(&mut self, value: f64) {
        self.outside_temperature_c = value;
    }

    pub fn update_edge(&mut self, value: f64) -> SimulationResult<()> {
        require_positive("Building edge", value)?;
        self.edge_m = value;
        Ok(())
    }

    pub fn update_heat_transfer_coefficient(&mut self, value: f64) -> SimulationResult<()> {
        require_positive("Heat transfer coefficient", value)?;
        self.heat_transfer_coefficient = value;
        Ok(())
    }

    pub fn update_volume_heat_capacity(&mut self, value: f64) -> SimulationResult<()> {
        require_positive("Volume heat capacity", value)?;
        self.volume_heat_capacity = value;
        Ok(())
    }

    pub fn set_use_real_weather(&mut self, enabled: bool) {
        self.use_real_weather = enabled;
    }

    pub fn toggle_real_weather(&mut self) -> bool {
        self.use_real_weather = !self.use_real_weather;
        self.use_real_weather
    }

    // ------------------------------------------------------------------
    // Derived quantities
    // ------------------------------------------------------------------

    /// Exposed surface in m².
    pub fn surface(&self) -> f64 {
        self.edge_m.powi(2) * EXPOSED_FACES
    }

    /// Volume in m³.
    pub fn volume(&self) -> f64 {
        self.edge_m.powi(3)
    }

    /// Heat flow to the outside in W. Positive when the building is warmer than outside.
    pub fn heat_loss(&self) -> f64 {
        self.heat_transfer_coefficient
            * self.surface()
            * (self.temperature_c - self.outside_temperature_c)
    }

    /// Steady-state temperature implied by the boiler's current output.
    pub fn temperature_reached(&self) -> f64 {
        let loss_w_per_k = self.heat_transfer_coefficient * self.surface();
        if loss_w_per_k == 0.0 {
            return self.outside_temperature_c;
        }
        self.outside_temperature_c + self.boiler.current_power_w() / loss_w_per_k
    }

    pub fn energy_consumption_kwh(&self) -> f64 {
        self.boiler.current_power_w() / 1000.0 * ENERGY_REPORTING_FACTOR
    }

    /// Advances the building temperature by one step. Returns the applied change.
    pub fn update_temperature(&mut self, step: TimeStep) -> f64 {
        let step_seconds = step.seconds();
        let power_w = self.boiler.update_heating_power();

        let energy_in = power_w * step_seconds;
        let energy_lost = self.heat_loss() * step_seconds;
        let thermal_mass = self.volume() * LITERS_PER_M3 * self.volume_heat_capacity;

        let delta = ((energy_in - energy_lost) / thermal_mass)
            .clamp(-MAX_DELTA_TEMPERATURE, MAX_DELTA_TEMPERATURE);
        self.temperature_c += delta;
        delta
    }
}

fn require_positive(name: &str, value: f64) -> SimulationResult<()> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(SimulationError::invalid(format!("{name} must be positive")))
    }
}
