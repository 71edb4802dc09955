//! Control-plane operations.
//!
//! Each settable field of the simulation is a [`Parameter`] with a unit, an
//! accepted range and a typed getter/setter pair; each derived read-only
//! quantity is a [`Reading`]. Updates validate first and assign second, so a
//! rejected request leaves the state untouched.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

use crate::domain::{Fuel, HeatCapacityVariant, SimulationError, SimulationResult, TimeStep};
use crate::simulation::SimulationState;

pub const SET_TEMPERATURE_RANGE: (f64, f64) = (-10.0, 40.0);
pub const OUTSIDE_TEMPERATURE_RANGE: (f64, f64) = (-50.0, 50.0);
pub const BUILDING_EDGE_RANGE: (f64, f64) = (1.0, 100.0);
pub const HEAT_TRANSFER_COEFFICIENT_RANGE: (f64, f64) = (0.1, 10.0);
pub const BOILER_POWER_RANGE: (f64, f64) = (1000.0, 35000.0);
pub const VOLUME_HEAT_CAPACITY_RANGE: (f64, f64) = (1.0, 5000.0);

const CURRENCY_PER_YEAR: &str = "CHF/year";

/// Settable simulation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "kebab-case")]
pub enum Parameter {
    SetTemperature,
    OutsideTemperature,
    UseRealWeather,
    BuildingEdge,
    HeatTransferCoefficient,
    BoilerPower,
    VolumeHeatCapacity,
    BoilerFuel,
    VolumeHeatCapacityVariant,
    TimeStep,
}

/// Typed parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Flag(bool),
    Fuel(Fuel),
    /// `None` when the capacity does not match any preset.
    #[serde(serialize_with = "variant_or_custom")]
    HeatCapacity(Option<HeatCapacityVariant>),
    TimeStep(TimeStep),
}

fn variant_or_custom<S: Serializer>(
    variant: &Option<HeatCapacityVariant>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match variant {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str("custom"),
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Number(v) => write!(f, "{v}"),
            ParameterValue::Flag(v) => write!(f, "{v}"),
            ParameterValue::Fuel(v) => write!(f, "{v}"),
            ParameterValue::HeatCapacity(Some(v)) => write!(f, "{v}"),
            ParameterValue::HeatCapacity(None) => write!(f, "custom"),
            ParameterValue::TimeStep(v) => write!(f, "{v}"),
        }
    }
}

/// How a numeric update combines with the current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Set,
    Increase,
    Decrease,
}

impl Action {
    /// `Decrease` always moves down, whatever the sign of `delta`.
    pub fn apply(self, current: f64, value: f64) -> f64 {
        match self {
            Action::Set => value,
            Action::Increase => current + value,
            Action::Decrease => current - value.abs(),
        }
    }
}

/// Result of a successful update.
#[derive(Debug, Clone, PartialEq)]
pub enum SetOutcome {
    Updated {
        previous: ParameterValue,
        current: ParameterValue,
    },
    /// Enum-valued parameter already held the requested value.
    Unchanged(ParameterValue),
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub value: ParameterValue,
    pub unit: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl Parameter {
    pub fn name(self) -> &'static str {
        match self {
            Parameter::SetTemperature => "set-temperature",
            Parameter::OutsideTemperature => "outside-temperature",
            Parameter::UseRealWeather => "use-real-weather",
            Parameter::BuildingEdge => "building-edge",
            Parameter::HeatTransferCoefficient => "heat-transfer-coefficient",
            Parameter::BoilerPower => "boiler-power",
            Parameter::VolumeHeatCapacity => "volume-heat-capacity",
            Parameter::BoilerFuel => "boiler-fuel",
            Parameter::VolumeHeatCapacityVariant => "volume-heat-capacity-variant",
            Parameter::TimeStep => "time-step",
        }
    }

    /// Response key, e.g. `boiler_power`.
    pub fn json_key(self) -> String {
        self.name().replace('-', "_")
    }

    pub fn label(self) -> &'static str {
        match self {
            Parameter::SetTemperature => "Set temperature",
            Parameter::OutsideTemperature => "Outside temperature",
            Parameter::UseRealWeather => "Use real weather",
            Parameter::BuildingEdge => "Building edge",
            Parameter::HeatTransferCoefficient => "Heat transfer coefficient",
            Parameter::BoilerPower => "Boiler power",
            Parameter::VolumeHeatCapacity => "Volume heat capacity",
            Parameter::BoilerFuel => "Boiler fuel",
            Parameter::VolumeHeatCapacityVariant => "Volume heat capacity variant",
            Parameter::TimeStep => "Time step",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Parameter::SetTemperature | Parameter::OutsideTemperature => "°C",
            Parameter::BuildingEdge => "m",
            Parameter::HeatTransferCoefficient => "W/(m²K)",
            Parameter::BoilerPower => "W",
            Parameter::VolumeHeatCapacity => "J/(m³K)",
            Parameter::UseRealWeather
            | Parameter::BoilerFuel
            | Parameter::VolumeHeatCapacityVariant
            | Parameter::TimeStep => "",
        }
    }

    /// Inclusive range for numeric parameters.
    pub fn range(self) -> Option<(f64, f64)> {
        match self {
            Parameter::SetTemperature => Some(SET_TEMPERATURE_RANGE),
            Parameter::OutsideTemperature => Some(OUTSIDE_TEMPERATURE_RANGE),
            Parameter::BuildingEdge => Some(BUILDING_EDGE_RANGE),
            Parameter::HeatTransferCoefficient => Some(HEAT_TRANSFER_COEFFICIENT_RANGE),
            Parameter::BoilerPower => Some(BOILER_POWER_RANGE),
            Parameter::VolumeHeatCapacity => Some(VOLUME_HEAT_CAPACITY_RANGE),
            _ => None,
        }
    }

    pub fn options(self) -> Option<Vec<String>> {
        match self {
            Parameter::BoilerFuel => Some(Fuel::names()),
            Parameter::VolumeHeatCapacityVariant => {
                Some(HeatCapacityVariant::iter().map(|v| v.to_string()).collect())
            }
            Parameter::TimeStep => Some(TimeStep::iter().map(|v| v.to_string()).collect()),
            Parameter::UseRealWeather => Some(vec!["true".to_string(), "false".to_string()]),
            _ => None,
        }
    }

    pub fn is_numeric(self) -> bool {
        self.range().is_some()
    }

    pub fn get(self, state: &SimulationState) -> ParameterValue {
        let building = state.building();
        match self {
            Parameter::SetTemperature => ParameterValue::Number(building.set_temperature_c()),
            Parameter::OutsideTemperature => {
                ParameterValue::Number(building.outside_temperature_c())
            }
            Parameter::UseRealWeather => ParameterValue::Flag(building.use_real_weather()),
            Parameter::BuildingEdge => ParameterValue::Number(building.edge_m()),
            Parameter::HeatTransferCoefficient => {
                ParameterValue::Number(building.heat_transfer_coefficient())
            }
            Parameter::BoilerPower => ParameterValue::Number(building.boiler().power_w()),
            Parameter::VolumeHeatCapacity => {
                ParameterValue::Number(building.volume_heat_capacity())
            }
            Parameter::BoilerFuel => ParameterValue::Fuel(building.boiler().fuel()),
            Parameter::VolumeHeatCapacityVariant => {
                ParameterValue::HeatCapacity(building.heat_capacity_variant())
            }
            Parameter::TimeStep => ParameterValue::TimeStep(state.time_step()),
        }
    }

    pub fn info(self, state: &SimulationState) -> ParameterInfo {
        let range = self.range();
        ParameterInfo {
            name: self.name(),
            value: self.get(state),
            unit: self.unit(),
            min: range.map(|r| r.0),
            max: range.map(|r| r.1),
            options: self.options(),
        }
    }

    /// Converts a raw JSON value into this parameter's type.
    pub fn parse_value(self, raw: &serde_json::Value) -> SimulationResult<ParameterValue> {
        let expected = |kind: &str| {
            SimulationError::invalid(format!("{} expects {kind}, got {raw}", self.name()))
        };
        match self {
            Parameter::UseRealWeather => raw
                .as_bool()
                .map(ParameterValue::Flag)
                .ok_or_else(|| expected("a boolean")),
            Parameter::BoilerFuel => {
                let s = raw.as_str().ok_or_else(|| expected("a fuel name"))?;
                Ok(ParameterValue::Fuel(s.parse()?))
            }
            Parameter::VolumeHeatCapacityVariant => {
                let s = raw.as_str().ok_or_else(|| expected("a heat capacity variant"))?;
                Ok(ParameterValue::HeatCapacity(Some(s.parse()?)))
            }
            Parameter::TimeStep => {
                let s = raw.as_str().ok_or_else(|| expected("a time step"))?;
                Ok(ParameterValue::TimeStep(s.parse()?))
            }
            _ => raw
                .as_f64()
                .map(ParameterValue::Number)
                .ok_or_else(|| expected("a number")),
        }
    }

    fn check_range(self, value: f64) -> SimulationResult<()> {
        let Some((min, max)) = self.range() else {
            return Ok(());
        };
        if (min..=max).contains(&value) {
            Ok(())
        } else {
            Err(SimulationError::OutOfRange {
                parameter: self.label(),
                value,
                min,
                max,
                unit: self.unit(),
            })
        }
    }

    /// Validates and applies one update. Must run under the state's write lock.
    pub fn update(
        self,
        state: &mut SimulationState,
        action: Action,
        raw: &serde_json::Value,
    ) -> SimulationResult<SetOutcome> {
        let requested = self.parse_value(raw)?;
        let target = match (action, requested) {
            (Action::Set, value) => value,
            (_, ParameterValue::Number(delta)) => match self.get(state) {
                ParameterValue::Number(current) => {
                    ParameterValue::Number(action.apply(current, delta))
                }
                _ => unreachable!("numeric parameter returned a non-numeric value"),
            },
            _ => {
                return Err(SimulationError::invalid(format!(
                    "{} cannot be increased or decreased",
                    self.name()
                )))
            }
        };
        self.set(state, target)
    }

    /// Assigns `value` after validation.
    pub fn set(self, state: &mut SimulationState, value: ParameterValue) -> SimulationResult<SetOutcome> {
        let previous = self.get(state);
        let building = state.building_mut();

        match (self, value) {
            (_, ParameterValue::Number(v)) if self.is_numeric() => {
                self.check_range(v)?;
                match self {
                    Parameter::SetTemperature => building.update_set_temperature(v),
                    Parameter::OutsideTemperature => building.update_outside_temperature(v)?,
                    Parameter::BuildingEdge => building.update_edge(v)?,
                    Parameter::HeatTransferCoefficient => {
                        building.update_heat_transfer_coefficient(v)?
                    }
                    Parameter::BoilerPower => building.boiler_mut().set_power_w(v),
                    Parameter::VolumeHeatCapacity => building.update_volume_heat_capacity(v)?,
                    _ => unreachable!("range() is only defined for numeric parameters"),
                }
            }
            _ if previous == value => return Ok(SetOutcome::Unchanged(value)),
            (Parameter::UseRealWeather, ParameterValue::Flag(enabled)) => {
                building.set_use_real_weather(enabled)
            }
            (Parameter::BoilerFuel, ParameterValue::Fuel(fuel)) => building.boiler_mut().set_fuel(fuel),
            (Parameter::VolumeHeatCapacityVariant, ParameterValue::HeatCapacity(Some(variant))) => {
                building.update_volume_heat_capacity(variant.capacity())?
            }
            (Parameter::TimeStep, ParameterValue::TimeStep(step)) => state.set_time_step(step),
            _ => {
                return Err(SimulationError::invalid(format!(
                    "value {value} does not fit parameter {}",
                    self.name()
                )))
            }
        }

        Ok(SetOutcome::Updated {
            previous,
            current: self.get(state),
        })
    }
}

impl std::str::FromStr for Parameter {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Parameter::iter()
            .find(|p| p.name() == normalized)
            .ok_or_else(|| SimulationError::invalid(format!("Unknown parameter {s}")))
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl SetOutcome {
    pub fn message(&self, parameter: Parameter) -> String {
        let unit = parameter.unit();
        match self {
            SetOutcome::Updated { current, .. } if unit.is_empty() => {
                format!("{} successfully set to {}", parameter.label(), current)
            }
            SetOutcome::Updated { current, .. } => {
                format!("{} successfully set to {} {}", parameter.label(), current, unit)
            }
            SetOutcome::Unchanged(value) => {
                format!("{} already set to {}", parameter.label(), value)
            }
        }
    }
}

// ============================================================================
// Readings
// ============================================================================

/// Read-only derived quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "kebab-case")]
pub enum Reading {
    CurrentBuildingTemperature,
    TemperatureReached,
    BoilerOperatingPercentage,
    CurrentEnergyConsumption,
    CurrentBoilerHeatPower,
    CurrentFuelConsumption,
    CurrentEnergyPrice,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadingInfo {
    pub name: &'static str,
    pub value: f64,
    pub unit: String,
}

impl Reading {
    pub fn name(self) -> &'static str {
        match self {
            Reading::CurrentBuildingTemperature => "current-building-temperature",
            Reading::TemperatureReached => "temperature-reached",
            Reading::BoilerOperatingPercentage => "boiler-operating-percentage",
            Reading::CurrentEnergyConsumption => "current-energy-consumption",
            Reading::CurrentBoilerHeatPower => "current-boiler-heat-power",
            Reading::CurrentFuelConsumption => "current-fuel-consumption",
            Reading::CurrentEnergyPrice => "current-energy-price",
        }
    }

    pub fn json_key(self) -> String {
        self.name().replace('-', "_")
    }

    pub fn unit(self, state: &SimulationState) -> String {
        match self {
            Reading::CurrentBuildingTemperature | Reading::TemperatureReached => "°C".to_string(),
            Reading::BoilerOperatingPercentage => "%".to_string(),
            Reading::CurrentEnergyConsumption => "kWh".to_string(),
            Reading::CurrentBoilerHeatPower => "W".to_string(),
            Reading::CurrentFuelConsumption => {
                format!("{}/h", state.building().boiler().fuel().unit())
            }
            Reading::CurrentEnergyPrice => CURRENCY_PER_YEAR.to_string(),
        }
    }

    /// Value rounded to two decimals.
    pub fn value(self, state: &SimulationState) -> f64 {
        let building = state.building();
        let boiler = building.boiler();
        let raw = match self {
            Reading::CurrentBuildingTemperature => building.temperature_c(),
            Reading::TemperatureReached => building.temperature_reached(),
            Reading::BoilerOperatingPercentage => boiler.operating_percentage(),
            Reading::CurrentEnergyConsumption => building.energy_consumption_kwh(),
            Reading::CurrentBoilerHeatPower => boiler.current_power_w(),
            Reading::CurrentFuelConsumption => boiler.fuel_consumption(),
            Reading::CurrentEnergyPrice => boiler.annual_fuel_cost(),
        };
        round2(raw)
    }

    pub fn info(self, state: &SimulationState) -> ReadingInfo {
        ReadingInfo {
            name: self.name(),
            value: self.value(state),
            unit: self.unit(state),
        }
    }
}

impl std::str::FromStr for Reading {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Reading::iter()
            .find(|r| r.name() == normalized)
            .ok_or_else(|| SimulationError::invalid(format!("Unknown reading {s}")))
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
