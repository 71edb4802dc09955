use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, IntoEnumIterator};

use super::error::SimulationError;

// ============================================================================
// Fuel
// ============================================================================

/// Boiler fuel. Each fuel carries a fixed calorific value and a fixed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum Fuel {
    Mazout,
    Gas,
    Wood,
    Pellets,
    Electricity,
}

impl Fuel {
    /// Calorific value in kWh per physical unit of fuel (kg, m³ or kWh).
    pub fn calorific_value_kwh(&self) -> f64 {
        match self {
            Fuel::Mazout => 11.9,
            Fuel::Gas => 10.0,
            Fuel::Wood => 3.9,
            Fuel::Pellets => 4.8,
            Fuel::Electricity => 1.0,
        }
    }

    /// Price in cents per kWh.
    pub fn price_cents_per_kwh(&self) -> f64 {
        match self {
            Fuel::Mazout => 10.14,
            Fuel::Gas => 16.86,
            Fuel::Wood => 13.5,
            Fuel::Pellets => 10.07,
            Fuel::Electricity => 23.43,
        }
    }

    /// Physical unit the fuel is measured in.
    pub fn unit(&self) -> &'static str {
        match self {
            Fuel::Gas => "m³",
            Fuel::Electricity => "kWh",
            Fuel::Mazout | Fuel::Wood | Fuel::Pellets => "kg",
        }
    }

    pub fn names() -> Vec<String> {
        Fuel::iter().map(|f| f.to_string()).collect()
    }
}

impl std::str::FromStr for Fuel {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mazout" => Ok(Fuel::Mazout),
            "gas" => Ok(Fuel::Gas),
            "wood" => Ok(Fuel::Wood),
            "pellets" => Ok(Fuel::Pellets),
            "electricity" => Ok(Fuel::Electricity),
            _ => Err(SimulationError::invalid(format!(
                "Fuel type {} not recognized",
                s
            ))),
        }
    }
}

impl fmt::Display for Fuel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fuel::Mazout => write!(f, "mazout"),
            Fuel::Gas => write!(f, "gas"),
            Fuel::Wood => write!(f, "wood"),
            Fuel::Pellets => write!(f, "pellets"),
            Fuel::Electricity => write!(f, "electricity"),
        }
    }
}

// ============================================================================
// Volumetric heat capacity presets
// ============================================================================

/// Named presets for the building's volumetric heat capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum HeatCapacityVariant {
    Air,
    Water,
    House,
}

impl HeatCapacityVariant {
    /// Capacity constant in J/m³K.
    pub fn capacity(&self) -> f64 {
        match self {
            HeatCapacityVariant::Air => 1.0,
            HeatCapacityVariant::Water => 4180.0,
            HeatCapacityVariant::House => 200.0,
        }
    }

    /// Reverse lookup: the preset whose constant equals `capacity` exactly.
    pub fn from_capacity(capacity: f64) -> Option<Self> {
        HeatCapacityVariant::iter().find(|v| v.capacity() == capacity)
    }
}

impl std::str::FromStr for HeatCapacityVariant {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "air" => Ok(HeatCapacityVariant::Air),
            "water" => Ok(HeatCapacityVariant::Water),
            "house" => Ok(HeatCapacityVariant::House),
            _ => Err(SimulationError::invalid(format!(
                "Heat capacity variant {} not recognized",
                s
            ))),
        }
    }
}

impl fmt::Display for HeatCapacityVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeatCapacityVariant::Air => write!(f, "air"),
            HeatCapacityVariant::Water => write!(f, "water"),
            HeatCapacityVariant::House => write!(f, "house"),
        }
    }
}

// ============================================================================
// Time step
// ============================================================================

/// Simulated time advanced by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum TimeStep {
    Minute,
    Hour,
}

impl TimeStep {
    pub fn seconds(&self) -> f64 {
        match self {
            TimeStep::Minute => 60.0,
            TimeStep::Hour => 3600.0,
        }
    }
}

impl Default for TimeStep {
    fn default() -> Self {
        TimeStep::Hour
    }
}

impl std::str::FromStr for TimeStep {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "minute" => Ok(TimeStep::Minute),
            "hour" => Ok(TimeStep::Hour),
            _ => Err(SimulationError::invalid(format!(
                "Time step {} not recognized",
                s
            ))),
        }
    }
}

impl fmt::Display for TimeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeStep::Minute => write!(f, "minute"),
            TimeStep::Hour => write!(f, "hour"),
        }
    }
}
