//! # Thermal simulation
//!
//! Synchronous model of a single cubic building heated by one boiler.
//!
//! - **Boiler**: nominal power, operating percentage and fuel economics
//! - **Building**: lumped thermal mass with one heat-loss path to the outside
//! - **History**: snapshots appended once per tick
//! - **SimulationState**: the tick itself (weather, regulator, temperature update)
//!
//! Nothing in here locks or awaits; the controller owns the state behind one
//! `RwLock` and calls [`SimulationState::tick`] on its own schedule.

pub mod boiler;
pub mod engine;
pub mod history;
pub mod thermal;

pub use boiler::Boiler;
pub use engine::SimulationState;
pub use history::History;
pub use thermal::{Building, BuildingConfig};
