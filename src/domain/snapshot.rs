use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State captured at the end of one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub tick: u64,
    /// Simulated time elapsed since start, in seconds.
    pub simulated_seconds: f64,
    pub building_temperature_c: f64,
    pub outside_temperature_c: f64,
    pub set_temperature_c: f64,
    pub operating_percentage: f64,
    pub timestamp: DateTime<Utc>,
}
