use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use validator::Validate;

use crate::domain::{Fuel, HeatCapacityVariant, TimeStep};
use crate::forecast::{DEFAULT_FORECAST_URL, DEFAULT_GEOCODE_URL};

pub const CONFIG_FILE: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "HEATSIM__";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub server: ServerConfig,
    pub auth: AuthConfig,
    #[validate(nested)]
    pub simulation: SimulationConfig,
    #[validate(nested)]
    pub boiler: BoilerConfig,
    #[validate(nested)]
    pub building: BuildingSettings,
    #[validate(nested)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[validate(range(min = 1))]
    pub request_timeout_secs: u64,
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
            enable_cors: false,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Empty token disables the bearer guard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    #[validate(range(min = 1))]
    pub tick_millis: u64,
    pub time_step: TimeStep,
    /// Absent keeps every snapshot.
    pub history_capacity: Option<usize>,
    /// Absent leaves the regulator's cumulative error unbounded.
    #[validate(range(min = 0.0))]
    pub integral_limit: Option<f64>,
    #[validate(range(min = 1))]
    pub snapshot_channel_capacity: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_millis: 1000,
            time_step: TimeStep::Hour,
            history_capacity: None,
            integral_limit: None,
            snapshot_channel_capacity: 64,
        }
    }
}

impl SimulationConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BoilerConfig {
    #[validate(range(min = 1000.0, max = 35000.0))]
    pub power_w: f64,
    #[validate(range(min = 0.0, max = 100.0))]
    pub operating_percentage: f64,
    pub fuel: Fuel,
}

impl Default for BoilerConfig {
    fn default() -> Self {
        Self {
            power_w: 30000.0,
            operating_percentage: 0.0,
            fuel: Fuel::Pellets,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BuildingSettings {
    pub temperature_c: f64,
    #[validate(range(min = -10.0, max = 40.0))]
    pub set_temperature_c: f64,
    #[validate(range(min = -50.0, max = 50.0))]
    pub outside_temperature_c: f64,
    #[validate(range(min = 1.0, max = 100.0))]
    pub edge_m: f64,
    #[validate(range(min = 0.1, max = 10.0))]
    pub heat_transfer_coefficient: f64,
    pub heat_capacity: HeatCapacityVariant,
    pub use_real_weather: bool,
}

impl Default for BuildingSettings {
    fn default() -> Self {
        Self {
            temperature_c: 15.0,
            set_temperature_c: 20.0,
            outside_temperature_c: 15.0,
            edge_m: 10.0,
            heat_transfer_coefficient: 0.2,
            heat_capacity: HeatCapacityVariant::House,
            use_real_weather: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct WeatherConfig {
    pub enabled: bool,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(url)]
    pub geocode_url: String,
    #[validate(url)]
    pub forecast_url: String,
    #[validate(range(min = 1))]
    pub http_timeout_secs: u64,
    #[validate(range(min = 1))]
    pub retry_secs: u64,
    pub refresh_on_exhaustion: bool,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "HEIA-FR, Fribourg".to_string(),
            geocode_url: DEFAULT_GEOCODE_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
            http_timeout_secs: 10,
            retry_secs: 300,
            refresh_on_exhaustion: false,
        }
    }
}

impl WeatherConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_secs)
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `HEATSIM__*` environment variables.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract().context("failed to load configuration")?;
        cfg.validate().context("invalid configuration")?;
        Ok(cfg)
    }
}
