//! Weather collaborators: address geocoding (Nominatim) and hourly outdoor
//! temperature forecasts (Open-Meteo).
//!
//! Both are consumed behind narrow traits so the simulation only depends on
//! "address → coordinates" and "coordinates → hourly temperatures".

use async_trait::async_trait;
use chrono::NaiveDateTime;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::domain::{SimulationError, SimulationResult};

pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

const OPEN_METEO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Geographic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
}

/// One hourly forecast entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub time: NaiveDateTime,
    pub temperature_c: f64,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> SimulationResult<GeoLocation>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn hourly_forecast(&self, location: &GeoLocation) -> SimulationResult<Vec<ForecastPoint>>;
}

fn http_client(timeout: Duration) -> SimulationResult<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("heating-simulator/", env!("CARGO_PKG_VERSION"))),
    );
    Client::builder()
        .timeout(timeout)
        .default_headers(headers)
        .build()
        .map_err(upstream)
}

fn upstream(err: reqwest::Error) -> SimulationError {
    SimulationError::UpstreamUnavailable(err.to_string())
}

/// Nominatim (OpenStreetMap) geocoding client
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SimulationResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> SimulationResult<GeoLocation> {
        debug!(address, "geocoding address");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", address), ("format", "json")])
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "geocoder returned error status");
            return Err(SimulationError::UpstreamUnavailable(format!(
                "geocoder HTTP {status}"
            )));
        }

        let places: Vec<NominatimPlace> = response.json().await.map_err(upstream)?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| SimulationError::LocationNotFound(address.to_string()))?;

        let parse = |v: &str| {
            v.parse::<f64>().map_err(|e| {
                SimulationError::UpstreamUnavailable(format!("geocoder returned bad coordinate {v}: {e}"))
            })
        };
        let location = GeoLocation {
            latitude: parse(&place.lat)?,
            longitude: parse(&place.lon)?,
            name: place.display_name.or_else(|| Some(address.to_string())),
        };

        info!(
            latitude = location.latitude,
            longitude = location.longitude,
            "geocoded address"
        );
        Ok(location)
    }
}

/// Open-Meteo hourly forecast client
#[derive(Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SimulationResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.into(),
        })
    }

    fn parse_forecast(response: OpenMeteoResponse) -> SimulationResult<Vec<ForecastPoint>> {
        let points: Vec<ForecastPoint> = response
            .hourly
            .time
            .iter()
            .zip(response.hourly.temperature_2m)
            .filter_map(|(time, temperature)| {
                let temperature_c = temperature?;
                match NaiveDateTime::parse_from_str(time, OPEN_METEO_TIME_FORMAT) {
                    Ok(time) => Some(ForecastPoint { time, temperature_c }),
                    Err(e) => {
                        warn!(time, error = %e, "skipping forecast entry with bad timestamp");
                        None
                    }
                }
            })
            .collect();

        if points.is_empty() {
            return Err(SimulationError::UpstreamUnavailable(
                "forecast contained no hourly temperatures".to_string(),
            ));
        }
        Ok(points)
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoClient {
    async fn hourly_forecast(&self, location: &GeoLocation) -> SimulationResult<Vec<ForecastPoint>> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", location.latitude.to_string()),
                ("longitude", location.longitude.to_string()),
                ("hourly", "temperature_2m".to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await
            .map_err(upstream)?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "forecast API returned error status");
            return Err(SimulationError::UpstreamUnavailable(format!(
                "forecast HTTP {status}"
            )));
        }

        let body: OpenMeteoResponse = response.json().await.map_err(upstream)?;
        let points = Self::parse_forecast(body)?;

        info!(
            latitude = location.latitude,
            longitude = location.longitude,
            hours = points.len(),
            "fetched hourly forecast"
        );
        Ok(points)
    }
}

// Nominatim response structures
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

// Open-Meteo response structures
#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    hourly: OpenMeteoHourly,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
}
