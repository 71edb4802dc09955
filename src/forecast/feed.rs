use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::weather::{ForecastPoint, ForecastProvider, GeoLocation, Geocoder};
use crate::domain::{SimulationError, SimulationResult};

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Outdoor-temperature disturbance driven by a fetched hourly forecast.
///
/// The forecast is fetched once and indexed cyclically: once the cursor passes
/// the last entry it wraps to the first one and keeps replaying the same data
/// until a new forecast is installed.
#[derive(Debug, Clone)]
pub struct WeatherFeed {
    address: String,
    location: Option<GeoLocation>,
    forecast: Vec<ForecastPoint>,
    index: usize,
    elapsed_in_hour: f64,
    hours_advanced: u64,
    wrapped: bool,
    fetched_at: Option<DateTime<Utc>>,
    last_error: Option<SimulationError>,
}

/// Work the refresher has to do for the feed, decided under the lock.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshNeed {
    Geocode(String),
    Forecast(GeoLocation),
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherStatus {
    pub address: String,
    pub location: Option<GeoLocation>,
    pub available: bool,
    pub forecast_hours: usize,
    pub index: usize,
    pub elapsed_in_hour_s: f64,
    pub hours_advanced: u64,
    pub wrapped: bool,
    pub current_temperature_c: Option<f64>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl WeatherFeed {
    /// Geocodes `address` then fetches one forecast.
    ///
    /// Geocoding failures are returned. A failed forecast fetch is not: the feed
    /// is returned without data and `advance` yields nothing until a forecast is
    /// installed.
    pub async fn create(
        address: &str,
        geocoder: &dyn Geocoder,
        provider: &dyn ForecastProvider,
    ) -> SimulationResult<Self> {
        let location = geocoder.geocode(address).await?;
        let mut feed = Self::located(address, location.clone());

        match provider.hourly_forecast(&location).await {
            Ok(points) => feed.install_forecast(points, Utc::now()),
            Err(e) => {
                warn!(address, error = %e, "forecast fetch failed, real weather unavailable for now");
                feed.last_error = Some(e);
            }
        }
        Ok(feed)
    }

    fn located(address: &str, location: GeoLocation) -> Self {
        Self {
            location: Some(location),
            ..Self::unavailable(address, None)
        }
    }

    /// Feed without a location, e.g. when geocoding failed at startup.
    pub fn unavailable(address: &str, error: Option<SimulationError>) -> Self {
        Self {
            address: address.to_string(),
            location: None,
            forecast: Vec::new(),
            index: 0,
            elapsed_in_hour: 0.0,
            hours_advanced: 0,
            wrapped: false,
            fetched_at: None,
            last_error: error,
        }
    }

    /// Feed over a fixed forecast.
    pub fn from_forecast(address: &str, location: GeoLocation, points: Vec<ForecastPoint>) -> Self {
        let mut feed = Self::located(address, location);
        feed.install_forecast(points, Utc::now());
        feed
    }

    /// Replaces the forecast and rewinds the cursor.
    pub fn install_forecast(&mut self, points: Vec<ForecastPoint>, fetched_at: DateTime<Utc>) {
        info!(address = %self.address, hours = points.len(), "installing forecast");
        self.forecast = points;
        self.index = 0;
        self.elapsed_in_hour = 0.0;
        self.wrapped = false;
        self.fetched_at = Some(fetched_at);
        self.last_error = None;
    }

    pub fn set_location(&mut self, location: GeoLocation) {
        self.location = Some(location);
        self.last_error = None;
    }

    pub fn record_error(&mut self, error: SimulationError) {
        self.last_error = Some(error);
    }

    pub fn is_available(&self) -> bool {
        !self.forecast.is_empty()
    }

    pub fn location(&self) -> Option<&GeoLocation> {
        self.location.as_ref()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn hours_advanced(&self) -> u64 {
        self.hours_advanced
    }

    pub fn wrapped(&self) -> bool {
        self.wrapped
    }

    pub fn current_temperature(&self) -> Option<f64> {
        self.forecast.get(self.index).map(|p| p.temperature_c)
    }

    /// Accumulates simulated time; every full hour moves the cursor one entry,
    /// wrapping at the end. Returns the temperature under the cursor.
    pub fn advance(&mut self, elapsed_seconds: f64) -> Option<f64> {
        if self.forecast.is_empty() {
            return None;
        }

        self.elapsed_in_hour += elapsed_seconds;
        if self.elapsed_in_hour >= SECONDS_PER_HOUR {
            self.elapsed_in_hour = 0.0;
            self.index = (self.index + 1) % self.forecast.len();
            self.hours_advanced += 1;
            if self.index == 0 {
                self.wrapped = true;
            }
        }
        self.current_temperature()
    }

    /// What, if anything, the background refresher should fetch.
    ///
    /// A missing location is only retried when the last geocode failed for
    /// transport reasons; an address with no match stays unresolved.
    pub fn refresh_need(&self, refresh_on_exhaustion: bool) -> Option<RefreshNeed> {
        match &self.location {
            None => match self.last_error {
                Some(SimulationError::LocationNotFound(_)) => None,
                _ => Some(RefreshNeed::Geocode(self.address.clone())),
            },
            Some(location) => {
                if self.forecast.is_empty() || (refresh_on_exhaustion && self.wrapped) {
                    Some(RefreshNeed::Forecast(location.clone()))
                } else {
                    None
                }
            }
        }
    }

    pub fn status(&self) -> WeatherStatus {
        WeatherStatus {
            address: self.address.clone(),
            location: self.location.clone(),
            available: self.is_available(),
            forecast_hours: self.forecast.len(),
            index: self.index,
            elapsed_in_hour_s: self.elapsed_in_hour,
            hours_advanced: self.hours_advanced,
            wrapped: self.wrapped,
            current_temperature_c: self.current_temperature(),
            fetched_at: self.fetched_at,
            last_error: self.last_error.as_ref().map(|e| e.to_string()),
        }
    }
}

/// The two weather collaborators bundled for the background refresher.
#[derive(Clone)]
pub struct WeatherSource {
    pub geocoder: Arc<dyn Geocoder>,
    pub provider: Arc<dyn ForecastProvider>,
}

impl WeatherSource {
    pub fn new(geocoder: Arc<dyn Geocoder>, provider: Arc<dyn ForecastProvider>) -> Self {
        Self { geocoder, provider }
    }

    pub async fn create_feed(&self, address: &str) -> SimulationResult<WeatherFeed> {
        WeatherFeed::create(address, self.geocoder.as_ref(), self.provider.as_ref()).await
    }
}
