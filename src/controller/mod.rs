pub mod control_plane;
pub mod regulator;

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{SimulationResult, Snapshot};
use crate::forecast::{
    NominatimGeocoder, OpenMeteoClient, RefreshNeed, WeatherFeed, WeatherSource, WeatherStatus,
};
use crate::simulation::{Boiler, Building, BuildingConfig, SimulationState};

pub use control_plane::{
    Action, Parameter, ParameterInfo, ParameterValue, Reading, ReadingInfo, SetOutcome,
};
pub use regulator::Regulator;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Config,
    pub controller: Arc<SimulationController>,
}

impl AppState {
    pub async fn new(cfg: Config) -> Result<Self> {
        let source = if cfg.weather.enabled {
            let timeout = cfg.weather.http_timeout();
            Some(WeatherSource::new(
                Arc::new(NominatimGeocoder::new(cfg.weather.geocode_url.clone(), timeout)?),
                Arc::new(OpenMeteoClient::new(cfg.weather.forecast_url.clone(), timeout)?),
            ))
        } else {
            None
        };
        Self::with_weather_source(cfg, source).await
    }

    /// Builds the state with explicit weather collaborators; `None` runs without real weather.
    pub async fn with_weather_source(cfg: Config, source: Option<WeatherSource>) -> Result<Self> {
        let state = build_state(&cfg, source.as_ref()).await?;
        let controller = Arc::new(SimulationController::new(
            state,
            source,
            cfg.simulation.snapshot_channel_capacity,
        ));
        info!(
            run_id = %controller.run_id(),
            time_step = %cfg.simulation.time_step,
            "simulation state initialised"
        );
        Ok(Self { cfg, controller })
    }
}

async fn build_state(cfg: &Config, source: Option<&WeatherSource>) -> Result<SimulationState> {
    let boiler = Boiler::new(
        cfg.boiler.power_w,
        cfg.boiler.operating_percentage,
        cfg.boiler.fuel,
    )?;
    let mut building = Building::new(
        BuildingConfig {
            temperature_c: cfg.building.temperature_c,
            set_temperature_c: cfg.building.set_temperature_c,
            outside_temperature_c: cfg.building.outside_temperature_c,
            edge_m: cfg.building.edge_m,
            heat_transfer_coefficient: cfg.building.heat_transfer_coefficient,
            volume_heat_capacity: cfg.building.heat_capacity.capacity(),
        },
        boiler,
    )?;
    building.set_use_real_weather(cfg.building.use_real_weather);

    let regulator = Regulator::default().with_integral_limit(cfg.simulation.integral_limit);

    let address = cfg.weather.address.as_str();
    let weather = match source {
        Some(source) => match source.create_feed(address).await {
            Ok(feed) => feed,
            Err(e) => {
                warn!(address, error = %e, "weather location unavailable, real weather has no data");
                WeatherFeed::unavailable(address, Some(e))
            }
        },
        None => WeatherFeed::unavailable(address, None),
    };

    Ok(SimulationState::new(
        building,
        regulator,
        weather,
        cfg.simulation.time_step,
        cfg.simulation.history_capacity,
    ))
}

/// Handles of the background loops; dropping them leaves the loops running.
pub struct ControllerTasks {
    handles: Vec<JoinHandle<()>>,
}

impl ControllerTasks {
    /// Stops the loops. A tick never awaits while holding the lock, so it is
    /// never cut in half.
    pub fn shutdown(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

pub fn spawn_controller_tasks(state: &AppState) -> ControllerTasks {
    let mut handles = Vec::new();

    let controller = state.controller.clone();
    let period = state.cfg.simulation.tick_period();
    handles.push(tokio::spawn(async move {
        controller.run(period).await;
    }));

    if state.controller.has_weather_source() {
        let controller = state.controller.clone();
        let retry = state.cfg.weather.retry_period();
        let refresh_on_exhaustion = state.cfg.weather.refresh_on_exhaustion;
        handles.push(tokio::spawn(async move {
            controller.weather_refresh_loop(retry, refresh_on_exhaustion).await;
        }));
    }

    ControllerTasks { handles }
}

/// Owns the simulation state behind one lock. The tick loop and every
/// control-plane request go through it.
pub struct SimulationController {
    state: RwLock<SimulationState>,
    snapshots: broadcast::Sender<Snapshot>,
    weather_source: Option<WeatherSource>,
    run_id: Uuid,
    started_at: DateTime<Utc>,
}

impl SimulationController {
    pub fn new(
        state: SimulationState,
        weather_source: Option<WeatherSource>,
        channel_capacity: usize,
    ) -> Self {
        let (snapshots, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            state: RwLock::new(state),
            snapshots,
            weather_source,
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn has_weather_source(&self) -> bool {
        self.weather_source.is_some()
    }

    /// One simulation step under the write lock; the snapshot is published
    /// after the lock is released.
    pub async fn tick(&self) -> Snapshot {
        let snapshot = {
            let mut state = self.state.write().await;
            state.tick()
        };

        debug!(
            tick = snapshot.tick,
            building_temperature_c = snapshot.building_temperature_c,
            outside_temperature_c = snapshot.outside_temperature_c,
            set_temperature_c = snapshot.set_temperature_c,
            operating_percentage = snapshot.operating_percentage,
            "simulation tick"
        );

        // No subscribers is not an error.
        let _ = self.snapshots.send(snapshot.clone());
        snapshot
    }

    /// Ticks forever at `period`. Late ticks are caught up, never skipped.
    pub async fn run(&self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        info!(period_ms = period.as_millis() as u64, "simulation loop started");
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub async fn parameter(&self, parameter: Parameter) -> ParameterValue {
        parameter.get(&*self.state.read().await)
    }

    pub async fn parameter_info(&self, parameter: Parameter) -> ParameterInfo {
        parameter.info(&*self.state.read().await)
    }

    pub async fn parameters(&self) -> Vec<ParameterInfo> {
        use strum::IntoEnumIterator;
        let state = self.state.read().await;
        Parameter::iter().map(|p| p.info(&state)).collect()
    }

    /// Validates and applies one update atomically with respect to ticks and
    /// other requests. Rejections leave the state untouched.
    pub async fn update_parameter(
        &self,
        parameter: Parameter,
        action: Action,
        value: &serde_json::Value,
    ) -> SimulationResult<SetOutcome> {
        let result = {
            let mut state = self.state.write().await;
            parameter.update(&mut state, action, value)
        };
        log_update(parameter, &result);
        result
    }

    pub async fn set_parameter(
        &self,
        parameter: Parameter,
        value: ParameterValue,
    ) -> SimulationResult<SetOutcome> {
        let result = {
            let mut state = self.state.write().await;
            parameter.set(&mut state, value)
        };
        log_update(parameter, &result);
        result
    }

    pub async fn reading(&self, reading: Reading) -> ReadingInfo {
        reading.info(&*self.state.read().await)
    }

    pub async fn readings(&self) -> Vec<ReadingInfo> {
        use strum::IntoEnumIterator;
        let state = self.state.read().await;
        Reading::iter().map(|r| r.info(&state)).collect()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.state.read().await.snapshot()
    }

    /// Most recent `last` snapshots, oldest first; everything when `None`.
    pub async fn history(&self, last: Option<usize>) -> Vec<Snapshot> {
        let state = self.state.read().await;
        let history = state.history();
        history.tail(last.unwrap_or(history.len()))
    }

    pub async fn last_tick(&self) -> Option<Snapshot> {
        self.state.read().await.history().latest().cloned()
    }

    pub async fn weather_status(&self) -> WeatherStatus {
        self.state.read().await.weather().status()
    }

    /// Fetches whatever the weather feed is missing. Network calls happen
    /// outside the lock; results are installed under the write lock.
    ///
    /// Returns `Ok(true)` when a new forecast was installed.
    pub async fn refresh_weather(&self, refresh_on_exhaustion: bool) -> SimulationResult<bool> {
        let Some(source) = &self.weather_source else {
            return Ok(false);
        };
        let need = self
            .state
            .read()
            .await
            .weather()
            .refresh_need(refresh_on_exhaustion);

        let location = match need {
            None => return Ok(false),
            Some(RefreshNeed::Forecast(location)) => location,
            Some(RefreshNeed::Geocode(address)) => match source.geocoder.geocode(&address).await {
                Ok(location) => {
                    self.state
                        .write()
                        .await
                        .weather_mut()
                        .set_location(location.clone());
                    location
                }
                Err(e) => {
                    warn!(address, error = %e, "weather geocoding retry failed");
                    self.state.write().await.weather_mut().record_error(e.clone());
                    return Err(e);
                }
            },
        };

        match source.provider.hourly_forecast(&location).await {
            Ok(points) => {
                self.state
                    .write()
                    .await
                    .weather_mut()
                    .install_forecast(points, Utc::now());
                Ok(true)
            }
            Err(e) => {
                warn!(error = %e, "weather forecast refresh failed");
                self.state.write().await.weather_mut().record_error(e.clone());
                Err(e)
            }
        }
    }

    pub async fn weather_refresh_loop(&self, every: Duration, refresh_on_exhaustion: bool) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately and the feed was just created.
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(e) = self.refresh_weather(refresh_on_exhaustion).await {
                debug!(error = %e, "weather refresh attempt failed, will retry");
            }
        }
    }
}

fn log_update(parameter: Parameter, result: &SimulationResult<SetOutcome>) {
    match result {
        Ok(SetOutcome::Updated { previous, current }) => {
            info!(%parameter, %previous, %current, "parameter updated")
        }
        Ok(SetOutcome::Unchanged(value)) => debug!(%parameter, %value, "parameter already set"),
        Err(e) => debug!(%parameter, error = %e, "parameter update rejected"),
    }
}
