use chrono::Utc;

use super::history::History;
use super::thermal::Building;
use crate::controller::Regulator;
use crate::domain::{Snapshot, TimeStep};
use crate::forecast::WeatherFeed;

/// Everything one tick reads or writes. Owned by a single lock in the controller.
#[derive(Debug, Clone)]
pub struct SimulationState {
    building: Building,
    regulator: Regulator,
    weather: WeatherFeed,
    time_step: TimeStep,
    history: History,
    tick: u64,
    simulated_seconds: f64,
}

impl SimulationState {
    pub fn new(
        building: Building,
        regulator: Regulator,
        weather: WeatherFeed,
        time_step: TimeStep,
        history_capacity: Option<usize>,
    ) -> Self {
        Self {
            building,
            regulator,
            weather,
            time_step,
            history: History::new(history_capacity),
            tick: 0,
            simulated_seconds: 0.0,
        }
    }

    /// Advances the simulation by one time step and records the result.
    ///
    /// Order: weather → regulator → building temperature → history.
    pub fn tick(&mut self) -> Snapshot {
        let step = self.time_step;

        if self.building.use_real_weather() {
            if let Some(temperature) = self.weather.advance(step.seconds()) {
                self.building.apply_weather(temperature);
            }
        }

        self.regulator.regulate(&mut self.building);
        self.building.update_temperature(step);

        self.tick += 1;
        self.simulated_seconds += step.seconds();

        let snapshot = self.snapshot();
        self.history.push(snapshot.clone());
        snapshot
    }

    /// Consistent view of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick,
            simulated_seconds: self.simulated_seconds,
            building_temperature_c: self.building.temperature_c(),
            outside_temperature_c: self.building.outside_temperature_c(),
            set_temperature_c: self.building.set_temperature_c(),
            operating_percentage: self.building.boiler().operating_percentage(),
            timestamp: Utc::now(),
        }
    }

    pub fn building(&self) -> &Building {
        &self.building
    }

    pub fn building_mut(&mut self) -> &mut Building {
        &mut self.building
    }

    pub fn regulator(&self) -> &Regulator {
        &self.regulator
    }

    pub fn weather(&self) -> &WeatherFeed {
        &self.weather
    }

    pub fn weather_mut(&mut self) -> &mut WeatherFeed {
        &mut self.weather
    }

    pub fn time_step(&self) -> TimeStep {
        self.time_step
    }

    pub fn set_time_step(&mut self, step: TimeStep) {
        self.time_step = step;
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Fuel;
    use crate::forecast::{ForecastPoint, GeoLocation};
    use crate::simulation::{Boiler, BuildingConfig};
    use chrono::NaiveDate;

    fn state(feed: WeatherFeed) -> SimulationState {
        let boiler = Boiler::new(30000.0, 50.0, Fuel::Gas).unwrap();
        let building = Building::new(
            BuildingConfig {
                temperature_c: 20.0,
                set_temperature_c: 24.0,
                outside_temperature_c: 10.0,
                edge_m: 10.0,
                heat_transfer_coefficient: 10.0,
                volume_heat_capacity: 200.0,
            },
            boiler,
        )
        .unwrap();
        SimulationState::new(building, Regulator::default(), feed, TimeStep::Hour, Some(10))
    }

    fn forecast_feed(temps: &[f64]) -> WeatherFeed {
        let start = NaiveDate::from_ymd_opt(2023, 7, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let points = temps
            .iter()
            .enumerate()
            .map(|(i, t)| ForecastPoint {
                time: start + chrono::Duration::hours(i as i64),
                temperature_c: *t,
            })
            .collect();
        let location = GeoLocation {
            latitude: 46.8,
            longitude: 7.15,
            name: None,
        };
        WeatherFeed::from_forecast("Fribourg", location, points)
    }

    #[test]
    fn test_tick_records_snapshot() {
        let mut sim = state(WeatherFeed::unavailable("Fribourg", None));
        let snapshot = sim.tick();

        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.simulated_seconds, 3600.0);
        assert_eq!(snapshot.set_temperature_c, 24.0);
        assert_eq!(snapshot.outside_temperature_c, 10.0);
        assert!(snapshot.operating_percentage > 50.0);
        assert_eq!(sim.history().latest(), Some(&snapshot));
    }

    #[test]
    fn test_manual_outside_temperature_when_real_weather_off() {
        let mut sim = state(forecast_feed(&[-5.0, -6.0]));
        sim.tick();
        assert_eq!(sim.building().outside_temperature_c(), 10.0);
        assert_eq!(sim.weather().hours_advanced(), 0);
    }

    #[test]
    fn test_real_weather_drives_outside_temperature() {
        let mut sim = state(forecast_feed(&[-5.0, -6.0]));
        sim.building_mut().set_use_real_weather(true);

        let first = sim.tick();
        assert_eq!(first.outside_temperature_c, -6.0);
        let second = sim.tick();
        assert_eq!(second.outside_temperature_c, -5.0);
    }

    #[test]
    fn test_real_weather_without_forecast_keeps_last_value() {
        let mut sim = state(WeatherFeed::unavailable("Fribourg", None));
        sim.building_mut().set_use_real_weather(true);
        let snapshot = sim.tick();
        assert_eq!(snapshot.outside_temperature_c, 10.0);
    }

    #[test]
    fn test_history_is_bounded_by_capacity() {
        let mut sim = state(WeatherFeed::unavailable("Fribourg", None));
        for _ in 0..25 {
            sim.tick();
        }
        assert_eq!(sim.history().len(), 10);
        assert_eq!(sim.history().latest().map(|s| s.tick), Some(25));
        assert_eq!(sim.tick_count(), 25);
    }

    #[test]
    fn test_time_step_switch() {
        let mut sim = state(WeatherFeed::unavailable("Fribourg", None));
        sim.set_time_step(TimeStep::Minute);
        let snapshot = sim.tick();
        assert_eq!(snapshot.simulated_seconds, 60.0);
    }

    #[test]
    fn test_building_warms_toward_set_point() {
        let mut sim = state(WeatherFeed::unavailable("Fribourg", None));
        sim.building_mut().update_heat_transfer_coefficient(0.2).unwrap();
        let start = sim.building().temperature_c();
        for _ in 0..5 {
            sim.tick();
        }
        assert!(sim.building().temperature_c() > start);
    }
}
