use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::controller::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ticks: u64,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_tick_age_ms: Option<i64>,
    pub weather_available: bool,
}

/// Liveness; unauthenticated.
pub async fn healthz(State(st): State<AppState>) -> Json<HealthResponse> {
    let last = st.controller.last_tick().await;
    let weather = st.controller.weather_status().await;
    let now = Utc::now();

    Json(HealthResponse {
        status: "ok",
        run_id: st.controller.run_id(),
        started_at: st.controller.started_at(),
        ticks: last.as_ref().map(|s| s.tick).unwrap_or(0),
        last_tick_at: last.as_ref().map(|s| s.timestamp),
        last_tick_age_ms: last.map(|s| (now - s.timestamp).num_milliseconds()),
        weather_available: weather.available,
    })
}
