use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::controller::AppState;
use crate::domain::Snapshot;
use crate::forecast::WeatherStatus;

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub last: Option<usize>,
}

pub async fn get_snapshot(State(st): State<AppState>) -> Json<Snapshot> {
    Json(st.controller.snapshot().await)
}

pub async fn get_history(
    State(st): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Json<Vec<Snapshot>> {
    Json(st.controller.history(q.last).await)
}

pub async fn get_weather(State(st): State<AppState>) -> Json<WeatherStatus> {
    Json(st.controller.weather_status().await)
}
