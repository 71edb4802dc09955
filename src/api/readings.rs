use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};

use super::error::ApiError;
use crate::controller::{AppState, Reading, ReadingInfo};

pub async fn list_readings(State(st): State<AppState>) -> Json<Vec<ReadingInfo>> {
    Json(st.controller.readings().await)
}

pub async fn get_reading(
    State(st): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let reading: Reading = name
        .parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown reading {name}")))?;
    let info = st.controller.reading(reading).await;
    Ok(Json(json!({ reading.json_key(): info.value, "unit": info.unit })))
}
