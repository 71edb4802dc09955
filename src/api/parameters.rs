use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::error::ApiError;
use crate::controller::{Action, AppState, Parameter, ParameterInfo};

/// `{"value": v}` or `{"action": "increase", "value": v}`.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub action: Action,
    pub value: Value,
}

fn parse_name(name: &str) -> Result<Parameter, ApiError> {
    name.parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown parameter {name}")))
}

pub async fn list_parameters(State(st): State<AppState>) -> Json<Vec<ParameterInfo>> {
    Json(st.controller.parameters().await)
}

pub async fn get_parameter(
    State(st): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let parameter = parse_name(&name)?;
    let value = st.controller.parameter(parameter).await;
    Ok(Json(json!({ parameter.json_key(): value })))
}

pub async fn update_parameter(
    State(st): State<AppState>,
    Path(name): Path<String>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let parameter = parse_name(&name)?;
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = st
        .controller
        .update_parameter(parameter, request.action, &request.value)
        .await?;
    let current = st.controller.parameter(parameter).await;

    Ok(Json(json!({
        "message": outcome.message(parameter),
        parameter.json_key(): current,
    })))
}
