use axum::{middleware, routing::get, Router};
use tracing::warn;

use super::{health, parameters, readings, status, stream};
use crate::{
    auth::{require_bearer, AuthConfig},
    config::Config,
    controller::AppState,
};

pub fn router(state: AppState, cfg: &Config) -> Router {
    let auth = AuthConfig::new(&cfg.auth.token);
    if !auth.is_enabled() {
        warn!("auth token is empty, control plane is unauthenticated");
    }

    Router::new()
        .route("/parameters", get(parameters::list_parameters))
        .route(
            "/parameters/:name",
            get(parameters::get_parameter).put(parameters::update_parameter),
        )
        .route("/readings", get(readings::list_readings))
        .route("/readings/:name", get(readings::get_reading))
        .route("/snapshot", get(status::get_snapshot))
        .route("/history", get(status::get_history))
        .route("/weather", get(status::get_weather))
        .route("/stream", get(stream::stream_snapshots))
        .route_layer(middleware::from_fn_with_state(auth, require_bearer))
        .route("/healthz", get(health::healthz))
        .with_state(state)
}
