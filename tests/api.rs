//! HTTP round-trips through the full router.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use heating_simulator::api;
use heating_simulator::config::Config;
use heating_simulator::controller::AppState;

async fn app_with(cfg: Config) -> (Router, AppState) {
    let state = AppState::with_weather_source(cfg.clone(), None)
        .await
        .expect("state builds");
    (api::router(state.clone(), &cfg), state)
}

async fn app() -> (Router, AppState) {
    app_with(Config::default()).await
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_boiler_power_round_trip() {
    let (app, _) = app().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/parameters/boiler-power",
        Some(json!({ "value": 5000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Boiler power successfully set to 5000 W");

    let (status, body) = send(&app, Method::GET, "/api/v1/parameters/boiler-power", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "boiler_power": 5000.0 }));
}

#[tokio::test]
async fn test_out_of_range_is_rejected_without_mutation() {
    let (app, _) = app().await;

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/parameters/boiler-power",
        Some(json!({ "value": 500 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "OutOfRange");
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("between 1000 and 35000 W"));

    let (_, body) = send(&app, Method::GET, "/api/v1/parameters/boiler-power", None).await;
    assert_eq!(body, json!({ "boiler_power": 30000.0 }));
}

#[tokio::test]
async fn test_increase_and_decrease_actions() {
    let (app, _) = app().await;

    send(
        &app,
        Method::PUT,
        "/api/v1/parameters/set-temperature",
        Some(json!({ "action": "increase", "value": 2 })),
    )
    .await;
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/parameters/set-temperature",
        Some(json!({ "action": "decrease", "value": -5 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["set_temperature"], 17.0);
}

#[tokio::test]
async fn test_outside_temperature_locked_by_real_weather() {
    let (app, _) = app().await;

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/v1/parameters/use-real-weather",
        Some(json!({ "value": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/parameters/outside-temperature",
        Some(json!({ "value": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Rejected");
}

#[tokio::test]
async fn test_enum_write_already_set() {
    let (app, _) = app().await;
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/parameters/boiler-fuel",
        Some(json!({ "value": "pellets" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Boiler fuel already set to pellets");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/parameters/boiler-fuel",
        Some(json!({ "value": "uranium" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn test_unknown_names_are_not_found() {
    let (app, _) = app().await;
    let (status, _) = send(&app, Method::GET, "/api/v1/parameters/roof-colour", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, "/api/v1/readings/solar-gain", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let (app, _) = app().await;
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/v1/parameters/boiler-power",
        Some(json!({ "amount": 5000 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadRequest");
}

#[tokio::test]
async fn test_listing_parameters_and_readings() {
    let (app, _) = app().await;

    let (status, body) = send(&app, Method::GET, "/api/v1/parameters", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"volume-heat-capacity-variant"));
    assert!(names.contains(&"time-step"));

    let (status, body) = send(&app, Method::GET, "/api/v1/readings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 7);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/readings/current-building-temperature",
        None,
    )
    .await;
    assert_eq!(body["current_building_temperature"], 15.0);
    assert_eq!(body["unit"], "°C");
}

#[tokio::test]
async fn test_snapshot_and_history_follow_ticks() {
    let (app, state) = app().await;
    for _ in 0..3 {
        state.controller.tick().await;
    }

    let (_, snapshot) = send(&app, Method::GET, "/api/v1/snapshot", None).await;
    assert_eq!(snapshot["tick"], 3);
    assert_eq!(snapshot["simulated_seconds"], 10800.0);

    let (_, history) = send(&app, Method::GET, "/api/v1/history?last=2", None).await;
    let ticks: Vec<u64> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["tick"].as_u64().unwrap())
        .collect();
    assert_eq!(ticks, vec![2, 3]);
}

#[tokio::test]
async fn test_weather_status_without_source() {
    let (app, _) = app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/weather", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], false);
    assert_eq!(body["address"], "HEIA-FR, Fribourg");
}

#[tokio::test]
async fn test_bearer_token_guard() {
    let mut cfg = Config::default();
    cfg.auth.token = "s3cret".to_string();
    let (app, _) = app_with(cfg).await;

    let (status, body) = send(&app, Method::GET, "/api/v1/parameters", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/parameters/boiler-power")
                .header(header::AUTHORIZATION, "Bearer s3cret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/v1/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
