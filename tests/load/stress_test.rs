#![cfg(test)]
//! Concurrency suite for the simulation controller.
//!
//! Control-plane writers, readers and the tick all contend for the same
//! lock. These tests check that:
//! - every committed write is visible afterwards (no lost writes)
//! - read-modify-write adjustments are atomic
//! - snapshots are published in tick order without gaps
//! - ticks keep their cadence while the API is hammered

use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinSet;

use heating_simulator::config::Config;
use heating_simulator::controller::{
    Action, AppState, Parameter, ParameterValue, SimulationController,
};

async fn build_test_controller() -> Arc<SimulationController> {
    AppState::with_weather_source(Config::default(), None)
        .await
        .expect("offline state builds")
        .controller
}

/// Writers own one field each; ticks run between them.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_interleaved_with_ticks() {
    let controller = build_test_controller().await;

    let fields: Vec<(Parameter, Vec<f64>)> = vec![
        (Parameter::SetTemperature, (0..50).map(|i| -10.0 + i as f64).collect()),
        (Parameter::BuildingEdge, (0..50).map(|i| 1.0 + i as f64).collect()),
        (
            Parameter::HeatTransferCoefficient,
            (0..50).map(|i| 0.1 + i as f64 * 0.1).collect(),
        ),
        (Parameter::BoilerPower, (0..50).map(|i| 1000.0 + i as f64 * 500.0).collect()),
        (Parameter::VolumeHeatCapacity, (0..50).map(|i| 1.0 + i as f64 * 50.0).collect()),
    ];

    let mut tasks = JoinSet::new();

    let ticker = Arc::clone(&controller);
    tasks.spawn(async move {
        for _ in 0..200 {
            ticker.tick().await;
            tokio::task::yield_now().await;
        }
    });

    for (parameter, values) in fields.clone() {
        let ctrl = Arc::clone(&controller);
        tasks.spawn(async move {
            for value in values {
                ctrl.update_parameter(parameter, Action::Set, &json!(value))
                    .await
                    .expect("in-range write accepted");
                tokio::task::yield_now().await;
            }
        });
    }

    while let Some(result) = tasks.join_next().await {
        result.expect("task should complete successfully");
    }

    for (parameter, values) in fields {
        let last = *values.last().unwrap();
        assert_eq!(
            controller.parameter(parameter).await,
            ParameterValue::Number(last),
            "last write to {parameter} must win"
        );
    }
    assert_eq!(controller.snapshot().await.tick, 200);
}

/// Concurrent `increase` requests must not lose updates.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_atomic() {
    let controller = build_test_controller().await;
    controller
        .update_parameter(Parameter::SetTemperature, Action::Set, &json!(0.0))
        .await
        .unwrap();

    let mut tasks = JoinSet::new();
    for _ in 0..40 {
        let ctrl = Arc::clone(&controller);
        tasks.spawn(async move {
            ctrl.update_parameter(Parameter::SetTemperature, Action::Increase, &json!(0.25))
                .await
                .unwrap();
            ctrl.tick().await;
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    assert_eq!(
        controller.parameter(Parameter::SetTemperature).await,
        ParameterValue::Number(10.0)
    );
}

/// Subscribers see every tick exactly once and in order, even while
/// writers are active.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_snapshot_stream_is_ordered_and_complete() {
    let controller = build_test_controller().await;
    let mut rx = controller.subscribe();
    const TICKS: u64 = 50;

    let writer = {
        let ctrl = Arc::clone(&controller);
        tokio::spawn(async move {
            for i in 0..TICKS {
                let value = if i % 2 == 0 { 18.0 } else { 22.0 };
                ctrl.update_parameter(Parameter::SetTemperature, Action::Set, &json!(value))
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let ticker = {
        let ctrl = Arc::clone(&controller);
        tokio::spawn(async move {
            for _ in 0..TICKS {
                ctrl.tick().await;
            }
        })
    };

    let mut seen = Vec::new();
    while seen.len() < TICKS as usize {
        let snapshot = rx.recv().await.expect("channel holds every tick");
        assert!(
            [20.0, 18.0, 22.0].contains(&snapshot.set_temperature_c),
            "snapshot carries a value that was never written: {}",
            snapshot.set_temperature_c
        );
        seen.push(snapshot.tick);
    }

    writer.await.unwrap();
    ticker.await.unwrap();
    assert_eq!(seen, (1..=TICKS).collect::<Vec<_>>());
}

/// Rejected writes racing with valid ones never leak into the state.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rejected_writes_under_contention() {
    let controller = build_test_controller().await;

    let mut tasks = JoinSet::new();
    for i in 0..20 {
        let ctrl = Arc::clone(&controller);
        tasks.spawn(async move {
            let value = if i % 2 == 0 { 500.0 } else { 40000.0 };
            assert!(ctrl
                .update_parameter(Parameter::BoilerPower, Action::Set, &json!(value))
                .await
                .is_err());
            ctrl.tick().await;
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap();
    }

    assert_eq!(
        controller.parameter(Parameter::BoilerPower).await,
        ParameterValue::Number(30000.0)
    );
}

/// Tick latency while 50 clients poll and write.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Ignore by default as this is a slow test
async fn test_tick_latency_under_api_load() {
    let controller = build_test_controller().await;
    let latencies = Arc::new(RwLock::new(Vec::new()));

    let ticker = {
        let ctrl = Arc::clone(&controller);
        let latencies = Arc::clone(&latencies);
        tokio::spawn(async move {
            for _ in 0..20 {
                let start = Instant::now();
                ctrl.tick().await;
                latencies.write().await.push(start.elapsed());
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        })
    };

    let mut clients = JoinSet::new();
    for i in 0..50 {
        let ctrl = Arc::clone(&controller);
        clients.spawn(async move {
            for j in 0..10 {
                let _ = ctrl.readings().await;
                let _ = ctrl.parameters().await;
                let _ = ctrl.history(Some(10)).await;
                let _ = ctrl
                    .update_parameter(Parameter::SetTemperature, Action::Set, &json!(15 + j))
                    .await;
                tokio::time::sleep(Duration::from_millis(50 + (i % 20) as u64)).await;
            }
        });
    }

    while clients.join_next().await.is_some() {}
    ticker.await.unwrap();

    let latencies = latencies.read().await;
    let max = latencies.iter().max().unwrap();
    println!("tick latency max: {max:?}");
    assert!(*max < Duration::from_millis(500), "tick latency {max:?}");
}
