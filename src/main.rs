use anyhow::Result;
use heating_simulator::{api, config, controller, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cfg = Config::load()?;

    let app_state = controller::AppState::new(cfg.clone()).await?;
    let app = api::router(app_state.clone(), &cfg);

    let addr = cfg.server.socket_addr()?;

    if cfg.server.host == "0.0.0.0" && cfg.auth.token.is_empty() {
        warn!("server binds to 0.0.0.0 without an auth token, anyone on the network can change parameters");
    }

    info!(%addr, run_id = %app_state.controller.run_id(), "starting heating simulator");

    let tasks = controller::spawn_controller_tasks(&app_state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    tasks.shutdown();
    warn!("shutdown complete");
    Ok(())
}
