use anyhow::Result;
use grid_optimizer::{api, config, controller, telemetry};
use config::Config;
use telemetry::init_tracing;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::load()?;
    init_tracing(&cfg.log);

    let app_state = controller::AppState::new(cfg.clone()).await?;
    let app = api::router(app_state, &cfg);

    let addr = cfg.server.socket_addr()?;
    if cfg.server.host == "0.0.0.0" {
        warn!("server binding to 0.0.0.0, the API is reachable from the network");
    }
    info!(
        %addr,
        environment = %cfg.environment,
        backend = ?cfg.db.backend,
        algorithm = %cfg.grid.algorithm,
        "starting grid optimizer"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
