use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use habla_gateway::{build_app, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("habla_gateway=debug,tower_http=debug")),
        )
        .init();

    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded environment from {}", path.display());
    }

    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "conf.yaml".to_string());
    // Missing secrets end the process here, before anything is bound.
    let config = Config::load(&config_path)?;
    info!("Loaded configuration (file: {})", config_path);

    let addr = config.bind_addr();
    let app_state = AppState::new(config)?;
    let app = build_app(app_state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
