use std::path::Path;

use anyhow::Context;
use tokio::io::BufReader;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use postwhale::config::{Config, LogFormat};
use postwhale::gateway;
use postwhale::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing; stdout carries the protocol, so logs go to stderr
    init_tracing(config.log_format);

    tracing::info!("Starting PostWhale backend...");

    if !config.is_in_memory() {
        if let Some(parent) = Path::new(&config.db_path).parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    // Initialize application state
    tracing::info!(db_path = %config.db_path, "Opening database...");
    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;
    tracing::info!("Database ready, reading requests from stdin");

    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();

    tokio::select! {
        result = gateway::serve(&state, reader, writer) => {
            result.context("Gateway I/O failed")?;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received, stopping...");
        }
    }

    tracing::info!("PostWhale backend stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
