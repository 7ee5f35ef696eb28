use std::sync::Arc;

use kans::api::WynnApi;
use kans::config;
use kans::context::AppContext;
use kans::db::{self, Database};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load configuration
    let config = config::Config::from_env().map_err(|e| {
        log::error!("Configuration error: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("Starting Kans poller against {}", config.api.base_url);

    // Create database pool
    let db_pool = db::create_pool(&config.database).await.map_err(|e| {
        log::error!("Database pool error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    if !db::health_check(&db_pool).await {
        log::warn!("Database health check failed, continuing anyway");
    }

    let api = WynnApi::new(&config.api).map_err(|e| {
        log::error!("API client error: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    let context = AppContext::new(config, Arc::new(api), Arc::new(Database::new(db_pool)));

    let mut heartbeat = context.build_heartbeat().map_err(|e| {
        log::error!("Failed to build heartbeat: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    heartbeat.start().await.map_err(|e| {
        log::error!("Failed to start heartbeat: {}", e);
        std::io::Error::other(e.to_string())
    })?;

    shutdown_signal().await;
    log::info!("Shutdown signal received, stopping heartbeat...");
    heartbeat.stop().await;

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
