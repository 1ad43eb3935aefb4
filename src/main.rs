//! CuraLink Backend
//!
//! Patient/researcher matchmaking API server.

use curalink::{api, core, db};

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration (handles CLI args, env vars, and config file)
    let config = match core::config::Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            // Logging isn't initialized yet
            eprintln!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let _logger = match core::Logger::init(&config.logging) {
        Ok(logger) => logger,
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return Err(e);
        }
    };

    info!("Starting CuraLink Backend v{}", curalink::VERSION);
    info!(
        host = %config.server.host,
        port = config.server.port,
        "Server configuration"
    );
    info!(
        path = ?config.database.path,
        pool_size = config.database.connection_pool_size,
        "Database configuration"
    );
    info!(
        algorithm = %config.security.jwt_algorithm,
        token_ttl_minutes = config.security.token_ttl_minutes,
        bcrypt_cost = config.security.bcrypt_cost,
        "Security configuration"
    );

    info!("Initializing database...");
    let pool_size = u32::try_from(config.database.connection_pool_size)
        .map_err(|_| anyhow::anyhow!("connection_pool_size is too large"))?;
    let db = Arc::new(db::DatabaseManager::new(
        &config.database.path,
        pool_size,
        Duration::from_millis(config.database.busy_timeout),
    )?);
    info!("Database initialized successfully");

    let server_url = format!("http://{}:{}", config.server.host, config.server.port);
    let server = api::ApiServer::new(Arc::new(config), db)?;

    info!(url = %server_url, "Server ready - starting to serve requests");

    // Blocks until shutdown signal
    server.serve().await?;

    Ok(())
}
