/// QRTix Server - registration, face login and ticket sales
///
/// Main server entry point. Handles:
/// - Command-line / environment configuration
/// - Primary and mirror database initialization
/// - HTTP server startup and shutdown
use actix_web::web;
use anyhow::Context;
use qrtix_server::config::Config;
use qrtix_server::db::replica::{Mirror, RetryPolicy};
use qrtix_server::db::{self, Database, DbPool, Stores};
use qrtix_server::face::FaceClient;
use qrtix_server::server;
use std::path::Path;

async fn open_store(path: &Path) -> anyhow::Result<DbPool> {
    let pool = db::create_pool(&path.to_string_lossy())
        .with_context(|| format!("Failed to open database {:?}", path))?;
    Database::ping(&pool)
        .await
        .with_context(|| format!("Database {:?} did not answer", path))?;
    Ok(pool)
}

/// The mirror is optional: any failure to reach it leaves the server running without one.
async fn open_mirror(path: Option<&Path>, policy: RetryPolicy) -> Option<Mirror> {
    let path = match path {
        Some(path) => path,
        None => {
            log::warn!("No mirror database configured, writes go to the primary store only");
            return None;
        }
    };

    match open_store(path).await {
        Ok(pool) => {
            log::info!("Mirror database connected: {:?}", path);
            Some(Mirror::new(pool, policy))
        }
        Err(e) => {
            log::info!("Mirror database not available: {:#}", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp_millis()
        .init();

    let config = Config::from_args();

    log::info!("Starting QRTix Server");
    log::info!("Primary database: {:?}", config.database);
    log::info!("CORS origin: {}", config.cors_origin);

    let primary = open_store(&config.database).await?;
    log::info!("Primary database connected");

    let mirror = open_mirror(config.mirror_database.as_deref(), config.retry_policy()).await;

    let face = FaceClient::new(config.face_api()).context("Failed to build face API client")?;
    if config.face_api_key.is_empty() || config.face_api_secret.is_empty() {
        log::warn!("Face API credentials are empty, every face check will fail");
    }

    let stores = web::Data::new(Stores::new(primary, mirror));
    let face = web::Data::new(face);

    let bind_addr = config.bind_addr();
    log::info!("Starting HTTP server on {}", bind_addr);

    let http_server =
        server::create_http_server(stores, face, &config.cors_origin, &bind_addr)?;
    http_server.await?;

    // Store handles are dropped with the server's app data, closing the connections.
    log::info!("Server stopped, database connections closed");
    Ok(())
}
