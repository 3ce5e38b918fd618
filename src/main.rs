use anyhow::Context;
use tracing_subscriber::EnvFilter;

use agency_api::config;
use agency_api::database::DatabaseManager;
use agency_api::routes;
use agency_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agency_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting Agency API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("SECURITY_JWT_SECRET must be set in {:?} mode", config.environment);
    }
    if agency_api::is_production!() && !config.security.secure_cookies {
        tracing::warn!("Session cookies are not marked Secure in production");
    }

    let db = DatabaseManager::connect_lazy(&config.database).context("invalid database configuration")?;
    if config.database.run_migrations {
        // The server still starts; /health reports the database state
        if let Err(e) = db.migrate().await {
            tracing::error!("Migrations failed: {}", e);
        }
    }

    let app = routes::app(AppState::new(db.clone()));

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Agency API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    tracing::info!("Agency API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
