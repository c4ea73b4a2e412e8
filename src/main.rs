use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Starting fleet-ledger...");

    let config = fleet_ledger::Config::from_env();

    info!("Connecting to store at {}...", config.database_path);
    let db = fleet_ledger::db::init_db(&config.database_path).await?;
    fleet_ledger::db::init_schema(&db).await?;
    info!("✓ Store ready");

    if !config.seed_api_keys.is_empty() {
        fleet_ledger::keys::seed_keys(&db, &config.seed_api_keys).await?;
        info!("✓ Seeded {} pre-provisioned key(s)", config.seed_api_keys.len());
    }

    let state = Arc::new(fleet_ledger::AppState::new(db));
    let app = fleet_ledger::app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    info!("🚀 fleet-ledger listening on port {}", config.port);

    axum::serve(listener, app).await?;

    Ok(())
}
