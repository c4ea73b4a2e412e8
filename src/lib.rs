pub mod config;
pub mod models;
pub mod handlers {
    pub mod bots;
    pub mod reports;
    pub mod revenue;
}
pub mod db;
pub mod error;
pub mod health;
pub mod keys;
pub mod ledger;
pub mod middleware;
pub mod registry;
pub mod reports;

use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use db::Db;
pub use error::Error;
pub use keys::{KeyGenerator, RandomKeyGenerator};
pub use models::*;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    /// Pluggable key source; deterministic generators slot in for tests.
    pub keygen: Arc<dyn KeyGenerator>,
}

impl AppState {
    pub fn new(db: Db) -> Self {
        Self {
            db,
            keygen: Arc::new(RandomKeyGenerator),
        }
    }

    pub fn with_key_generator(db: Db, keygen: Arc<dyn KeyGenerator>) -> Self {
        Self { db, keygen }
    }
}

/// Build the API router
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Administrative and read routes
    let admin_routes = Router::new()
        .route(
            "/bots",
            post(handlers::bots::register_bot).get(handlers::bots::list_bots),
        )
        .route("/bots/{id}", get(handlers::bots::get_bot))
        .route("/bots/{id}/status", patch(handlers::bots::update_bot_status))
        .route(
            "/bots/{id}/key",
            post(handlers::bots::reissue_key).delete(handlers::bots::revoke_key),
        )
        .route("/bots/{id}/summary", get(handlers::reports::bot_summary))
        .route(
            "/bots/{id}/revenue/total",
            get(handlers::reports::bot_revenue_total),
        )
        .route(
            "/wallets/{address}/summary",
            get(handlers::reports::wallet_summary),
        )
        .with_state(state.clone());

    // Bot-facing route (revenue reports, key in header)
    let report_routes = Router::new()
        .route("/revenue", post(handlers::revenue::record_revenue))
        .layer(axum::middleware::from_fn(middleware::require_api_key))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .with_state(state);

    Router::new()
        .merge(health_routes)
        .nest("/v1", admin_routes)
        .nest("/v1", report_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
