//! Revenue reporting handler: the single write path into the ledger

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    ledger,
    middleware::ApiKey,
    models::{RecordRevenueRequest, Revenue},
    AppState,
};

/// POST /v1/revenue - Append a revenue event for the bot owning the
/// presented key. The credential travels only in the header extracted by
/// the auth middleware; the ledger resolves and validates it.
pub async fn record_revenue(
    State(state): State<Arc<AppState>>,
    Extension(ApiKey(api_key)): Extension<ApiKey>,
    Json(req): Json<RecordRevenueRequest>,
) -> Result<(StatusCode, Json<Revenue>), (StatusCode, String)> {
    let revenue = ledger::record(
        &state.db,
        &api_key,
        req.amount,
        &req.currency,
        &req.source,
        &req.wallet_address,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(revenue)))
}
