//! Read-side handlers over the reporting facade

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::{
    ledger,
    models::{BotSummary, CurrencyQuery, RevenueTotalResponse, WalletSummary},
    registry, reports, AppState,
};

/// GET /v1/bots/:id/summary
pub async fn bot_summary(
    State(state): State<Arc<AppState>>,
    Path(bot_id): Path<String>,
) -> Result<Json<BotSummary>, (StatusCode, String)> {
    let summary = reports::bot_summary(&state.db, &bot_id).await?;
    Ok(Json(summary))
}

/// GET /v1/bots/:id/revenue/total?currency=USD
pub async fn bot_revenue_total(
    State(state): State<Arc<AppState>>,
    Path(bot_id): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<RevenueTotalResponse>, (StatusCode, String)> {
    // Unknown bot is a 404; a known bot with no revenue totals zero.
    registry::get(&state.db, &bot_id).await?;

    let total = ledger::sum_by_bot(&state.db, &bot_id, query.currency.as_deref()).await?;
    Ok(Json(RevenueTotalResponse {
        bot_id,
        currency: query.currency,
        total,
    }))
}

/// GET /v1/wallets/:address/summary
pub async fn wallet_summary(
    State(state): State<Arc<AppState>>,
    Path(wallet_address): Path<String>,
) -> Result<Json<WalletSummary>, (StatusCode, String)> {
    let summary = reports::wallet_summary(&state.db, &wallet_address).await?;
    Ok(Json(summary))
}
