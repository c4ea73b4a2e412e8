//! Registry handlers: thin HTTP wrappers over `registry` and `keys`

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    keys,
    models::{
        Bot, BotFilter, IssuedKeyResponse, ListBotsResponse, RegisterBotRequest,
        RegisteredBotResponse, UpdateStatusRequest,
    },
    registry, AppState,
};

/// POST /v1/bots - Register a new bot; the issued key is returned here and
/// nowhere else.
pub async fn register_bot(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterBotRequest>,
) -> Result<Json<RegisteredBotResponse>, (StatusCode, String)> {
    if let Err(errors) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, errors.to_string()));
    }

    let (bot, api_key) = registry::register(&state.db, state.keygen.as_ref(), req).await?;
    Ok(Json(RegisteredBotResponse { bot, api_key }))
}

/// GET /v1/bots - List bots, filterable by country/language/category/status
pub async fn list_bots(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<BotFilter>,
) -> Result<Json<ListBotsResponse>, (StatusCode, String)> {
    let bots = registry::list(&state.db, &filter).await?;
    // Total matching the filter, not the page size.
    let total = registry::count(&state.db, &filter).await?;
    Ok(Json(ListBotsResponse { bots, total }))
}

/// GET /v1/bots/:id - Fetch one bot
pub async fn get_bot(
    State(state): State<Arc<AppState>>,
    Path(bot_id): Path<String>,
) -> Result<Json<Bot>, (StatusCode, String)> {
    let bot = registry::get(&state.db, &bot_id).await?;
    Ok(Json(bot))
}

/// PATCH /v1/bots/:id/status - Administrative status transition
pub async fn update_bot_status(
    State(state): State<Arc<AppState>>,
    Path(bot_id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Bot>, (StatusCode, String)> {
    registry::update_status(&state.db, &bot_id, req.status).await?;
    let bot = registry::get(&state.db, &bot_id).await?;
    Ok(Json(bot))
}

/// POST /v1/bots/:id/key - Rotate the bot's key (revoke, then issue)
pub async fn reissue_key(
    State(state): State<Arc<AppState>>,
    Path(bot_id): Path<String>,
) -> Result<Json<IssuedKeyResponse>, (StatusCode, String)> {
    keys::revoke(&state.db, &bot_id).await?;
    let api_key = keys::issue_key(&state.db, state.keygen.as_ref(), &bot_id).await?;
    Ok(Json(IssuedKeyResponse { bot_id, api_key }))
}

/// DELETE /v1/bots/:id/key - Revoke without replacement
pub async fn revoke_key(
    State(state): State<Arc<AppState>>,
    Path(bot_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    keys::revoke(&state.db, &bot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
