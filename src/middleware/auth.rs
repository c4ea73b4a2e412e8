//! API key extraction middleware for the revenue reporting route
//!
//! The HTTP layer only handles transport: it pulls the bearer credential
//! out of the headers and hands the opaque string to the ledger, which is
//! the sole judge of its validity. The key is accepted from exactly one
//! channel per request: the `X-Api-Key` header, or the standard
//! `Authorization: Bearer` form of the same thing.

use axum::{
    body::Body,
    extract::Request,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Raw credential attached to the request for the handler to pass into
/// the core. Not yet resolved; resolution happens inside the ledger
/// transaction.
#[derive(Debug, Clone)]
pub struct ApiKey(pub String);

fn api_key_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(API_KEY_HEADER) {
        return value.to_str().ok().map(str::to_string);
    }
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Rejects requests carrying no credential at all; everything else is
/// deferred to the core so unknown and revoked keys fail identically.
pub async fn require_api_key(
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let key = api_key_from_headers(request.headers()).ok_or((
        StatusCode::UNAUTHORIZED,
        "missing api key".to_string(),
    ))?;

    request.extensions_mut().insert(ApiKey(key));
    Ok(next.run(request).await)
}
