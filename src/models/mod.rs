use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Bot status
///
/// Any status is reachable from any other; `disabled` is administrative,
/// not terminal. Only `active` bots may append revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BotStatus {
    Active,
    Paused,
    Disabled,
}

impl std::fmt::Display for BotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotStatus::Active => write!(f, "active"),
            BotStatus::Paused => write!(f, "paused"),
            BotStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Bot entity
///
/// The api_key column is deliberately absent here; credentials only leave
/// the store through the issue/register paths.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Bot {
    pub id: String,
    pub country: String,
    pub language: String,
    pub category: String,
    pub strategy: String,
    pub status: BotStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Revenue event entity (append-only)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Revenue {
    pub id: i64,
    pub bot_id: String,
    pub amount: f64,
    pub currency: String,
    pub source: String,
    pub wallet_address: String,
    pub recorded_at: DateTime<Utc>,
}

/// Per-currency total used by the reporting facade
#[derive(Debug, Clone, Serialize)]
pub struct CurrencyTotal {
    pub currency: String,
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct BotSummary {
    pub bot: Bot,
    pub totals: Vec<CurrencyTotal>,
    pub event_count: i64,
}

#[derive(Debug, Serialize)]
pub struct WalletSummary {
    pub wallet_address: String,
    pub totals: Vec<CurrencyTotal>,
    pub bot_ids: Vec<String>,
}

// Response types for API

#[derive(Debug, Serialize)]
pub struct ListBotsResponse {
    pub bots: Vec<Bot>,
    pub total: i64,
}

/// Returned once at registration; the only response carrying a full key.
#[derive(Debug, Serialize)]
pub struct RegisteredBotResponse {
    pub bot: Bot,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct IssuedKeyResponse {
    pub bot_id: String,
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct RevenueTotalResponse {
    pub bot_id: String,
    pub currency: Option<String>,
    pub total: f64,
}

// Request types for API

#[derive(Debug, Deserialize, validator::Validate)]
pub struct RegisterBotRequest {
    #[validate(length(min = 1, max = 100))]
    pub country: String,
    #[validate(length(min = 1, max = 100))]
    pub language: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 1, max = 100))]
    pub strategy: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BotStatus,
}

#[derive(Debug, Deserialize)]
pub struct RecordRevenueRequest {
    pub amount: f64,
    pub currency: String,
    pub source: String,
    pub wallet_address: String,
}

/// Query-side filter for bot listing. Any subset of fields may be set;
/// results are ordered by id ascending so limit/offset pagination is
/// restartable and deterministic.
#[derive(Debug, Default, Deserialize)]
pub struct BotFilter {
    pub country: Option<String>,
    pub language: Option<String>,
    pub category: Option<String>,
    pub status: Option<BotStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CurrencyQuery {
    pub currency: Option<String>,
}
