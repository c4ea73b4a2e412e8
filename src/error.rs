//! Error taxonomy for the registry, key and ledger operations
//!
//! Validation and credential errors are the caller's fault and are never
//! retried here. `StoreUnavailable` is transient and safe for the caller
//! to retry with backoff; the core itself performs no implicit retry so a
//! retried `record` can never append twice.

use axum::http::StatusCode;

use crate::models::BotStatus;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("unknown or revoked api key (prefix: {0})")]
    InvalidCredential(String),

    #[error("bot {0} not found")]
    NotFound(String),

    #[error("bot {bot_id} is {status}, revenue rejected")]
    BotDisabled { bot_id: String, status: BotStatus },

    #[error("bot {0} already holds an api key")]
    DuplicateKey(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(sqlx::Error),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Pool exhaustion, connect failures and SQLite lock contention are
/// transient; everything else is a genuine database error and surfaces
/// unmodified.
impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        // SQLITE_BUSY (5), SQLITE_LOCKED (6), SQLITE_BUSY_SNAPSHOT (517):
        // another writer held the lock past the busy timeout. Safe to
        // retry with backoff.
        let busy = matches!(
            e.as_database_error().and_then(|d| d.code()).as_deref(),
            Some("5" | "6" | "517")
        );
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Error::StoreUnavailable(e)
            }
            _ if busy => Error::StoreUnavailable(e),
            _ => Error::Database(e),
        }
    }
}

/// HTTP status mapping used by the handler layer.
impl From<Error> for (StatusCode, String) {
    fn from(e: Error) -> Self {
        let status = match &e {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::BotDisabled { .. } => StatusCode::CONFLICT,
            Error::DuplicateKey(_) => StatusCode::CONFLICT,
            Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, e.to_string())
    }
}

/// First characters of a key, safe to log. Full keys never leave the core.
pub fn key_prefix(key: &str) -> String {
    key.chars().take(8).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_prefix_truncates() {
        assert_eq!(key_prefix("bk_abcdefghij"), "bk_abcde");
        assert_eq!(key_prefix("short"), "short");
        assert_eq!(key_prefix(""), "");
    }

    #[test]
    fn status_mapping() {
        let (status, msg) = <(StatusCode, String)>::from(Error::NotFound("b1".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(msg.contains("b1"));

        let (status, _) =
            <(StatusCode, String)>::from(Error::InvalidCredential("bk_xx".into()));
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = <(StatusCode, String)>::from(Error::DuplicateKey("b1".into()));
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
