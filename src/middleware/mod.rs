//! Middleware module for the fleet-ledger HTTP layer

pub mod auth;

// Re-export commonly used items
pub use auth::{require_api_key, ApiKey};
