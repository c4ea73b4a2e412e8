//! Process configuration, read from the environment (and .env if present)
//!
//! The core consumes but does not own this: the store path, the listen
//! port and an optional seed list of pre-provisioned API keys for
//! bootstrap and testing.

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite file path, or ":memory:" for an ephemeral store.
    pub database_path: String,
    pub port: u16,
    /// Comma-separated API_KEYS; each gets a bootstrap bot on startup.
    pub seed_api_keys: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "business.db".to_string());

        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let seed_api_keys = std::env::var("API_KEYS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            database_path,
            port,
            seed_api_keys,
        }
    }
}
