//! Identity & access control: API key issuance, resolution and revocation
//!
//! Each bot holds at most one key, stored on its own row; the UNIQUE
//! constraint on `bots.api_key` guarantees a key resolves to exactly one
//! bot. Resolution is side-effect free.

use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use tracing::info;

use crate::db::Db;
use crate::error::{key_prefix, Error};
use crate::models::Bot;

const KEY_LENGTH: usize = 40;

/// Pluggable key generation, swapped for a deterministic source in tests.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Default generator: OS-backed CSPRNG, 40 alphanumeric characters behind
/// a recognizable prefix.
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> String {
        let body: String = OsRng
            .sample_iter(&Alphanumeric)
            .take(KEY_LENGTH)
            .map(char::from)
            .collect();
        format!("bk_{}", body)
    }
}

const BOT_COLUMNS: &str =
    "id, country, language, category, strategy, status, created_at, updated_at";

/// Bind a fresh key to a bot that does not currently hold one.
///
/// Re-issuing requires an explicit `revoke` first; a bot that already has
/// a key gets `DuplicateKey`.
pub async fn issue_key(db: &Db, keygen: &dyn KeyGenerator, bot_id: &str) -> Result<String, Error> {
    let mut tx = crate::db::begin_write(db).await?;

    let current: Option<Option<String>> =
        sqlx::query_scalar("SELECT api_key FROM bots WHERE id = ?")
            .bind(bot_id)
            .fetch_optional(&mut *tx)
            .await?;

    match current {
        None => Err(Error::NotFound(bot_id.to_string())),
        Some(Some(_)) => Err(Error::DuplicateKey(bot_id.to_string())),
        Some(None) => {
            let key = keygen.generate();
            sqlx::query(
                "UPDATE bots SET api_key = ?, updated_at = ? WHERE id = ? AND api_key IS NULL",
            )
            .bind(&key)
            .bind(chrono::Utc::now())
            .bind(bot_id)
            .execute(&mut *tx)
            .await?;
            tx.commit().await?;

            info!("Issued key {}… to bot {}", key_prefix(&key), bot_id);
            Ok(key)
        }
    }
}

/// Resolve an API key to its owning bot. Blank and unknown keys fail the
/// same way so callers cannot distinguish revoked from never-issued.
pub async fn resolve(db: &Db, api_key: &str) -> Result<Bot, Error> {
    if api_key.trim().is_empty() {
        return Err(Error::InvalidCredential(String::new()));
    }

    let bot = sqlx::query_as::<_, Bot>(&format!(
        "SELECT {} FROM bots WHERE api_key = ?",
        BOT_COLUMNS
    ))
    .bind(api_key)
    .fetch_optional(db)
    .await?;

    bot.ok_or_else(|| Error::InvalidCredential(key_prefix(api_key)))
}

/// Invalidate the bot's current key. Subsequent resolves for it fail.
pub async fn revoke(db: &Db, bot_id: &str) -> Result<(), Error> {
    let result = sqlx::query("UPDATE bots SET api_key = NULL, updated_at = ? WHERE id = ?")
        .bind(chrono::Utc::now())
        .bind(bot_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(bot_id.to_string()));
    }

    info!("Revoked key for bot {}", bot_id);
    Ok(())
}

/// Bootstrap: bind each pre-provisioned key from config to its own bot.
///
/// Keys already present in the store are left untouched, so restarting
/// with the same seed list is a no-op.
pub async fn seed_keys(db: &Db, keys: &[String]) -> Result<(), Error> {
    for key in keys {
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM bots WHERE api_key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;
        if exists.is_some() {
            continue;
        }

        let now = chrono::Utc::now();
        sqlx::query(
            "INSERT INTO bots (id, country, language, category, strategy, status, api_key, created_at, updated_at)
             VALUES (?, 'unknown', 'unknown', 'seed', 'seed', 'active', ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(key)
        .bind(now)
        .bind(now)
        .execute(db)
        .await?;

        info!("Seeded bootstrap bot for key {}…", key_prefix(key));
    }

    Ok(())
}

#[cfg(test)]
pub(crate) struct FixedKeyGenerator(pub &'static str);

#[cfg(test)]
impl KeyGenerator for FixedKeyGenerator {
    fn generate(&self) -> String {
        self.0.to_string()
    }
}
