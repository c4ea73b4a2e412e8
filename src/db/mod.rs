use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite, Transaction};

use crate::error::Error;

pub type Db = Pool<Sqlite>;

/// Acquisition timeout for pool checkout. Exceeding it surfaces as
/// `StoreUnavailable`, which the caller may retry with backoff.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(3);

/// How long SQLite waits for the write lock before giving up with
/// SQLITE_BUSY. Bounds every store call; expiry surfaces as
/// `StoreUnavailable`.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn init_db(path: &str) -> Result<Db, Error> {
    let (options, max_connections) = if path == ":memory:" {
        // A pooled in-memory database must stay on a single connection or
        // every checkout would see a different, empty database.
        (SqliteConnectOptions::from_str("sqlite::memory:")?, 1)
    } else {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        (options, 5)
    };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect_with(options.foreign_keys(true).busy_timeout(BUSY_TIMEOUT))
        .await?;

    Ok(pool)
}

/// Begin a transaction that takes the write lock up front.
///
/// A deferred BEGIN that reads before its first write holds only a read
/// snapshot; once another writer commits it can never upgrade, and SQLite
/// fails it SQLITE_BUSY without consulting the busy timeout. BEGIN
/// IMMEDIATE queues on the timeout instead, so concurrent writers
/// serialize rather than error. Every multi-step write in this crate goes
/// through here.
pub async fn begin_write(db: &Db) -> Result<Transaction<'static, Sqlite>, Error> {
    Ok(db.begin_with("BEGIN IMMEDIATE").await?)
}

/// Create the two tables and their indexes if absent. Safe to run on every
/// startup.
pub async fn init_schema(pool: &Db) -> Result<(), Error> {
    let statements = [
        "CREATE TABLE IF NOT EXISTS bots (
            id TEXT PRIMARY KEY NOT NULL,
            country TEXT NOT NULL,
            language TEXT NOT NULL,
            category TEXT NOT NULL,
            strategy TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active',
            api_key TEXT UNIQUE,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        // AUTOINCREMENT keeps revenue ids monotonic and never reused, even
        // across deletes (which this crate does not perform anyway).
        "CREATE TABLE IF NOT EXISTS revenue (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            bot_id TEXT NOT NULL REFERENCES bots(id),
            amount REAL NOT NULL,
            currency TEXT NOT NULL,
            source TEXT NOT NULL,
            wallet_address TEXT NOT NULL,
            recorded_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_bots_api_key ON bots(api_key)",
        "CREATE INDEX IF NOT EXISTS idx_revenue_bot_id ON revenue(bot_id)",
        "CREATE INDEX IF NOT EXISTS idx_revenue_wallet ON revenue(wallet_address)",
    ];

    for sql in statements {
        sqlx::query(sql).execute(pool).await?;
    }

    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> Db {
    let pool = init_db(":memory:").await.expect("in-memory pool");
    init_schema(&pool).await.expect("schema");
    pool
}

/// Removes the database file (and its WAL sidecars) when dropped.
#[cfg(test)]
pub(crate) struct TestDbFile(pub std::path::PathBuf);

#[cfg(test)]
impl Drop for TestDbFile {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", self.0.display(), suffix));
        }
    }
}

/// File-backed pool with the production connection settings (multiple
/// connections, WAL). Unlike `test_pool` this does not serialize callers
/// on a single connection, so it exhibits real writer contention.
#[cfg(test)]
pub(crate) async fn test_file_pool() -> (Db, TestDbFile) {
    let path = std::env::temp_dir().join(format!("fleet-ledger-{}.db", uuid::Uuid::new_v4()));
    let pool = init_db(path.to_str().expect("utf-8 temp path"))
        .await
        .expect("file pool");
    init_schema(&pool).await.expect("schema");
    (pool, TestDbFile(path))
}
