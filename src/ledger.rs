//! Revenue ledger: transactional append and aggregation
//!
//! The ledger is append-only; no update or delete path exists. A future
//! correction mechanism would append offsetting rows under an explicit
//! `source` tag rather than editing history, so negative amounts are
//! rejected outright.

use chrono::Utc;
use tracing::{info, warn};

use crate::db::Db;
use crate::error::{key_prefix, Error};
use crate::models::{BotStatus, Revenue};

/// Append a revenue event on behalf of the bot owning `api_key`.
///
/// Key resolution, the status check and the insert share one transaction:
/// a bot disabled concurrently with an in-flight `record` either commits
/// before the resolve (the write is rejected) or after the commit (the row
/// is already durable). Nothing in between is observable.
pub async fn record(
    db: &Db,
    api_key: &str,
    amount: f64,
    currency: &str,
    source: &str,
    wallet_address: &str,
) -> Result<Revenue, Error> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::validation("amount", "must be a non-negative number"));
    }
    if currency.trim().is_empty() {
        return Err(Error::validation("currency", "must not be blank"));
    }
    if source.trim().is_empty() {
        return Err(Error::validation("source", "must not be blank"));
    }
    if wallet_address.trim().is_empty() {
        return Err(Error::validation("wallet_address", "must not be blank"));
    }
    if api_key.trim().is_empty() {
        return Err(Error::InvalidCredential(String::new()));
    }

    let mut tx = crate::db::begin_write(db).await?;

    let bot: Option<(String, BotStatus)> =
        sqlx::query_as("SELECT id, status FROM bots WHERE api_key = ?")
            .bind(api_key)
            .fetch_optional(&mut *tx)
            .await?;

    let (bot_id, status) = match bot {
        Some(row) => row,
        None => {
            warn!("Rejected revenue report: unknown key {}…", key_prefix(api_key));
            return Err(Error::InvalidCredential(key_prefix(api_key)));
        }
    };

    if status != BotStatus::Active {
        warn!("Rejected revenue report: bot {} is {}", bot_id, status);
        return Err(Error::BotDisabled { bot_id, status });
    }

    let recorded_at = Utc::now();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO revenue (bot_id, amount, currency, source, wallet_address, recorded_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING id",
    )
    .bind(&bot_id)
    .bind(amount)
    .bind(currency)
    .bind(source)
    .bind(wallet_address)
    .bind(recorded_at)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "Recorded revenue #{}: bot {} {} {} from {}",
        id, bot_id, amount, currency, source
    );

    Ok(Revenue {
        id,
        bot_id,
        amount,
        currency: currency.to_string(),
        source: source.to_string(),
        wallet_address: wallet_address.to_string(),
        recorded_at,
    })
}

/// Total recorded for a bot, optionally restricted to one currency.
/// Computed from the stored rows at query time; a bot with no revenue
/// totals zero, it is not an error.
pub async fn sum_by_bot(db: &Db, bot_id: &str, currency: Option<&str>) -> Result<f64, Error> {
    let total: f64 = match currency {
        Some(currency) => {
            sqlx::query_scalar(
                "SELECT COALESCE(SUM(amount), 0.0) FROM revenue WHERE bot_id = ? AND currency = ?",
            )
            .bind(bot_id)
            .bind(currency)
            .fetch_one(db)
            .await?
        }
        None => {
            sqlx::query_scalar("SELECT COALESCE(SUM(amount), 0.0) FROM revenue WHERE bot_id = ?")
                .bind(bot_id)
                .fetch_one(db)
                .await?
        }
    };
    Ok(total)
}

/// Total recorded against a wallet, optionally restricted to one currency.
pub async fn sum_by_wallet(db: &Db, wallet_address: &str, currency: Option<&str>) -> Result<f64, Error> {
    let total: f64 = match currency {
        Some(currency) => {
            sqlx::query_scalar(
                "SELECT COALESCE(SUM(amount), 0.0) FROM revenue
                 WHERE wallet_address = ? AND currency = ?",
            )
            .bind(wallet_address)
            .bind(currency)
            .fetch_one(db)
            .await?
        }
        None => {
            sqlx::query_scalar(
                "SELECT COALESCE(SUM(amount), 0.0) FROM revenue WHERE wallet_address = ?",
            )
            .bind(wallet_address)
            .fetch_one(db)
            .await?
        }
    };
    Ok(total)
}

#[cfg(test)]
pub(crate) async fn ledger_len(db: &Db) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM revenue")
        .fetch_one(db)
        .await
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::keys::RandomKeyGenerator;
    use crate::models::RegisterBotRequest;
    use crate::registry;

    async fn registered(db: &Db) -> (String, String) {
        let (bot, key) = registry::register(
            db,
            &RandomKeyGenerator,
            RegisterBotRequest {
                country: "US".into(),
                language: "en".into(),
                category: "ads".into(),
                strategy: "arbitrage".into(),
            },
        )
        .await
        .unwrap();
        (bot.id, key)
    }

    #[tokio::test]
    async fn record_then_sum_matches() {
        let db = test_pool().await;
        let (bot_id, key) = registered(&db).await;

        let row = record(&db, &key, 10.5, "USD", "ads", "W1").await.unwrap();
        assert_eq!(row.bot_id, bot_id);
        assert_eq!(row.amount, 10.5);
        assert!(row.id > 0);

        assert_eq!(sum_by_bot(&db, &bot_id, Some("USD")).await.unwrap(), 10.5);
    }

    #[tokio::test]
    async fn sum_equals_arithmetic_sum_at_every_point() {
        let db = test_pool().await;
        let (bot_id, key) = registered(&db).await;

        let amounts = [1.25, 2.0, 0.0, 7.75];
        let mut running = 0.0;
        for amount in amounts {
            record(&db, &key, amount, "USD", "ads", "W1").await.unwrap();
            running += amount;
            assert_eq!(sum_by_bot(&db, &bot_id, None).await.unwrap(), running);
        }
    }

    #[tokio::test]
    async fn bad_key_rejected_and_ledger_unchanged() {
        let db = test_pool().await;
        let (bot_id, _key) = registered(&db).await;

        let err = record(&db, "bad-key", 5.0, "USD", "ads", "W1")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredential(_)));
        assert_eq!(ledger_len(&db).await, 0);
        assert_eq!(sum_by_bot(&db, &bot_id, None).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn disabled_bot_rejected_then_reactivated_succeeds() {
        let db = test_pool().await;
        let (bot_id, key) = registered(&db).await;

        registry::update_status(&db, &bot_id, BotStatus::Disabled)
            .await
            .unwrap();
        let err = record(&db, &key, 3.0, "USD", "ads", "W1").await.unwrap_err();
        assert!(matches!(err, Error::BotDisabled { .. }));
        assert_eq!(ledger_len(&db).await, 0);

        registry::update_status(&db, &bot_id, BotStatus::Active)
            .await
            .unwrap();
        record(&db, &key, 3.0, "USD", "ads", "W1").await.unwrap();
        assert_eq!(ledger_len(&db).await, 1);
    }

    #[tokio::test]
    async fn paused_bot_is_also_rejected() {
        let db = test_pool().await;
        let (bot_id, key) = registered(&db).await;

        registry::update_status(&db, &bot_id, BotStatus::Paused)
            .await
            .unwrap();
        let err = record(&db, &key, 3.0, "USD", "ads", "W1").await.unwrap_err();
        assert!(matches!(err, Error::BotDisabled { .. }));
    }

    #[tokio::test]
    async fn negative_and_malformed_amounts_rejected() {
        let db = test_pool().await;
        let (_bot_id, key) = registered(&db).await;

        for bad in [-0.01, f64::NAN, f64::INFINITY] {
            let err = record(&db, &key, bad, "USD", "ads", "W1").await.unwrap_err();
            assert!(matches!(err, Error::Validation { field: "amount", .. }));
        }
        let err = record(&db, &key, 1.0, "", "ads", "W1").await.unwrap_err();
        assert!(matches!(err, Error::Validation { field: "currency", .. }));
        assert_eq!(ledger_len(&db).await, 0);
    }

    #[tokio::test]
    async fn currency_filter_splits_totals() {
        let db = test_pool().await;
        let (bot_id, key) = registered(&db).await;

        record(&db, &key, 10.0, "USD", "ads", "W1").await.unwrap();
        record(&db, &key, 0.5, "BTC", "referral", "W2").await.unwrap();

        assert_eq!(sum_by_bot(&db, &bot_id, Some("USD")).await.unwrap(), 10.0);
        assert_eq!(sum_by_bot(&db, &bot_id, Some("BTC")).await.unwrap(), 0.5);
        assert_eq!(sum_by_bot(&db, &bot_id, None).await.unwrap(), 10.5);
        assert_eq!(sum_by_bot(&db, &bot_id, Some("EUR")).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn sum_by_wallet_spans_bots() {
        let db = test_pool().await;
        let (_a, key_a) = registered(&db).await;
        let (_b, key_b) = registered(&db).await;

        record(&db, &key_a, 4.0, "USD", "ads", "shared-wallet").await.unwrap();
        record(&db, &key_b, 6.0, "USD", "ads", "shared-wallet").await.unwrap();
        record(&db, &key_b, 9.0, "USD", "ads", "other-wallet").await.unwrap();

        assert_eq!(
            sum_by_wallet(&db, "shared-wallet", Some("USD")).await.unwrap(),
            10.0
        );
        assert_eq!(sum_by_wallet(&db, "other-wallet", None).await.unwrap(), 9.0);
        assert_eq!(sum_by_wallet(&db, "empty-wallet", None).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn concurrent_records_all_land() {
        let db = test_pool().await;
        let (bot_id, key) = registered(&db).await;

        let mut handles = Vec::new();
        for i in 1..=8u32 {
            let db = db.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                record(&db, &key, f64::from(i), "USD", "ads", "W1").await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger_len(&db).await, 8);
        // 1 + 2 + … + 8
        assert_eq!(sum_by_bot(&db, &bot_id, None).await.unwrap(), 36.0);
    }

    #[tokio::test]
    async fn concurrent_records_on_file_backed_store() {
        // Production pool shape: multiple connections over a WAL file, so
        // the writers genuinely contend for the write lock instead of
        // being serialized by a single-connection pool.
        let (db, _dbfile) = crate::db::test_file_pool().await;
        let (bot_id, key) = registered(&db).await;

        let mut handles = Vec::new();
        for i in 1..=16u32 {
            let db = db.clone();
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                record(&db, &key, f64::from(i), "USD", "ads", "W1").await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger_len(&db).await, 16);
        // 1 + 2 + … + 16
        assert_eq!(sum_by_bot(&db, &bot_id, None).await.unwrap(), 136.0);
        db.close().await;
    }

    #[tokio::test]
    async fn revenue_ids_are_monotonic() {
        let db = test_pool().await;
        let (_bot_id, key) = registered(&db).await;

        let a = record(&db, &key, 1.0, "USD", "ads", "W1").await.unwrap();
        let b = record(&db, &key, 2.0, "USD", "ads", "W1").await.unwrap();
        assert!(b.id > a.id);
    }
}
