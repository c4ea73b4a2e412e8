//! Query/reporting facade: read-only views joining registry and ledger
//!
//! Everything here is computed from the durable store at query time, so a
//! summary always equals the sum of the currently stored rows.

use crate::db::Db;
use crate::error::Error;
use crate::models::{BotSummary, CurrencyTotal, WalletSummary};
use crate::registry;

/// Bot attributes plus total revenue per currency and the event count.
pub async fn bot_summary(db: &Db, bot_id: &str) -> Result<BotSummary, Error> {
    let bot = registry::get(db, bot_id).await?;

    let rows: Vec<(String, f64)> = sqlx::query_as(
        "SELECT currency, COALESCE(SUM(amount), 0.0)
         FROM revenue WHERE bot_id = ?
         GROUP BY currency ORDER BY currency",
    )
    .bind(bot_id)
    .fetch_all(db)
    .await?;

    let event_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM revenue WHERE bot_id = ?")
        .bind(bot_id)
        .fetch_one(db)
        .await?;

    Ok(BotSummary {
        bot,
        totals: rows
            .into_iter()
            .map(|(currency, total)| CurrencyTotal { currency, total })
            .collect(),
        event_count,
    })
}

/// Per-currency totals for a wallet and the ids of the bots that paid into
/// it. A wallet nothing was recorded against yields an empty summary.
pub async fn wallet_summary(db: &Db, wallet_address: &str) -> Result<WalletSummary, Error> {
    let rows: Vec<(String, f64)> = sqlx::query_as(
        "SELECT currency, COALESCE(SUM(amount), 0.0)
         FROM revenue WHERE wallet_address = ?
         GROUP BY currency ORDER BY currency",
    )
    .bind(wallet_address)
    .fetch_all(db)
    .await?;

    let bot_ids: Vec<String> = sqlx::query_scalar(
        "SELECT DISTINCT bot_id FROM revenue WHERE wallet_address = ? ORDER BY bot_id",
    )
    .bind(wallet_address)
    .fetch_all(db)
    .await?;

    Ok(WalletSummary {
        wallet_address: wallet_address.to_string(),
        totals: rows
            .into_iter()
            .map(|(currency, total)| CurrencyTotal { currency, total })
            .collect(),
        bot_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::keys::RandomKeyGenerator;
    use crate::ledger;
    use crate::models::RegisterBotRequest;

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
    async fn bot_summary_totals_per_currency() {
        let db = test_pool().await;
        let (bot_id, key) = registered(&db).await;

        ledger::record(&db, &key, 10.0, "USD", "ads", "W1").await.unwrap();
        ledger::record(&db, &key, 5.0, "USD", "referral", "W1").await.unwrap();
        ledger::record(&db, &key, 0.25, "BTC", "ads", "W2").await.unwrap();

        let summary = bot_summary(&db, &bot_id).await.unwrap();
        assert_eq!(summary.bot.id, bot_id);
        assert_eq!(summary.event_count, 3);
        assert_eq!(summary.totals.len(), 2);
        // Ordered by currency: BTC then USD.
        assert_eq!(summary.totals[0].currency, "BTC");
        assert_eq!(summary.totals[0].total, 0.25);
        assert_eq!(summary.totals[1].currency, "USD");
        assert_eq!(summary.totals[1].total, 15.0);
    }

    #[tokio::test]
    async fn bot_summary_empty_ledger_is_zero_events() {
        let db = test_pool().await;
        let (bot_id, _key) = registered(&db).await;

        let summary = bot_summary(&db, &bot_id).await.unwrap();
        assert_eq!(summary.event_count, 0);
        assert!(summary.totals.is_empty());
    }

    #[tokio::test]
    async fn bot_summary_unknown_bot_is_not_found() {
        let db = test_pool().await;
        assert!(matches!(
            bot_summary(&db, "missing").await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn wallet_summary_names_contributing_bots() {
        let db = test_pool().await;
        let (bot_a, key_a) = registered(&db).await;
        let (bot_b, key_b) = registered(&db).await;

        ledger::record(&db, &key_a, 1.0, "USD", "ads", "W1").await.unwrap();
        ledger::record(&db, &key_b, 2.0, "USD", "ads", "W1").await.unwrap();
        ledger::record(&db, &key_b, 0.5, "BTC", "ads", "W1").await.unwrap();

        let summary = wallet_summary(&db, "W1").await.unwrap();
        assert_eq!(summary.wallet_address, "W1");
        assert_eq!(summary.totals.len(), 2);
        assert_eq!(summary.bot_ids.len(), 2);
        assert!(summary.bot_ids.contains(&bot_a));
        assert!(summary.bot_ids.contains(&bot_b));

        let empty = wallet_summary(&db, "unused").await.unwrap();
        assert!(empty.totals.is_empty());
        assert!(empty.bot_ids.is_empty());
    }
}
