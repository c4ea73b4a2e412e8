//! Bot registry: registration, lookup, status transitions and filtered
//! listing
//!
//! Bots are never physically deleted; disabling is a status change so the
//! ledger's bot_id references always stay valid.

use chrono::Utc;
use sqlx::QueryBuilder;
use tracing::info;
use uuid::Uuid;

use crate::db::Db;
use crate::error::Error;
use crate::keys::KeyGenerator;
use crate::models::{Bot, BotFilter, BotStatus, RegisterBotRequest};

const DEFAULT_PAGE_SIZE: i64 = 100;

fn required(field: &'static str, value: &str) -> Result<(), Error> {
    if value.trim().is_empty() {
        return Err(Error::validation(field, "must not be blank"));
    }
    Ok(())
}

/// Create a bot with a fresh id, default active status and a newly issued
/// API key, in one transaction.
pub async fn register(
    db: &Db,
    keygen: &dyn KeyGenerator,
    attrs: RegisterBotRequest,
) -> Result<(Bot, String), Error> {
    required("country", &attrs.country)?;
    required("language", &attrs.language)?;
    required("category", &attrs.category)?;
    required("strategy", &attrs.strategy)?;

    let now = Utc::now();
    let bot = Bot {
        id: Uuid::new_v4().to_string(),
        country: attrs.country,
        language: attrs.language,
        category: attrs.category,
        strategy: attrs.strategy,
        status: BotStatus::Active,
        created_at: now,
        updated_at: now,
    };
    let api_key = keygen.generate();

    let mut tx = crate::db::begin_write(db).await?;
    sqlx::query(
        "INSERT INTO bots (id, country, language, category, strategy, status, api_key, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&bot.id)
    .bind(&bot.country)
    .bind(&bot.language)
    .bind(&bot.category)
    .bind(&bot.strategy)
    .bind(bot.status)
    .bind(&api_key)
    .bind(bot.created_at)
    .bind(bot.updated_at)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    info!("Registered bot {} ({}/{})", bot.id, bot.country, bot.strategy);
    Ok((bot, api_key))
}

pub async fn get(db: &Db, bot_id: &str) -> Result<Bot, Error> {
    let bot = sqlx::query_as::<_, Bot>(
        "SELECT id, country, language, category, strategy, status, created_at, updated_at
         FROM bots WHERE id = ?",
    )
    .bind(bot_id)
    .fetch_optional(db)
    .await?;

    bot.ok_or_else(|| Error::NotFound(bot_id.to_string()))
}

/// Administrative status transition. Every status is reachable from every
/// other; the ledger enforces that only active bots may append.
pub async fn update_status(db: &Db, bot_id: &str, status: BotStatus) -> Result<(), Error> {
    let result = sqlx::query("UPDATE bots SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(bot_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(bot_id.to_string()));
    }

    info!("Bot {} status -> {}", bot_id, status);
    Ok(())
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, sqlx::Sqlite>, filter: &'a BotFilter) {
    if let Some(country) = &filter.country {
        qb.push(" AND country = ").push_bind(country);
    }
    if let Some(language) = &filter.language {
        qb.push(" AND language = ").push_bind(language);
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
}

/// List bots matching any subset of country/language/category/status,
/// ordered by id ascending with limit/offset pagination.
pub async fn list(db: &Db, filter: &BotFilter) -> Result<Vec<Bot>, Error> {
    let mut qb: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
        "SELECT id, country, language, category, strategy, status, created_at, updated_at
         FROM bots WHERE 1 = 1",
    );
    push_filters(&mut qb, filter);

    qb.push(" ORDER BY id ASC");
    qb.push(" LIMIT ")
        .push_bind(filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(0));
    qb.push(" OFFSET ").push_bind(filter.offset.unwrap_or(0).max(0));

    let bots = qb.build_query_as::<Bot>().fetch_all(db).await?;
    Ok(bots)
}

/// Number of bots matching the filter, ignoring pagination. Pairs with
/// `list` so a caller can tell how many pages there are.
pub async fn count(db: &Db, filter: &BotFilter) -> Result<i64, Error> {
    let mut qb: QueryBuilder<sqlx::Sqlite> =
        QueryBuilder::new("SELECT COUNT(*) FROM bots WHERE 1 = 1");
    push_filters(&mut qb, filter);

    let total: i64 = qb.build_query_scalar().fetch_one(db).await?;
    Ok(total)
}
