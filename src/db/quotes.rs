//! Quote database queries.
//!
//! Quotes share the album ownership model but carry no
//! created/updated timestamps; that asymmetry comes from the source
//! data model and is kept as-is.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{Error, Result};

use super::DbPool;

/// Quote record joined with its owner's email.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Quote {
    pub id: i64,
    pub text: String,
    pub date: NaiveDate,
    pub owner_id: i64,
    pub owner_email: String,
}

/// Input for creating a new quote.
#[derive(Debug, Clone)]
pub struct CreateQuote {
    pub text: String,
    pub date: NaiveDate,
    pub owner_id: i64,
}

/// Input for updating a quote. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateQuote {
    pub text: Option<String>,
    pub date: Option<NaiveDate>,
}

const SELECT_QUOTE: &str = r#"
    SELECT q.id, q.text, q.date, q.owner_id, u.email AS owner_email
    FROM quotes q
    JOIN users u ON u.id = q.owner_id
"#;

/// Create a new quote.
pub async fn create_quote(pool: &DbPool, input: CreateQuote) -> Result<Quote> {
    let result = sqlx::query("INSERT INTO quotes (text, date, owner_id) VALUES (?, ?, ?)")
        .bind(&input.text)
        .bind(input.date)
        .bind(input.owner_id)
        .execute(pool)
        .await?;

    get_quote(pool, result.last_insert_rowid()).await
}

/// Get a quote by ID.
pub async fn get_quote(pool: &DbPool, id: i64) -> Result<Quote> {
    sqlx::query_as::<_, Quote>(&format!("{} WHERE q.id = ?", SELECT_QUOTE))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Quote not found: {}", id)))
}

/// List quotes ordered by date descending, insertion-order ties,
/// paginated.
pub async fn list_quotes(pool: &DbPool, limit: i64, offset: i64) -> Result<Vec<Quote>> {
    sqlx::query_as::<_, Quote>(&format!(
        "{} ORDER BY q.date DESC, q.id ASC LIMIT ? OFFSET ?",
        SELECT_QUOTE
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Count all quotes (for pagination).
pub async fn count_quotes(pool: &DbPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM quotes")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Update a quote. `owner_id` is immutable.
pub async fn update_quote(pool: &DbPool, id: i64, input: UpdateQuote) -> Result<Quote> {
    let mut updates = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(text) = input.text {
        updates.push("text = ?");
        bindings.push(text);
    }
    if let Some(date) = input.date {
        updates.push("date = ?");
        bindings.push(date.format("%Y-%m-%d").to_string());
    }

    if updates.is_empty() {
        return get_quote(pool, id).await;
    }

    let query = format!("UPDATE quotes SET {} WHERE id = ?", updates.join(", "));

    let mut q = sqlx::query(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q = q.bind(id);

    let result = q.execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Quote not found: {}", id)));
    }

    get_quote(pool, id).await
}

/// Delete a quote. Fails with NotFound if already absent.
pub async fn delete_quote(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM quotes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Quote not found: {}", id)));
    }

    Ok(())
}
