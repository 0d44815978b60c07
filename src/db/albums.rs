//! Album database queries.
//!
//! Albums are owned records: the owner is assigned once at creation
//! and never changes. Reads always join the owner so responses can
//! show the owner's email without a second lookup.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{Error, Result};

use super::DbPool;

/// Album record joined with its owner's email.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub link_url: String,
    pub thumbnail_url: String,
    pub date: NaiveDate,
    pub owner_id: i64,
    pub owner_email: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Input for creating a new album. `owner_id` always comes from the
/// authenticated caller, never from the request payload.
#[derive(Debug, Clone)]
pub struct CreateAlbum {
    pub title: String,
    pub description: String,
    pub link_url: String,
    pub thumbnail_url: String,
    pub date: NaiveDate,
    pub owner_id: i64,
}

/// Input for updating an album. Absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateAlbum {
    pub title: Option<String>,
    pub description: Option<String>,
    pub link_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub date: Option<NaiveDate>,
}

const SELECT_ALBUM: &str = r#"
    SELECT a.id, a.title, a.description, a.link_url, a.thumbnail_url,
           a.date, a.owner_id, u.email AS owner_email,
           a.created_at, a.updated_at
    FROM albums a
    JOIN users u ON u.id = a.owner_id
"#;

/// Create a new album.
pub async fn create_album(pool: &DbPool, input: CreateAlbum) -> Result<Album> {
    let result = sqlx::query(
        r#"
        INSERT INTO albums (title, description, link_url, thumbnail_url, date, owner_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.link_url)
    .bind(&input.thumbnail_url)
    .bind(input.date)
    .bind(input.owner_id)
    .execute(pool)
    .await?;

    get_album(pool, result.last_insert_rowid()).await
}

/// Get an album by ID.
pub async fn get_album(pool: &DbPool, id: i64) -> Result<Album> {
    sqlx::query_as::<_, Album>(&format!("{} WHERE a.id = ?", SELECT_ALBUM))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Album not found: {}", id)))
}

/// List albums ordered by date descending, paginated.
///
/// Ties on the date break by insertion order so paging stays stable.
pub async fn list_albums(pool: &DbPool, limit: i64, offset: i64) -> Result<Vec<Album>> {
    sqlx::query_as::<_, Album>(&format!(
        "{} ORDER BY a.date DESC, a.id ASC LIMIT ? OFFSET ?",
        SELECT_ALBUM
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
    .map_err(Error::Database)
}

/// Count all albums (for pagination).
pub async fn count_albums(pool: &DbPool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM albums")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Update an album. Refreshes `updated_at`; `owner_id` is immutable.
pub async fn update_album(pool: &DbPool, id: i64, input: UpdateAlbum) -> Result<Album> {
    // Build dynamic update query
    let mut updates = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(title) = input.title {
        updates.push("title = ?");
        bindings.push(title);
    }
    if let Some(description) = input.description {
        updates.push("description = ?");
        bindings.push(description);
    }
    if let Some(link_url) = input.link_url {
        updates.push("link_url = ?");
        bindings.push(link_url);
    }
    if let Some(thumbnail_url) = input.thumbnail_url {
        updates.push("thumbnail_url = ?");
        bindings.push(thumbnail_url);
    }
    if let Some(date) = input.date {
        updates.push("date = ?");
        bindings.push(date.format("%Y-%m-%d").to_string());
    }

    if updates.is_empty() {
        return get_album(pool, id).await;
    }

    updates.push("updated_at = datetime('now')");

    let query = format!("UPDATE albums SET {} WHERE id = ?", updates.join(", "));

    let mut q = sqlx::query(&query);
    for binding in &bindings {
        q = q.bind(binding);
    }
    q = q.bind(id);

    let result = q.execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Album not found: {}", id)));
    }

    get_album(pool, id).await
}

/// Delete an album. Fails with NotFound if already absent.
pub async fn delete_album(pool: &DbPool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM albums WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Album not found: {}", id)));
    }

    Ok(())
}
