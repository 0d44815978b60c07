//! Album routes.
//!
//! CRUD operations for albums. Reads are open to every authenticated
//! caller; writes to an existing album require ownership.
//!
//! Routes:
//! - GET /albums - List albums (paginated, date descending)
//! - POST /albums - Create an album (owner forced to the caller)
//! - GET /albums/:id - Get album details
//! - PUT/PATCH /albums/:id - Update album (owner only)
//! - DELETE /albums/:id - Delete album (owner only)

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::api::pagination::{self, Page, PageQuery};
use crate::api::validate::{self, FieldErrors, ALBUM_FIELDS};
use crate::db::{self, UpdateAlbum};
use crate::middleware::{require_auth, AuthUser};
use crate::{AppState, Error, Result};

/// Build album routes. All of them require an authenticated caller.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_albums).post(create_album))
        .route(
            "/:id",
            get(get_album)
                .put(update_album)
                .patch(update_album)
                .delete(delete_album),
        )
        .layer(middleware::from_fn_with_state(state, require_auth))
}

// ============================================================================
// Response Types
// ============================================================================

/// Album response. The owner is rendered as their email address.
#[derive(Debug, Serialize)]
pub struct AlbumResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub link_url: String,
    pub thumbnail_url: String,
    pub date: NaiveDate,
    pub owner: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<db::Album> for AlbumResponse {
    fn from(album: db::Album) -> Self {
        AlbumResponse {
            id: album.id,
            title: album.title,
            description: album.description,
            link_url: album.link_url,
            thumbnail_url: album.thumbnail_url,
            date: album.date,
            owner: album.owner_email,
            created_at: album.created_at,
            updated_at: album.updated_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// List all albums, newest date first.
///
/// GET /albums
async fn list_albums(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<AlbumResponse>>> {
    let count = db::count_albums(&state.db).await?;
    let (limit, offset) = pagination::page_bounds(query.page, count)?;

    let albums = db::list_albums(&state.db, limit, offset).await?;
    let results = albums.into_iter().map(AlbumResponse::from).collect();

    Ok(Json(pagination::envelope("/albums", query.page, count, results)))
}

/// Create a new album owned by the caller.
///
/// POST /albums
///
/// The owner always comes from the session; an `owner` value in the
/// payload is ignored. A missing `date` defaults to today. On success
/// the webhook notifier fires, without affecting the response.
async fn create_album(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let payload = validate::require_object(&payload)?;

    let mut errors = FieldErrors::default();
    validate::check_required(payload, ALBUM_FIELDS, &mut errors);

    let title = validate::string_field(payload, "title", &mut errors);
    let description = validate::string_field(payload, "description", &mut errors);
    let link_url = validate::url_field(payload, "link_url", &mut errors);
    let thumbnail_url = validate::url_field(payload, "thumbnail_url", &mut errors);
    let date = validate::date_field(payload, "date", &mut errors);

    errors.into_result()?;

    // All required fields validated above
    let (Some(title), Some(description), Some(link_url), Some(thumbnail_url)) =
        (title, description, link_url, thumbnail_url)
    else {
        return Err(Error::Validation("Invalid album payload".to_string()));
    };

    let album = db::create_album(
        &state.db,
        db::CreateAlbum {
            title,
            description,
            link_url,
            thumbnail_url,
            date: date.unwrap_or_else(|| Utc::now().date_naive()),
            owner_id: auth.user_id,
        },
    )
    .await?;

    // Fire-and-forget: never blocks or fails the creation
    state.notifier.album_created(&album.title, &album.owner_email);

    Ok((StatusCode::CREATED, Json(AlbumResponse::from(album))))
}

/// Get an album by ID.
///
/// GET /albums/:id
async fn get_album(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AlbumResponse>> {
    let album = db::get_album(&state.db, id).await?;
    Ok(Json(AlbumResponse::from(album)))
}

/// Update an album. Owner only; partial or full replacement.
///
/// PUT/PATCH /albums/:id
async fn update_album(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> Result<Json<AlbumResponse>> {
    // Existence first: 404 beats 403 for absent records
    let album = db::get_album(&state.db, id).await?;
    if !auth.owns(album.owner_id) {
        return Err(Error::Forbidden);
    }

    let payload = validate::require_object(&payload)?;
    let mut errors = FieldErrors::default();

    let update = UpdateAlbum {
        title: validate::string_field(payload, "title", &mut errors),
        description: validate::string_field(payload, "description", &mut errors),
        link_url: validate::url_field(payload, "link_url", &mut errors),
        thumbnail_url: validate::url_field(payload, "thumbnail_url", &mut errors),
        date: validate::date_field(payload, "date", &mut errors),
    };

    errors.into_result()?;

    let album = db::update_album(&state.db, id, update).await?;
    Ok(Json(AlbumResponse::from(album)))
}

/// Delete an album. Owner only.
///
/// DELETE /albums/:id
async fn delete_album(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let album = db::get_album(&state.db, id).await?;
    if !auth.owns(album.owner_id) {
        return Err(Error::Forbidden);
    }

    db::delete_album(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
