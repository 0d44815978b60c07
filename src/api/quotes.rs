//! Quote routes.
//!
//! Same access model as albums: authenticated reads, owner-only
//! writes. Quotes have no timestamps and no creation notification.
//!
//! Routes:
//! - GET /quotes - List quotes (paginated, date descending)
//! - POST /quotes - Create a quote (owner forced to the caller)
//! - GET /quotes/:id - Get quote details
//! - PUT/PATCH /quotes/:id - Update quote (owner only)
//! - DELETE /quotes/:id - Delete quote (owner only)

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
use crate::api::validate::{self, FieldErrors, QUOTE_FIELDS};
use crate::db::{self, UpdateQuote};
use crate::middleware::{require_auth, AuthUser};
use crate::{AppState, Error, Result};

/// Build quote routes. All of them require an authenticated caller.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_quotes).post(create_quote))
        .route(
            "/:id",
            get(get_quote)
                .put(update_quote)
                .patch(update_quote)
                .delete(delete_quote),
        )
        .layer(middleware::from_fn_with_state(state, require_auth))
}

/// Quote response. The owner is rendered as their email address.
#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub id: i64,
    pub text: String,
    pub date: NaiveDate,
    pub owner: String,
}

impl From<db::Quote> for QuoteResponse {
    fn from(quote: db::Quote) -> Self {
        QuoteResponse {
            id: quote.id,
            text: quote.text,
            date: quote.date,
            owner: quote.owner_email,
        }
    }
}

/// List all quotes, newest date first.
///
/// GET /quotes
async fn list_quotes(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Page<QuoteResponse>>> {
    let count = db::count_quotes(&state.db).await?;
    let (limit, offset) = pagination::page_bounds(query.page, count)?;

    let quotes = db::list_quotes(&state.db, limit, offset).await?;
    let results = quotes.into_iter().map(QuoteResponse::from).collect();

    Ok(Json(pagination::envelope("/quotes", query.page, count, results)))
}

/// Create a new quote owned by the caller.
///
/// POST /quotes
async fn create_quote(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> Result<impl IntoResponse> {
    let payload = validate::require_object(&payload)?;

    let mut errors = FieldErrors::default();
    validate::check_required(payload, QUOTE_FIELDS, &mut errors);

    let text = validate::string_field(payload, "text", &mut errors);
    let date = validate::date_field(payload, "date", &mut errors);

    errors.into_result()?;

    let Some(text) = text else {
        return Err(Error::Validation("Invalid quote payload".to_string()));
    };

    let quote = db::create_quote(
        &state.db,
        db::CreateQuote {
            text,
            date: date.unwrap_or_else(|| Utc::now().date_naive()),
            owner_id: auth.user_id,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(QuoteResponse::from(quote))))
}

/// Get a quote by ID.
///
/// GET /quotes/:id
async fn get_quote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<QuoteResponse>> {
    let quote = db::get_quote(&state.db, id).await?;
    Ok(Json(QuoteResponse::from(quote)))
}

/// Update a quote. Owner only; partial or full replacement.
///
/// PUT/PATCH /quotes/:id
async fn update_quote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<Value>,
) -> Result<Json<QuoteResponse>> {
    let quote = db::get_quote(&state.db, id).await?;
    if !auth.owns(quote.owner_id) {
        return Err(Error::Forbidden);
    }

    let payload = validate::require_object(&payload)?;
    let mut errors = FieldErrors::default();

    let update = UpdateQuote {
        text: validate::string_field(payload, "text", &mut errors),
        date: validate::date_field(payload, "date", &mut errors),
    };

    errors.into_result()?;

    let quote = db::update_quote(&state.db, id, update).await?;
    Ok(Json(QuoteResponse::from(quote)))
}

/// Delete a quote. Owner only.
///
/// DELETE /quotes/:id
async fn delete_quote(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Extension(auth): Extension<AuthUser>,
) -> Result<impl IntoResponse> {
    let quote = db::get_quote(&state.db, id).await?;
    if !auth.owns(quote.owner_id) {
        return Err(Error::Forbidden);
    }

    db::delete_quote(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
