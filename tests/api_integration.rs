//! API Integration Tests for the Dantrum server.
//!
//! Tests the REST API endpoints using axum-test with in-memory SQLite
//! and a wiremock sink standing in for the notification webhook.

use axum::http::StatusCode;
use axum::Router;
use axum_test::{TestServer, TestServerConfig};
use dantrum::db::{self, DbPool};
use dantrum::services::{AuthService, Notifier};
use dantrum::{api, AppState};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Test Setup Helpers
// ============================================================================

/// Create a test database with the schema applied.
async fn setup_test_db() -> DbPool {
    let pool = db::init_pool(":memory:")
        .await
        .expect("Failed to create test database");
    db::initialize_schema(&pool)
        .await
        .expect("Failed to initialize schema");
    pool
}

/// Build the full application router over the given state.
fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(api::routes(state.clone()))
        .with_state(state)
}

/// Spawn a test server that persists cookies across requests.
fn test_server(app: Router) -> TestServer {
    let config = TestServerConfig {
        save_cookies: true,
        ..TestServerConfig::default()
    };
    TestServer::new_with_config(app, config).expect("Failed to start test server")
}

/// Register an account and log the server's cookie jar into it.
async fn register_and_login(server: &TestServer, email: &str) {
    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": email,
            "date_of_birth": "1990-01-01",
            "password": "testpass",
        }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": email, "password": "testpass" }))
        .await;
    response.assert_status_ok();
}

fn album_payload(title: &str, date: &str) -> Value {
    json!({
        "title": title,
        "description": "New Description",
        "link_url": "http://new.com",
        "thumbnail_url": "http://new.com/thumbnail.jpg",
        "date": date,
    })
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_register_login_me_roundtrip() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "Me@Test.COM").await;

    let response = server.get("/users/me").await;
    response.assert_status_ok();

    let body: Value = response.json();
    // Domain part of the email is normalized at registration
    assert_eq!(body["email"], "Me@test.com");
    assert_eq!(body["is_admin"], false);
    assert_eq!(body["is_staff"], false);
    assert_eq!(body["date_of_birth"], "1990-01-01");
    assert!(!body["last_login"].is_null());
}

#[tokio::test]
async fn test_login_with_wrong_password_is_forbidden() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    server
        .post("/auth/register")
        .json(&json!({
            "email": "a@test.com",
            "date_of_birth": "1990-01-01",
            "password": "testpass",
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": "a@test.com", "password": "wrong" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_registration_is_field_error() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    let payload = json!({
        "email": "dup@test.com",
        "date_of_birth": "1990-01-01",
        "password": "testpass",
    });
    server
        .post("/auth/register")
        .json(&payload)
        .await
        .assert_status(StatusCode::CREATED);

    let response = server.post("/auth/register").json(&payload).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["email"].is_array());
}

#[tokio::test]
async fn test_register_missing_fields_is_field_error() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    // No date_of_birth
    let response = server
        .post("/auth/register")
        .json(&json!({ "email": "new@test.com", "password": "testpass" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["date_of_birth"].is_array());

    // Mistyped date_of_birth
    let response = server
        .post("/auth/register")
        .json(&json!({
            "email": "new@test.com",
            "date_of_birth": "01/01/1990",
            "password": "testpass",
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"]["fields"]["date_of_birth"].is_array());
}

#[tokio::test]
async fn test_login_missing_password_is_field_error() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    let response = server
        .post("/auth/login")
        .json(&json!({ "email": "a@test.com" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["password"].is_array());
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "out@test.com").await;
    server.get("/users/me").await.assert_status_ok();

    server.post("/auth/logout").await.assert_status_ok();

    let response = server.get("/users/me").await;
    response.assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Albums
// ============================================================================

#[tokio::test]
async fn test_create_and_list_album() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "a@test.com").await;

    let response = server
        .post("/albums")
        .json(&album_payload("Test Album", "2024-05-29"))
        .await;
    response.assert_status(StatusCode::CREATED);

    let created: Value = response.json();
    assert_eq!(created["title"], "Test Album");
    assert_eq!(created["owner"], "a@test.com");
    assert!(!created["created_at"].as_str().unwrap().is_empty());

    let response = server.get("/albums").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["count"], 1);
    assert!(body["next"].is_null());
    assert!(body["previous"].is_null());
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["title"], "Test Album");
    assert_eq!(results[0]["owner"], "a@test.com");
}

#[tokio::test]
async fn test_list_albums_ordered_by_date_descending() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "a@test.com").await;

    server
        .post("/albums")
        .json(&album_payload("Album 2", "2024-05-28"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/albums")
        .json(&album_payload("Album 1", "2024-05-29"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/albums")
        .json(&album_payload("Album 3", "2024-05-29"))
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = server.get("/albums").await.json();
    let titles: Vec<&str> = body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();

    // Date descending, same-date ties in insertion order
    assert_eq!(titles, vec!["Album 1", "Album 3", "Album 2"]);
}

#[tokio::test]
async fn test_create_album_ignores_client_supplied_owner() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "real@test.com").await;

    let mut payload = album_payload("Mine", "2024-05-29");
    payload["owner"] = json!("imposter@test.com");

    let response = server.post("/albums").json(&payload).await;
    response.assert_status(StatusCode::CREATED);

    let created: Value = response.json();
    assert_eq!(created["owner"], "real@test.com");
}

#[tokio::test]
async fn test_create_album_missing_fields() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "a@test.com").await;

    let response = server.post("/albums").json(&json!({ "title": "New Album" })).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    assert!(body["error"]["fields"]["description"].is_array());
    assert!(body["error"]["fields"]["link_url"].is_array());
    assert!(body["error"]["fields"]["thumbnail_url"].is_array());
}

#[tokio::test]
async fn test_album_date_defaults_to_today() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "a@test.com").await;

    let mut payload = album_payload("Undated", "2024-05-29");
    payload.as_object_mut().unwrap().remove("date");

    let response = server.post("/albums").json(&payload).await;
    response.assert_status(StatusCode::CREATED);

    let created: Value = response.json();
    let today = chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(created["date"], today.as_str());
}

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    let response = server
        .post("/albums")
        .json(&album_payload("New Album", "2024-05-29"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // Same status as an ownership failure, but a distinct code
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

    server.get("/albums").await.assert_status(StatusCode::FORBIDDEN);
    server.get("/users").await.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_update_and_delete_restricted_to_owner() {
    let pool = setup_test_db().await;
    let app = build_app(AppState::with_pool(pool));

    let owner = test_server(app.clone());
    register_and_login(&owner, "testuser@test.com").await;

    let created: Value = owner
        .post("/albums")
        .json(&album_payload("Test Album", "2024-05-29"))
        .await
        .json();
    let album_id = created["id"].as_i64().unwrap();

    let other = test_server(app);
    register_and_login(&other, "seconduser@test.com").await;

    // Another user can read
    other
        .get(&format!("/albums/{}", album_id))
        .await
        .assert_status_ok();

    // But not mutate
    other
        .put(&format!("/albums/{}", album_id))
        .json(&json!({ "title": "Updated Album" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
    other
        .delete(&format!("/albums/{}", album_id))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    // The owner can
    let response = owner
        .put(&format!("/albums/{}", album_id))
        .json(&json!({ "title": "Updated Album" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["title"], "Updated Album");
    assert_eq!(updated["description"], "New Description");

    owner
        .delete(&format!("/albums/{}", album_id))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    // Idempotent failure: already gone
    owner
        .delete(&format!("/albums/{}", album_id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_missing_album_is_not_found() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "a@test.com").await;

    let response = server.get("/albums/999").await;
    response.assert_status(StatusCode::NOT_FOUND);

    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_album_creation_notifies_webhook() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let pool = setup_test_db().await;
    let state = AppState {
        auth: AuthService::new(pool.clone()),
        notifier: Notifier::with_url(Some(format!("{}/hook", mock_server.uri()))),
        db: pool,
    };
    let server = test_server(build_app(state));

    register_and_login(&server, "a@test.com").await;
    server
        .post("/albums")
        .json(&album_payload("Announced", "2024-05-29"))
        .await
        .assert_status(StatusCode::CREATED);

    // The notification is fire-and-forget; give the spawned task a
    // moment to deliver
    let mut delivered = Vec::new();
    for _ in 0..50 {
        delivered = mock_server.received_requests().await.unwrap_or_default();
        if !delivered.is_empty() {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    assert_eq!(delivered.len(), 1);

    let body: Value = serde_json::from_slice(&delivered[0].body).unwrap();
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("Announced"));
    assert!(text.contains("a@test.com"));
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_creation() {
    // Unroutable webhook: every delivery attempt fails
    let pool = setup_test_db().await;
    let state = AppState {
        auth: AuthService::new(pool.clone()),
        notifier: Notifier::with_url(Some("http://127.0.0.1:1/hook".to_string())),
        db: pool,
    };
    let server = test_server(build_app(state));

    register_and_login(&server, "a@test.com").await;
    server
        .post("/albums")
        .json(&album_payload("Still Created", "2024-05-29"))
        .await
        .assert_status(StatusCode::CREATED);

    let body: Value = server.get("/albums").await.json();
    assert_eq!(body["count"], 1);
}

// ============================================================================
// Quotes
// ============================================================================

#[tokio::test]
async fn test_quote_crud_roundtrip() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "q@test.com").await;

    let response = server
        .post("/quotes")
        .json(&json!({ "text": "Talk is cheap.", "date": "2024-05-29" }))
        .await;
    response.assert_status(StatusCode::CREATED);

    let created: Value = response.json();
    assert_eq!(created["text"], "Talk is cheap.");
    assert_eq!(created["owner"], "q@test.com");
    // Quotes carry no timestamps
    assert!(created.get("created_at").is_none());

    let quote_id = created["id"].as_i64().unwrap();

    let response = server
        .patch(&format!("/quotes/{}", quote_id))
        .json(&json!({ "text": "Show me the code." }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["text"], "Show me the code.");
    assert_eq!(updated["date"], "2024-05-29");

    server
        .delete(&format!("/quotes/{}", quote_id))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let body: Value = server.get("/quotes").await.json();
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_quote_missing_text_is_field_error() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "q@test.com").await;

    let response = server.post("/quotes").json(&json!({ "date": "2024-05-29" })).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let body: Value = response.json();
    assert!(body["error"]["fields"]["text"].is_array());
}

#[tokio::test]
async fn test_quote_write_restricted_to_owner() {
    let pool = setup_test_db().await;
    let app = build_app(AppState::with_pool(pool));

    let owner = test_server(app.clone());
    register_and_login(&owner, "owner@test.com").await;

    let created: Value = owner
        .post("/quotes")
        .json(&json!({ "text": "Mine", "date": "2024-05-29" }))
        .await
        .json();
    let quote_id = created["id"].as_i64().unwrap();

    let other = test_server(app);
    register_and_login(&other, "other@test.com").await;

    other
        .patch(&format!("/quotes/{}", quote_id))
        .json(&json!({ "text": "Stolen" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_user_list_uses_public_serialization() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    server
        .post("/auth/register")
        .json(&json!({
            "email": "visible@test.com",
            "nickname": "Vis",
            "date_of_birth": "1990-01-01",
            "password": "testpass",
        }))
        .await
        .assert_status(StatusCode::CREATED);

    register_and_login(&server, "viewer@test.com").await;

    let body: Value = server.get("/users").await.json();
    assert_eq!(body["count"], 2);
    let results = body["results"].as_array().unwrap();
    // Public view: id + nickname only, no email
    assert!(results[0].get("email").is_none());
    assert_eq!(results[0]["nickname"], "Vis");

    let user_id = results[0]["id"].as_i64().unwrap();
    let detail: Value = server.get(&format!("/users/{}", user_id)).await.json();
    assert!(detail.get("email").is_none());
}

#[tokio::test]
async fn test_inactive_users_hidden_from_directory() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool.clone())));

    server
        .post("/auth/register")
        .json(&json!({
            "email": "inactive@test.com",
            "date_of_birth": "1990-01-01",
        }))
        .await
        .assert_status(StatusCode::CREATED);

    let hidden = db::get_user_by_email(&pool, "inactive@test.com")
        .await
        .unwrap()
        .unwrap();
    sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?")
        .bind(hidden.id)
        .execute(&pool)
        .await
        .unwrap();

    register_and_login(&server, "viewer@test.com").await;

    let body: Value = server.get("/users").await.json();
    assert_eq!(body["count"], 1);

    server
        .get(&format!("/users/{}", hidden.id))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_user_cascades_to_content() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool.clone())));

    register_and_login(&server, "doomed@test.com").await;
    server
        .post("/albums")
        .json(&album_payload("Cascade Album", "2024-05-29"))
        .await
        .assert_status(StatusCode::CREATED);
    server
        .post("/quotes")
        .json(&json!({ "text": "Cascade quote" }))
        .await
        .assert_status(StatusCode::CREATED);

    let user = db::get_user_by_email(&pool, "doomed@test.com")
        .await
        .unwrap()
        .unwrap();
    db::delete_user(&pool, user.id).await.unwrap();

    assert_eq!(db::count_albums(&pool).await.unwrap(), 0);
    assert_eq!(db::count_quotes(&pool).await.unwrap(), 0);
    // The session went with the user too
    server.get("/users/me").await.assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Pagination
// ============================================================================

#[tokio::test]
async fn test_album_pagination_envelope() {
    let pool = setup_test_db().await;
    let server = test_server(build_app(AppState::with_pool(pool)));

    register_and_login(&server, "pages@test.com").await;

    // Default page size is 10; create 12 albums on distinct dates
    for day in 1..=12 {
        server
            .post("/albums")
            .json(&album_payload(
                &format!("Album {}", day),
                &format!("2024-05-{:02}", day),
            ))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let body: Value = server.get("/albums").await.json();
    assert_eq!(body["count"], 12);
    assert_eq!(body["results"].as_array().unwrap().len(), 10);
    assert!(body["next"].as_str().unwrap().contains("/albums?page=2"));
    assert!(body["previous"].is_null());

    let body: Value = server.get("/albums").add_query_param("page", 2).await.json();
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert!(body["next"].is_null());
    assert!(body["previous"].as_str().unwrap().contains("/albums?page=1"));

    // Pages past the end are 404
    server
        .get("/albums")
        .add_query_param("page", 3)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
