//! HTTP-level tests for the event routes.
//!
//! The router runs against the in-memory store and a temporary upload
//! directory; requests are driven with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use eventhub_server::auth::SessionTokenProvider;
use eventhub_server::config::Config;
use eventhub_server::models::User;
use eventhub_server::routes::create_routes;
use eventhub_server::services::{EventService, EventSettings};
use eventhub_server::storage::{InMemoryEventStore, LocalFileUploader};
use eventhub_server::AppState;

const BOUNDARY: &str = "X-EVENTHUB-BOUNDARY";

struct TestApp {
    app: Router,
    store: Arc<InMemoryEventStore>,
    uploads: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let uploads = tempfile::tempdir().unwrap();
        let config = Config {
            upload_dir: uploads.path().to_path_buf(),
            max_upload_bytes: 1024,
            ..Config::default()
        };

        let state = AppState {
            events: EventService::new(
                store.clone(),
                Arc::new(LocalFileUploader::new(&config.upload_dir)),
                EventSettings::from(&config),
            ),
            identity: Arc::new(SessionTokenProvider::new(store.clone())),
            max_upload_bytes: config.max_upload_bytes,
        };

        Self {
            app: create_routes(state, &config),
            store,
            uploads,
        }
    }

    /// Registers a user with a live session and returns its bearer token.
    fn login(&self, name: &str) -> (User, String) {
        let user = User::new(name, format!("{}@example.com", name.to_lowercase()));
        let token = format!("token-{}", user.id);
        self.store.insert_user(user.clone());
        self.store
            .insert_session(token.clone(), user.id, Utc::now() + Duration::hours(1));
        (user, token)
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(Method::POST).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    async fn upload(
        &self,
        event_id: &str,
        token: Option<&str>,
        field: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
                 filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(format!("/events/{}/upload", event_id));
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn create_meetup(&self, token: &str, is_private: bool) -> String {
        let (status, body) = self
            .post(
                "/events/create",
                Some(token),
                Some(json!({
                    "title": "Meetup",
                    "description": "Rust evening",
                    "startDate": "01.06.2024",
                    "endDate": "02.06.2024",
                    "location": "Sofia",
                    "isPrivate": is_private,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

fn ids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

// ============================================================================
// Creation and listing
// ============================================================================

#[tokio::test]
async fn test_created_public_event_is_listed_with_creator_as_member() {
    let app = TestApp::new();
    let (creator, token) = app.login("Ana");

    let event_id = app.create_meetup(&token, false).await;

    let (status, body) = app.get("/events/public", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![event_id.clone()]);

    let (status, body) = app.get(&format!("/events/{}/members", event_id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![creator.id.to_string()]);
    assert_eq!(body["data"][0]["name"], "Ana");
    assert!(body["data"][0].get("email").is_none());
}

#[tokio::test]
async fn test_private_events_only_show_up_in_closeby() {
    let app = TestApp::new();
    let (_, token) = app.login("Ana");
    let private_id = app.create_meetup(&token, true).await;

    let (_, body) = app.get("/events/public", None).await;
    assert!(ids(&body).is_empty());

    let (status, body) = app.get("/events/closeby", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![private_id]);
}

#[tokio::test]
async fn test_closeby_with_coordinates() {
    let app = TestApp::new();
    let (_, token) = app.login("Ana");
    let event_id = app.create_meetup(&token, false).await;

    let (status, body) = app.get("/events/closeby?lat=42.05&lon=21.05", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![event_id]);

    let (_, body) = app
        .get("/events/closeby?lat=51.5&lon=-0.12&radius_km=10", None)
        .await;
    assert!(ids(&body).is_empty());

    let (status, _) = app.get("/events/closeby?lat=north", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_requires_session_and_valid_payload() {
    let app = TestApp::new();
    let (_, token) = app.login("Ana");
    let payload = json!({
        "title": "Meetup",
        "description": "Rust evening",
        "startDate": "01.06.2024",
        "endDate": "02.06.2024",
        "location": "Sofia",
        "isPrivate": false,
    });

    let (status, body) = app.post("/events/create", None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let mut bad_date = payload.clone();
    bad_date["startDate"] = json!("2024-06-01");
    let (status, _) = app.post("/events/create", Some(&token), Some(bad_date)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut missing = payload.clone();
    missing.as_object_mut().unwrap().remove("isPrivate");
    let (status, _) = app.post("/events/create", Some(&token), Some(missing)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post("/events/create", Some(&token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["start_date"], "2024-06-01");
}

// ============================================================================
// Membership
// ============================================================================

#[tokio::test]
async fn test_join_then_rejoin() {
    let app = TestApp::new();
    let (creator, creator_token) = app.login("Ana");
    let (guest, guest_token) = app.login("Boris");
    let event_id = app.create_meetup(&creator_token, false).await;
    let join_uri = format!("/events/{}/join", event_id);

    let (status, body) = app.post(&join_uri, Some(&guest_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], event_id.as_str());

    let (_, body) = app.get(&format!("/events/{}/members", event_id), None).await;
    assert_eq!(ids(&body), vec![creator.id.to_string(), guest.id.to_string()]);

    let (status, body) = app.post(&join_uri, Some(&guest_token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_join_errors() {
    let app = TestApp::new();
    let (_, token) = app.login("Ana");

    let unknown = format!("/events/{}/join", uuid::Uuid::new_v4());
    let (status, _) = app.post(&unknown, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.post("/events/not-an-id/join", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.post(&unknown, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");

    let (status, _) = app.post(&unknown, Some("expired-or-forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_members_of_unknown_event_is_bad_request() {
    let app = TestApp::new();
    let uri = format!("/events/{}/members", uuid::Uuid::new_v4());
    let (status, _) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Assets
// ============================================================================

#[tokio::test]
async fn test_upload_and_list_assets() {
    let app = TestApp::new();
    let (_, creator_token) = app.login("Ana");
    let (_, guest_token) = app.login("Boris");
    let event_id = app.create_meetup(&creator_token, false).await;
    app.post(&format!("/events/{}/join", event_id), Some(&guest_token), None)
        .await;

    let (status, body) = app.upload(&event_id, Some(&creator_token), "file", b"\x89PNG").await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);

    let name = body["data"]["name"].as_str().unwrap();
    let url = body["data"]["url"].as_str().unwrap();
    assert_eq!(url, format!("assets/{}/{}", event_id, name));
    assert!(name.ends_with(".png"));
    assert_eq!(std::fs::read(app.uploads.path().join(url)).unwrap(), b"\x89PNG");

    let (status, body) = app
        .get(&format!("/events/{}/assets", event_id), Some(&guest_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["url"], url);
}

#[tokio::test]
async fn test_non_participant_is_rejected() {
    let app = TestApp::new();
    let (_, creator_token) = app.login("Ana");
    let (_, outsider_token) = app.login("Eve");
    let event_id = app.create_meetup(&creator_token, false).await;

    let (status, body) = app
        .get(&format!("/events/{}/assets", event_id), Some(&outsider_token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (status, _) = app.upload(&event_id, Some(&outsider_token), "file", b"data").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get(&format!("/events/{}/assets", event_id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_upload_rejects_missing_empty_and_oversized_files() {
    let app = TestApp::new();
    let (_, token) = app.login("Ana");
    let event_id = app.create_meetup(&token, false).await;

    let (status, _) = app.upload(&event_id, Some(&token), "attachment", b"data").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.upload(&event_id, Some(&token), "file", b"").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.upload(&event_id, Some(&token), "file", &[7u8; 4096]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = app
        .get(&format!("/events/{}/assets", event_id), Some(&token))
        .await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_responses_carry_security_headers() {
    let app = TestApp::new();
    let response = app
        .app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
}

#[tokio::test]
async fn test_anonymous_upload_resolves_event_first() {
    let app = TestApp::new();
    let (_, token) = app.login("Ana");
    let event_id = app.create_meetup(&token, false).await;

    let unknown = uuid::Uuid::new_v4().to_string();
    let (status, body) = app.upload(&unknown, None, "file", b"data").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, body) = app.upload(&event_id, None, "file", b"data").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTH_ERROR");

    let (status, _) = app.upload(&event_id, Some("forged"), "file", b"data").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
