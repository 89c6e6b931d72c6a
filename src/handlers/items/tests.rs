use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Request, StatusCode,
    },
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::app::app;
use crate::auth::Claims;
use crate::config::AppConfig;
use crate::database::models::{Item, ItemChanges, NewItem};
use crate::database::{DatabaseError, ItemStore, MemoryItemStore};
use crate::media::{ImageFormat, MediaError, MediaStore, MemoryMediaStore, Upload};
use crate::state::AppState;

const SECRET: &str = "handler-test-secret";
const BOUNDARY: &str = "lostfoundtestboundary";

struct Harness {
    state: AppState,
    store: MemoryItemStore,
    media: MemoryMediaStore,
}

fn config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.jwt_secret = SECRET.to_string();
    config
}

fn harness() -> Harness {
    harness_with(config())
}

fn harness_with(config: AppConfig) -> Harness {
    let store = MemoryItemStore::new();
    let media = MemoryMediaStore::new("lost_found_items");
    let state = AppState::new(config, Arc::new(store.clone()), Arc::new(media.clone()));
    Harness { state, store, media }
}

impl Harness {
    fn token(&self, subject: &str) -> String {
        let token = self.state.verifier.sign(&Claims::new(subject)).unwrap();
        format!("Bearer {}", token)
    }

    async fn create_wallet(&self, subject: &str) -> Value {
        let (status, body) = send(
            &self.state,
            json_request(
                "POST",
                "/api/items",
                Some(&self.token(subject)),
                json!({ "title": "Wallet", "description": "Black leather", "location": "Library" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body
    }
}

async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = app(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, token);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, token);
    }
    builder.body(Body::empty()).unwrap()
}

fn multipart_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    fields: &[(&str, &str)],
    image: Option<(&str, &str, &[u8])>,
) -> Request<Body> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, content_type, bytes)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, token);
    }
    builder.body(Body::from(body)).unwrap()
}

fn item_uri(body: &Value) -> String {
    format!("/api/items/{}", body["id"].as_str().unwrap())
}

// ---- create ----

#[tokio::test]
async fn create_without_token_is_401_and_persists_nothing() {
    let h = harness();
    let (status, body) = send(
        &h.state,
        json_request("POST", "/api/items", None, json!({ "title": "Wallet", "description": "d", "location": "l" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "message": "Access denied. No token provided." }));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn create_with_invalid_token_is_400_and_persists_nothing() {
    let h = harness();
    let (status, body) = send(
        &h.state,
        json_request(
            "POST",
            "/api/items",
            Some("Bearer definitely.not.valid"),
            json!({ "title": "Wallet", "description": "d", "location": "l" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Invalid token" }));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn bearer_prefix_without_token_is_400() {
    let h = harness();
    for credential in ["Bearer ", "Bearer    ", "Bearer"] {
        let (status, body) = send(
            &h.state,
            json_request(
                "POST",
                "/api/items",
                Some(credential),
                json!({ "title": "Wallet", "description": "d", "location": "l" }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "credential {:?}", credential);
        assert_eq!(body, json!({ "message": "Invalid token" }));
    }
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn oversized_multipart_is_413() {
    let mut config = config();
    config.server.max_request_size_bytes = 1024;
    let h = harness_with(config);

    let description = "x".repeat(4096);
    let (status, body) = send(
        &h.state,
        multipart_request(
            "POST",
            "/api/items",
            Some(&h.token("u1")),
            &[("title", "Wallet"), ("description", description.as_str()), ("location", "Library")],
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body, json!({ "message": "Request body too large" }));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn oversized_json_is_413() {
    let mut config = config();
    config.server.max_request_size_bytes = 1024;
    let h = harness_with(config);

    let (status, _) = send(
        &h.state,
        json_request(
            "POST",
            "/api/items",
            Some(&h.token("u1")),
            json!({ "title": "Wallet", "description": "x".repeat(4096), "location": "Library" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn multipart_without_boundary_is_400() {
    let h = harness();
    let request = Request::builder()
        .method("POST")
        .uri("/api/items")
        .header(AUTHORIZATION, h.token("u1"))
        .header(CONTENT_TYPE, "multipart/form-data")
        .body(Body::from("title=Wallet"))
        .unwrap();

    let (status, _) = send(&h.state, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn gate_runs_before_body_parsing() {
    let h = harness();
    let request = Request::builder()
        .method("POST")
        .uri("/api/items")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let (status, _) = send(&h.state, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_takes_owner_from_token_not_body() {
    let h = harness();
    let (status, body) = send(
        &h.state,
        json_request(
            "POST",
            "/api/items",
            Some(&h.token("u1")),
            json!({
                "title": "Wallet",
                "description": "Black leather",
                "location": "Library",
                "owner": "u2",
                "user": "u2",
                "mediaUrl": "https://elsewhere.example/x.png"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner"], "u1");
    assert_eq!(body["status"], "lost");
    assert_eq!(body["mediaUrl"], Value::Null);
    assert!(body["date"].is_string());
}

#[tokio::test]
async fn create_multipart_with_photo() {
    let h = harness();
    let (status, body) = send(
        &h.state,
        multipart_request(
            "POST",
            "/api/items",
            Some(&h.token("u1")),
            &[("title", "Keys"), ("description", "Three keys on a ring"), ("location", "Gym"), ("status", "found")],
            Some(("keys.jpg", "image/jpeg", &b"\xff\xd8\xff\xe0fakejpeg"[..])),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["status"], "found");
    let url = body["mediaUrl"].as_str().unwrap();
    assert!(url.starts_with("memory://lost_found_items/"));
    assert!(h.media.get(url).await.is_some());
}

#[tokio::test]
async fn create_multipart_without_photo() {
    let h = harness();
    let (status, body) = send(
        &h.state,
        multipart_request(
            "POST",
            "/api/items",
            Some(&h.token("u1")),
            &[("title", "Umbrella"), ("description", "Blue"), ("location", "Cafe"), ("owner", "u9")],
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["owner"], "u1");
    assert_eq!(body["mediaUrl"], Value::Null);
    assert_eq!(h.media.len().await, 0);
}

#[tokio::test]
async fn create_with_missing_fields_is_400() {
    let h = harness();
    let (status, body) = send(
        &h.state,
        json_request("POST", "/api/items", Some(&h.token("u1")), json!({ "title": "Wallet" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("description"));
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn create_with_unknown_status_is_400() {
    let h = harness();
    let (status, _) = send(
        &h.state,
        json_request(
            "POST",
            "/api/items",
            Some(&h.token("u1")),
            json!({ "title": "Wallet", "description": "d", "location": "l", "status": "stolen" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(h.store.is_empty().await);
}

#[tokio::test]
async fn create_with_unsupported_image_is_400() {
    let h = harness();
    let (status, body) = send(
        &h.state,
        multipart_request(
            "POST",
            "/api/items",
            Some(&h.token("u1")),
            &[("title", "Keys"), ("description", "d"), ("location", "l")],
            Some(("keys.gif", "image/gif", &b"GIF89a"[..])),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("gif"));
    assert!(h.store.is_empty().await);
    assert_eq!(h.media.len().await, 0);
}

// ---- list / show ----

#[tokio::test]
async fn list_and_show_are_public() {
    let h = harness();
    let created = h.create_wallet("u1").await;

    let (status, body) = send(&h.state, empty_request("GET", "/api/items", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = send(&h.state, empty_request("GET", &item_uri(&created), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);
}

#[tokio::test]
async fn list_includes_every_owner() {
    let h = harness();
    h.create_wallet("u1").await;
    h.create_wallet("u2").await;

    let (status, body) = send(&h.state, empty_request("GET", "/api/items", None)).await;
    assert_eq!(status, StatusCode::OK);
    let mut owners: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["owner"].as_str().unwrap())
        .collect();
    owners.sort_unstable();
    assert_eq!(owners, vec!["u1", "u2"]);
}

#[tokio::test]
async fn show_unknown_id_is_404() {
    let h = harness();
    let uri = format!("/api/items/{}", Uuid::new_v4());
    let (status, body) = send(&h.state, empty_request("GET", &uri, None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Item not found" }));

    let (status, _) = send(&h.state, empty_request("GET", "/api/items/not-a-uuid", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn repeated_show_is_identical() {
    let h = harness();
    let created = h.create_wallet("u1").await;

    let (_, first) = send(&h.state, empty_request("GET", &item_uri(&created), None)).await;
    let (_, second) = send(&h.state, empty_request("GET", &item_uri(&created), None)).await;
    assert_eq!(first, second);
}

// ---- update ----

#[tokio::test]
async fn update_by_non_owner_is_403_and_unchanged() {
    let h = harness();
    let created = h.create_wallet("u1").await;

    let (status, body) = send(
        &h.state,
        json_request("PUT", &item_uri(&created), Some(&h.token("u2")), json!({ "title": "Mine now" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "message": "Unauthorized" }));

    let (_, after) = send(&h.state, empty_request("GET", &item_uri(&created), None)).await;
    assert_eq!(after, created);
}

#[tokio::test]
async fn update_of_missing_item_is_404() {
    let h = harness();
    let uri = format!("/api/items/{}", Uuid::new_v4());
    let (status, _) = send(&h.state, json_request("PUT", &uri, Some(&h.token("u1")), json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_without_token_is_401() {
    let h = harness();
    let created = h.create_wallet("u1").await;
    let (status, _) = send(&h.state, json_request("PUT", &item_uri(&created), None, json!({ "title": "x" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn update_overwrites_given_fields_only() {
    let h = harness();
    let created = h.create_wallet("u1").await;

    let (status, body) = send(
        &h.state,
        json_request(
            "PUT",
            &item_uri(&created),
            Some(&h.token("u1")),
            json!({ "status": "found", "owner": "u2", "user": "u2", "id": Uuid::new_v4() }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "found");
    assert_eq!(body["owner"], "u1");
    assert_eq!(body["id"], created["id"]);
    assert_eq!(body["title"], created["title"]);
    assert_eq!(body["date"], created["date"]);
}

#[tokio::test]
async fn update_rejects_unknown_status() {
    let h = harness();
    let created = h.create_wallet("u1").await;

    let (status, _) = send(
        &h.state,
        json_request("PUT", &item_uri(&created), Some(&h.token("u1")), json!({ "status": "gone" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, after) = send(&h.state, empty_request("GET", &item_uri(&created), None)).await;
    assert_eq!(after["status"], "lost");
}

#[tokio::test]
async fn update_without_photo_keeps_media_url() {
    let h = harness();
    let (_, created) = send(
        &h.state,
        multipart_request(
            "POST",
            "/api/items",
            Some(&h.token("u1")),
            &[("title", "Keys"), ("description", "d"), ("location", "l")],
            Some(("keys.png", "image/png", &b"\x89PNGfake"[..])),
        ),
    )
    .await;
    let original_url = created["mediaUrl"].clone();
    assert!(original_url.is_string());

    let (status, body) = send(
        &h.state,
        multipart_request("PUT", &item_uri(&created), Some(&h.token("u1")), &[("location", "Front desk")], None),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["location"], "Front desk");
    assert_eq!(body["mediaUrl"], original_url);
}

#[tokio::test]
async fn update_with_photo_replaces_media_url() {
    let h = harness();
    let created = h.create_wallet("u1").await;

    let (status, body) = send(
        &h.state,
        multipart_request(
            "PUT",
            &item_uri(&created),
            Some(&h.token("u1")),
            &[],
            Some(("wallet.jpeg", "image/jpeg", &b"\xff\xd8new"[..])),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let url = body["mediaUrl"].as_str().unwrap();
    assert!(url.ends_with(".jpeg"));
    assert_eq!(h.media.len().await, 1);
}

#[tokio::test]
async fn non_owner_update_never_uploads() {
    let h = harness();
    let created = h.create_wallet("u1").await;

    let (status, _) = send(
        &h.state,
        multipart_request(
            "PUT",
            &item_uri(&created),
            Some(&h.token("u2")),
            &[],
            Some(("x.png", "image/png", &b"\x89PNG"[..])),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(h.media.len().await, 0);
}

// ---- delete ----

#[tokio::test]
async fn wallet_scenario() {
    let h = harness();
    let created = h.create_wallet("U1").await;
    assert_eq!(created["status"], "lost");
    assert_eq!(created["owner"], "U1");
    let uri = item_uri(&created);

    let (status, _) = send(&h.state, empty_request("DELETE", &uri, Some(&h.token("U2")))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&h.state, empty_request("DELETE", &uri, Some(&h.token("U1")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Item deleted successfully");
    assert_eq!(body["deletedItem"], created);

    let (status, _) = send(&h.state, empty_request("GET", &uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_of_missing_item_is_404() {
    let h = harness();
    let uri = format!("/api/items/{}", Uuid::new_v4());
    let (status, body) = send(&h.state, empty_request("DELETE", &uri, Some(&h.token("u1")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Item not found");
}

#[tokio::test]
async fn concurrent_deletes_resolve_to_one_success() {
    let h = harness();
    let created = h.create_wallet("u1").await;
    let uri = item_uri(&created);
    let token = h.token("u1");

    let (a, b) = tokio::join!(
        send(&h.state, empty_request("DELETE", &uri, Some(&token))),
        send(&h.state, empty_request("DELETE", &uri, Some(&token))),
    );

    let mut statuses = vec![a.0.as_u16(), b.0.as_u16()];
    statuses.sort_unstable();
    assert_eq!(statuses, vec![200, 404]);
    assert!(h.store.is_empty().await);
}

// ---- backend faults ----

struct FailingStore;

#[async_trait]
impl ItemStore for FailingStore {
    async fn create(&self, _item: NewItem) -> Result<Item, DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolClosed))
    }
    async fn list(&self) -> Result<Vec<Item>, DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolClosed))
    }
    async fn get(&self, _id: Uuid) -> Result<Option<Item>, DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolClosed))
    }
    async fn update(&self, _id: Uuid, _changes: ItemChanges) -> Result<Option<Item>, DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolClosed))
    }
    async fn delete(&self, _id: Uuid) -> Result<Option<Item>, DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolClosed))
    }
    async fn health_check(&self) -> Result<(), DatabaseError> {
        Err(DatabaseError::Sqlx(sqlx::Error::PoolClosed))
    }
}

struct FailingMedia;

#[async_trait]
impl MediaStore for FailingMedia {
    async fn store(&self, _upload: Upload, _format: ImageFormat) -> Result<String, MediaError> {
        Err(MediaError::Backend("bucket offline".to_string()))
    }
}

#[tokio::test]
async fn store_fault_is_500_with_message() {
    let state = AppState::new(config(), Arc::new(FailingStore), Arc::new(MemoryMediaStore::new("x")));

    let (status, body) = send(&state, empty_request("GET", "/api/items", None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].is_string());

    let token = format!("Bearer {}", state.verifier.sign(&Claims::new("u1")).unwrap());
    let uri = format!("/api/items/{}", Uuid::new_v4());
    let (status, _) = send(&state, empty_request("DELETE", &uri, Some(&token))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(&state, empty_request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn media_fault_fails_create_without_persisting() {
    let store = MemoryItemStore::new();
    let state = AppState::new(config(), Arc::new(store.clone()), Arc::new(FailingMedia));
    let token = format!("Bearer {}", state.verifier.sign(&Claims::new("u1")).unwrap());

    let (status, body) = send(
        &state,
        multipart_request(
            "POST",
            "/api/items",
            Some(&token),
            &[("title", "Keys"), ("description", "d"), ("location", "l")],
            Some(("keys.jpg", "image/jpeg", &b"\xff\xd8"[..])),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("bucket offline"));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let (status, body) = send(&h.state, empty_request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
