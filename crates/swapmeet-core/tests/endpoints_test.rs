//! Integration tests for the resource wrappers and the login lifecycle

use std::sync::Arc;

use mockito::{Matcher, Server};
use serde_json::json;
use swapmeet_core::api::{ApiClient, ApiError};
use swapmeet_core::auth::{
    MemoryStore, SessionManager, SessionStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY,
};
use swapmeet_core::models::{NewSwap, ProductDraft, ProductQuery, Upload};

const USER_JSON: &str = r#"{
    "id": "0b7c5a52-7d57-4c3b-9a61-3f4f1d2d8e10",
    "email": "ana@example.com",
    "username": "ana",
    "trust_score": "4.80",
    "total_swaps": 12,
    "is_verified": true,
    "badges": ["verified_trader", "top_swapper"]
}"#;

fn client(server: &Server, store: Arc<MemoryStore>) -> ApiClient {
    ApiClient::new(&format!("{}/api", server.url()), store).expect("Failed to build client")
}

#[tokio::test]
async fn login_stores_tokens_and_fetches_profile() {
    //* Given
    let mut server = Server::new_async().await;
    let store = Arc::new(MemoryStore::new());

    let login = server
        .mock("POST", "/api/auth/auth/login/")
        .match_header("authorization", Matcher::Missing)
        .match_body(Matcher::Json(json!({"email": "ana@example.com", "password": "hunter22"})))
        .with_status(200)
        .with_body(r#"{"access": "A1", "refresh": "R1"}"#)
        .expect(1)
        .create_async()
        .await;
    let me = server
        .mock("GET", "/api/auth/users/me/")
        .match_header("authorization", "Bearer A1")
        .with_status(200)
        .with_body(USER_JSON)
        .expect(1)
        .create_async()
        .await;

    let session = SessionManager::new(client(&server, store.clone()));

    //* When
    let user = session
        .login("ana@example.com", "hunter22")
        .await
        .expect("Login should succeed");

    //* Then
    login.assert_async().await;
    me.assert_async().await;
    assert_eq!(user.username, "ana");
    assert_eq!(user.badges.len(), 2);
    assert!(session.is_authenticated());
    assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
    assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
}

#[tokio::test]
async fn login_with_bad_credentials_is_unauthorized() {
    //* Given
    let mut server = Server::new_async().await;
    let store = Arc::new(MemoryStore::new());

    let _login = server
        .mock("POST", "/api/auth/auth/login/")
        .with_status(401)
        .with_body(r#"{"detail": "No active account found with the given credentials"}"#)
        .create_async()
        .await;

    let session = SessionManager::new(client(&server, store.clone()));

    //* When
    let err = session.login("ana@example.com", "wrong").await.unwrap_err();

    //* Then
    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn restore_clears_rejected_session() {
    //* Given
    let mut server = Server::new_async().await;
    let store = Arc::new(MemoryStore::with_tokens("A1", "R1"));

    let _me = server
        .mock("GET", "/api/auth/users/me/")
        .with_status(401)
        .create_async()
        .await;
    let _refresh = server
        .mock("POST", "/api/auth/refresh/")
        .with_status(401)
        .create_async()
        .await;

    let session = SessionManager::new(client(&server, store.clone()));

    //* When
    let restored = session.restore().await.expect("Rejected session is not an error");

    //* Then
    assert!(restored.is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn restore_accepts_full_user_payload() {
    //* Given
    let mut server = Server::new_async().await;
    let store = Arc::new(MemoryStore::with_tokens("A1", "R1"));

    let me = server
        .mock("GET", "/api/auth/users/me/")
        .match_header("authorization", "Bearer A1")
        .with_status(200)
        .with_body(
            r#"{"id": "0b7c5a52-7d57-4c3b-9a61-3f4f1d2d8e10", "email": "ana@example.com", "username": "ana", "first_name": "", "last_name": "", "avatar": null, "bio": null, "location": null, "latitude": null, "longitude": null, "trust_score": "5.00", "total_swaps": 0, "is_verified": false, "badges": [], "distance": null, "created_at": "2024-03-01T10:15:00.123456Z", "updated_at": "2024-03-01T10:15:00.123456Z"}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let session = SessionManager::new(client(&server, store.clone()));

    //* When
    let user = session.restore().await.unwrap().expect("Session should be restored");

    //* Then
    me.assert_async().await;
    assert_eq!(user.trust_score.as_deref(), Some("5.00"));
    assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
}

#[tokio::test]
async fn restore_keeps_session_on_server_error() {
    //* Given
    let mut server = Server::new_async().await;
    let store = Arc::new(MemoryStore::with_tokens("A1", "R1"));

    let _me = server
        .mock("GET", "/api/auth/users/me/")
        .with_status(503)
        .with_body("maintenance")
        .create_async()
        .await;

    let session = SessionManager::new(client(&server, store.clone()));

    //* When
    let result = session.restore().await;

    //* Then
    assert!(matches!(result, Err(ApiError::ServerError(_))));
    assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));
    assert_eq!(store.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
}

#[tokio::test]
async fn listing_with_embedded_owner_parses() {
    //* Given
    let mut server = Server::new_async().await;
    let _detail = server
        .mock("GET", "/api/products/p1/")
        .with_status(200)
        .with_body(format!(
            r#"{{"id": "p1", "title": "Road bike", "estimated_value": "250.00", "owner": {}, "images": []}}"#,
            USER_JSON
        ))
        .create_async()
        .await;

    let api = client(&server, Arc::new(MemoryStore::with_tokens("A1", "R1")));

    //* When
    let detail = api.get_product("p1").await.unwrap();

    //* Then
    let owner = detail.product.owner.expect("owner is embedded");
    assert_eq!(owner.trust(), Some(4.8));
}

#[tokio::test]
async fn restore_without_tokens_makes_no_request() {
    //* Given
    let mut server = Server::new_async().await;
    let me = server
        .mock("GET", "/api/auth/users/me/")
        .expect(0)
        .create_async()
        .await;

    let session = SessionManager::new(client(&server, Arc::new(MemoryStore::new())));

    //* When
    let restored = session.restore().await.unwrap();

    //* Then
    assert!(restored.is_none());
    me.assert_async().await;
}

#[tokio::test]
async fn logout_removes_both_tokens() {
    let server = Server::new_async().await;
    let store = Arc::new(MemoryStore::with_tokens("A1", "R1"));
    let session = SessionManager::new(client(&server, store.clone()));

    session.logout().unwrap();

    assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
    assert_eq!(store.get(REFRESH_TOKEN_KEY), None);
}

#[tokio::test]
async fn list_products_sends_filters_as_query() {
    //* Given
    let mut server = Server::new_async().await;
    let list = server
        .mock("GET", "/api/products/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("search".into(), "bike".into()),
            Matcher::UrlEncoded("available".into(), "true".into()),
        ]))
        .with_status(200)
        .with_body(r#"[{"id": "p1", "title": "Road bike", "estimated_value": "250.00", "is_available": true}]"#)
        .expect(1)
        .create_async()
        .await;

    let api = client(&server, Arc::new(MemoryStore::new()));
    let query = ProductQuery {
        search: Some("bike".to_string()),
        available: Some(true),
        ..Default::default()
    };

    //* When
    let products = api.list_products(&query).await.unwrap();

    //* Then
    list.assert_async().await;
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].title, "Road bike");
}

#[tokio::test]
async fn typed_wrapper_recovers_from_expired_token() {
    //* Given
    let mut server = Server::new_async().await;
    let store = Arc::new(MemoryStore::with_tokens("A1", "R1"));

    let _expired = server
        .mock("GET", "/api/messages/unread-count/")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .create_async()
        .await;
    let _refresh = server
        .mock("POST", "/api/auth/refresh/")
        .with_status(200)
        .with_body(r#"{"access": "A2"}"#)
        .create_async()
        .await;
    let _replay = server
        .mock("GET", "/api/messages/unread-count/")
        .match_header("authorization", "Bearer A2")
        .with_status(200)
        .with_body(r#"{"unread_count": 4}"#)
        .create_async()
        .await;

    let api = client(&server, store);

    //* When
    let unread = api.unread_count().await.unwrap();

    //* Then
    assert_eq!(unread.unread_count, 4);
}

#[tokio::test]
async fn business_errors_map_to_typed_errors() {
    //* Given
    let mut server = Server::new_async().await;
    let _accept = server
        .mock("POST", "/api/swaps/s1/accept/")
        .with_status(409)
        .with_body(r#"{"error": "Swap is no longer pending"}"#)
        .create_async()
        .await;
    let _missing = server
        .mock("GET", "/api/products/nope/")
        .with_status(404)
        .with_body(r#"{"detail": "Not found."}"#)
        .create_async()
        .await;

    let api = client(&server, Arc::new(MemoryStore::with_tokens("A1", "R1")));

    //* When
    let accept = api.accept_swap("s1").await;
    let missing = api.get_product("nope").await;

    //* Then
    match accept {
        Err(ApiError::Conflict(body)) => assert!(body.contains("no longer pending")),
        other => panic!("expected Conflict, got {:?}", other),
    }
    assert!(matches!(missing, Err(ApiError::NotFound(_))));
}

#[tokio::test]
async fn create_swap_posts_json() {
    //* Given
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/swaps/")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({
            "receiver": "u2",
            "sender_product": "p1",
            "receiver_product": "p2",
            "cash_adjustment": "15.00"
        })))
        .with_status(201)
        .with_body(r#"{"id": "s1", "status": "pending", "cash_adjustment": "15.00"}"#)
        .expect(1)
        .create_async()
        .await;

    let api = client(&server, Arc::new(MemoryStore::with_tokens("A1", "R1")));
    let swap = NewSwap {
        receiver: "u2".to_string(),
        sender_product: "p1".to_string(),
        receiver_product: "p2".to_string(),
        cash_adjustment: Some("15.00".to_string()),
        message: None,
    };

    //* When
    let created = api.create_swap(&swap).await.unwrap();

    //* Then
    create.assert_async().await;
    assert_eq!(created.status, "pending");
}

#[tokio::test]
async fn create_product_uploads_multipart() {
    //* Given
    let mut server = Server::new_async().await;
    let create = server
        .mock("POST", "/api/products/")
        .match_header("content-type", Matcher::Regex("^multipart/form-data; boundary=".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="title"\r\n\r\nRoad bike"#.into()),
            Matcher::Regex(r#"name="images"; filename="bike.jpg""#.into()),
        ]))
        .with_status(201)
        .with_body(r#"{"id": "p1", "title": "Road bike", "images": []}"#)
        .expect(1)
        .create_async()
        .await;

    let api = client(&server, Arc::new(MemoryStore::with_tokens("A1", "R1")));
    let draft = ProductDraft {
        title: "Road bike".to_string(),
        description: "Barely used".to_string(),
        estimated_value: "250.00".to_string(),
        images: vec![Upload {
            file_name: "bike.jpg".to_string(),
            mime: Some("image/jpeg".to_string()),
            bytes: vec![0xff, 0xd8, 0xff],
        }],
        ..Default::default()
    };

    //* When
    let created = api.create_product(&draft).await.unwrap();

    //* Then
    create.assert_async().await;
    assert_eq!(created.product.id, "p1");
}

#[tokio::test]
async fn compatibility_passes_both_products() {
    //* Given
    let mut server = Server::new_async().await;
    let compat = server
        .mock("GET", "/api/matching/compatibility/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("product1".into(), "p1".into()),
            Matcher::UrlEncoded("product2".into(), "p2".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"product1": {"id": "p1", "title": "Bike"}, "product2": {"id": "p2", "title": "Guitar"}, "compatibility_score": 72.5}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let api = client(&server, Arc::new(MemoryStore::new()));

    //* When
    let result = api.compatibility("p1", "p2").await.unwrap();

    //* Then
    compat.assert_async().await;
    assert_eq!(result.compatibility_score, 72.5);
    assert_eq!(result.product2.title, "Guitar");
}

#[tokio::test]
async fn refresh_rejection_ends_session_with_default_hook() {
    //* Given
    let mut server = Server::new_async().await;
    let _bids = server
        .mock("GET", "/api/bids/")
        .with_status(401)
        .create_async()
        .await;
    let _refresh = server
        .mock("POST", "/api/auth/refresh/")
        .with_status(400)
        .create_async()
        .await;

    let store = Arc::new(MemoryStore::with_tokens("A1", "R1"));
    let api = client(&server, store.clone());

    //* When
    let err = api.list_bids().await.unwrap_err();

    //* Then
    assert!(err.requires_login());
    assert!(store.is_empty());
}
