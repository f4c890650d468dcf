//! API Integration Tests
//!
//! Drives the HTTP surface end to end over the in-memory store. Every test
//! builds its own router/provider pair, so each one starts from the seed
//! data. Tests are serialized because avatar storage configuration goes
//! through process environment variables.

use axum::routing::post;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use di::{Injectable, ServiceCollection};
use di_axum::RouterServiceProviderExtensions;
use marketplace_api::api;
use marketplace_api::core::services::{
    ADMIN_SETUP_KEY, MyAccountService, MyCatalogService, MyMessagingService,
};
use marketplace_api::infrastructure::repositories::{
    InMemoryConversationRepository, InMemoryItemRepository, InMemoryUserRepository,
};
use marketplace_api::infrastructure::session::Session;
use marketplace_api::infrastructure::storage::DiskFileStorage;
use marketplace_api::infrastructure::store::{MarketStore, SEED_USER_ID};
use serde_json::{Value, json};
use serial_test::serial;
use tower::ServiceExt;
use uuid::Uuid;

fn create_test_app() -> axum::Router {
    let provider = ServiceCollection::new()
        .add(MarketStore::singleton())
        .add(Session::singleton())
        .add(DiskFileStorage::singleton())
        .add(InMemoryItemRepository::scoped())
        .add(InMemoryUserRepository::scoped())
        .add(InMemoryConversationRepository::scoped())
        .add(MyCatalogService::scoped())
        .add(MyMessagingService::scoped())
        .add(MyAccountService::scoped())
        .build_provider()
        .unwrap();

    axum::Router::new()
        .nest("/items", api::items::router())
        .nest("/conversations", api::conversations::router())
        .route("/reports", post(api::conversations::report_item))
        .merge(api::accounts::router())
        .with_provider(provider)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn admin_login(app: &axum::Router) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts/admin-login",
            json!({ "key": ADMIN_SETUP_KEY }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn login(app: &axum::Router, email: &str, password: &str) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts/login",
            json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

async fn item_id_for(app: &axum::Router, query: &str) -> (Uuid, Value) {
    let response = app
        .clone()
        .oneshot(get(&format!("/items?q={query}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let item = json["items"][0].clone();
    let id = item["id"].as_str().unwrap().parse().unwrap();
    (id, item)
}

#[tokio::test]
#[serial]
async fn test_admin_elevation_with_exact_key() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts/admin-login",
            json!({ "key": ADMIN_SETUP_KEY }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["is_admin"], json!(true));
    assert_eq!(json["subscription"], json!("premium_plus"));

    // the persisted login flag now admits the profile view
    let response = app.clone().oneshot(get("/profile")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["name"], json!("Administrator"));
}

#[tokio::test]
#[serial]
async fn test_wrong_admin_key_changes_nothing() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts/admin-login",
            json!({ "key": "guessing" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // still anonymous: the gated profile view stays closed
    let response = app.clone().oneshot(get("/profile")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_login_round_trip() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts/login",
            json!({ "email": "mia@example.com", "password": "nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts/login",
            json!({ "email": "mia@example.com", "password": "password123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get("/profile")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["name"], json!("Mia Hansen"));
    assert_eq!(json["rating"]["full_stars"], json!(4));
    assert_eq!(json["rating"]["empty_stars"], json!(1));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/accounts/logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.clone().oneshot(get("/profile")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn test_missing_item_is_not_found() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(get(&format!("/items/{}", Uuid::new_v4())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
#[serial]
async fn test_search_narrows_the_listing() {
    let app = create_test_app();

    let response = app.clone().oneshot(get("/items")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], json!(3));

    let response = app.clone().oneshot(get("/items?q=lamp")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["total"], json!(1));
    assert_eq!(json["items"][0]["name"], json!("Vintage desk lamp"));
}

#[tokio::test]
#[serial]
async fn test_listing_creation_is_gated_and_validated() {
    let app = create_test_app();

    let listing = json!({
        "name": "Walnut bookshelf",
        "description": "Five shelves, some scratches.",
        "price_cents": 8000,
        "kind": "sale",
        "images": ["/static/seed/shelf.jpg"],
        "category": "Furniture",
        "condition": "good"
    });

    // anonymous submissions bounce off the login gate
    let response = app
        .clone()
        .oneshot(json_request("POST", "/items", listing.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    admin_login(&app).await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/items", listing))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["kind"], json!("sale"));
    assert_eq!(json["seller_name"], json!("Administrator"));

    // closed enum sets reject anything outside them
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/items",
            json!({
                "name": "x",
                "price_cents": 100,
                "kind": "raffle",
                "images": ["/static/x.jpg"],
                "condition": "good"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
#[serial]
async fn test_bidding_over_http() {
    let app = create_test_app();
    admin_login(&app).await;

    let (camera_id, camera) = item_id_for(&app, "camera").await;
    let highest = camera["auction"]["current_bid_cents"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/items/{camera_id}/bids"),
            json!({ "amount_cents": highest - 100 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/items/{camera_id}/bids"),
            json!({ "amount_cents": highest + 500 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(
        json["auction"]["current_bid_cents"],
        json!(highest + 500)
    );
}

#[tokio::test]
#[serial]
async fn test_report_flow_over_http() {
    let app = create_test_app();
    admin_login(&app).await;

    let (camera_id, _) = item_id_for(&app, "camera").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/reports",
            json!({ "item_id": camera_id, "reason": "bad" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/reports",
            json!({ "item_id": camera_id, "reason": "too good to be true" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["system"], json!(true));
}

#[tokio::test]
#[serial]
async fn test_unread_badge_reflects_seeded_thread() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(get("/conversations/unread"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["total"], json!(1));
    assert_eq!(json["conversations"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[serial]
async fn test_contact_and_send_over_http() {
    let app = create_test_app();
    admin_login(&app).await;

    let (camera_id, _) = item_id_for(&app, "camera").await;
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/conversations/contact",
            json!({ "item_id": camera_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let conversation = body_json(response).await;
    let conversation_id = conversation["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/conversations/{conversation_id}/messages"),
            json!({ "content": "Does the shutter really fire?" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get(&format!("/conversations/{conversation_id}/messages")))
        .await
        .unwrap();
    let json = body_json(response).await;
    let messages = json["messages"].as_array().unwrap();
    assert_eq!(
        messages.last().unwrap()["content"],
        json!("Does the shutter really fire?")
    );
}

#[tokio::test]
#[serial]
async fn test_banned_email_is_rejected_explicitly() {
    let app = create_test_app();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts",
            json!({
                "name": "Spam Bot",
                "email": "spam@example.com",
                "password": "hunter2hunter",
                "password_confirmation": "hunter2hunter"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("banned"));
}

#[tokio::test]
#[serial]
async fn test_profile_edit_updates_the_directory_record() {
    let app = create_test_app();
    login(&app, "mia@example.com", "password123").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/profile",
            json!({ "name": "Mia Holm", "bio": "Moved across town." }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["name"], json!("Mia Holm"));

    // a fresh read comes from the directory, not a session-local copy
    let response = app.clone().oneshot(get("/profile")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["name"], json!("Mia Holm"));
    assert_eq!(json["bio"], json!("Moved across town."));
    // untouched fields survive the edit
    assert_eq!(json["location"], json!("Copenhagen"));

    // the directory lookup resolves the new name, case-insensitively
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/accounts/switch",
            json!({ "name": "mia holm" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["email"], json!("mia@example.com"));
}

#[tokio::test]
#[serial]
async fn test_private_profiles_withhold_location_and_bio() {
    let app = create_test_app();
    login(&app, "mia@example.com", "password123").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/profile",
            json!({ "private_profile": true }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // the seeded location and bio exist but the public view hides them
    let response = app
        .clone()
        .oneshot(get(&format!("/users/{SEED_USER_ID}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["name"], json!("Mia Hansen"));
    assert!(json["location"].is_null());
    assert!(json["bio"].is_null());
    // stars still render on a private profile
    assert_eq!(json["rating"]["has_ratings"], json!(true));
    assert_eq!(json["rating"]["full_stars"], json!(4));

    // flipping the flag back exposes them again
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/profile",
            json!({ "private_profile": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get(&format!("/users/{SEED_USER_ID}")))
        .await
        .unwrap();
    let json = body_json(response).await;
    assert_eq!(json["location"], json!("Copenhagen"));
}

fn multipart_avatar_request() -> Request<Body> {
    let boundary = "XTESTBOUNDARY";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"avatar\"; filename=\"me photo.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         not-really-a-png\r\n\
         --{boundary}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/profile/avatar")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
#[serial]
async fn test_avatar_upload_without_backend_is_a_terminal_error() {
    unsafe { std::env::remove_var("AVATAR_STORAGE_DIR") };
    let app = create_test_app();
    admin_login(&app).await;

    let response = app
        .clone()
        .oneshot(multipart_avatar_request())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("storage"));
}

#[tokio::test]
#[serial]
async fn test_avatar_upload_round_trip() {
    let root = std::env::temp_dir().join(format!("marketplace-avatars-{}", Uuid::new_v4()));
    std::fs::create_dir_all(&root).unwrap();
    unsafe { std::env::set_var("AVATAR_STORAGE_DIR", &root) };

    let app = create_test_app();
    admin_login(&app).await;

    let response = app
        .clone()
        .oneshot(multipart_avatar_request())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let url = json["avatar_url"].as_str().unwrap();
    assert!(url.starts_with("/static/avatars/"));
    // the raw filename was sanitized before hitting the disk
    assert!(url.ends_with("/mephoto.png"));

    // the profile now carries the new avatar
    let response = app.clone().oneshot(get("/profile")).await.unwrap();
    let json = body_json(response).await;
    assert_eq!(json["avatar_url"].as_str().unwrap(), url);

    unsafe { std::env::remove_var("AVATAR_STORAGE_DIR") };
    std::fs::remove_dir_all(&root).ok();
}
