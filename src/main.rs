//! Community marketplace web API
//!
//! Mock-backed marketplace: listings, messaging, profiles and subscription
//! gating over an in-memory store.

use marketplace_api::api;
use marketplace_api::core::services::{MyAccountService, MyCatalogService, MyMessagingService};
use marketplace_api::infrastructure::repositories::{
    InMemoryConversationRepository, InMemoryItemRepository, InMemoryUserRepository,
};
use marketplace_api::infrastructure::session::Session;
use marketplace_api::infrastructure::storage::DiskFileStorage;
use marketplace_api::infrastructure::store::MarketStore;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::post;
use di::{Injectable, ServiceCollection};
use di_axum::RouterServiceProviderExtensions;
use log::info;
use std::env;
use tokio::runtime::{Builder, Runtime};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

fn main() -> anyhow::Result<()> {
    // initialize tracing
    tracing_subscriber::fmt::init();

    let runtime: Runtime = Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(web_server_task());

    Ok(())
}

async fn web_server_task() {
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

    // stored avatars are served back from the same directory they are
    // uploaded to
    dotenvy::dotenv().ok();
    let static_root = env::var("AVATAR_STORAGE_DIR").unwrap_or_else(|_| "static".to_owned());

    // build our application with a route
    let app = Router::new()
        .nest("/items", api::items::router())
        .nest("/conversations", api::conversations::router())
        .route("/reports", post(api::conversations::report_item))
        .merge(api::accounts::router())
        .nest_service(
            "/static",
            ServiceBuilder::new().service(ServeDir::new(static_root)),
        )
        .layer(
            CorsLayer::new()
                .allow_headers(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_origin([
                    "http://localhost:3000".parse::<HeaderValue>().unwrap(),
                    "http://localhost:5173".parse::<HeaderValue>().unwrap(),
                ]),
        )
        .with_provider(provider);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
    info!("Shutting down...");
}
