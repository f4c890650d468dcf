//! Catalog endpoints

use crate::api::{ApiError, ensure_logged_in};
use crate::core::traits::CatalogService;
use crate::infrastructure::session::Session;
use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/mine", get(my_listings))
        .route("/:id", get(item_detail).delete(delete_item))
        .route("/:id/bids", post(place_bid))
}

async fn list_items(
    Inject(catalog): Inject<dyn CatalogService>,
    Query(query): Query<schemas::BrowseQuery>,
) -> Json<schemas::ItemList> {
    let items = catalog.browse(query.q.as_deref()).await;
    Json(schemas::ItemList::from_items(items))
}

async fn my_listings(
    Inject(catalog): Inject<dyn CatalogService>,
    Inject(session): Inject<Session>,
) -> Result<Json<schemas::ItemList>, ApiError> {
    ensure_logged_in(&session)?;
    let items = catalog.my_listings().await?;
    Ok(Json(schemas::ItemList::from_items(items)))
}

async fn item_detail(
    Inject(catalog): Inject<dyn CatalogService>,
    Path(id): Path<Uuid>,
) -> Result<Json<schemas::Item>, ApiError> {
    let item = catalog.item_detail(id).await?;
    Ok(Json(item.into()))
}

async fn create_item(
    Inject(catalog): Inject<dyn CatalogService>,
    Inject(session): Inject<Session>,
    Json(request): Json<schemas::CreateListing>,
) -> Result<(StatusCode, Json<schemas::Item>), ApiError> {
    ensure_logged_in(&session)?;
    let draft = request.into_draft()?;
    let item = catalog.create_listing(draft).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

async fn delete_item(
    Inject(catalog): Inject<dyn CatalogService>,
    Inject(session): Inject<Session>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    ensure_logged_in(&session)?;
    catalog.remove_listing(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn place_bid(
    Inject(catalog): Inject<dyn CatalogService>,
    Inject(session): Inject<Session>,
    Path(id): Path<Uuid>,
    Json(request): Json<schemas::PlaceBid>,
) -> Result<Json<schemas::Item>, ApiError> {
    ensure_logged_in(&session)?;
    let item = catalog.place_bid(id, request.amount_cents).await?;
    Ok(Json(item.into()))
}

pub mod schemas {
    use crate::api::ApiError;
    use crate::core::error::MarketError;
    use crate::core::traits::ListingDraft;
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Deserialize, Debug)]
    pub struct BrowseQuery {
        pub q: Option<String>,
    }

    #[derive(Serialize, Debug)]
    pub struct Bid {
        pub bidder_id: Uuid,
        pub bidder_name: String,
        pub amount_cents: i64,
        pub placed_at: DateTime<Utc>,
    }

    #[derive(Serialize, Debug)]
    pub struct Auction {
        pub ends_at: DateTime<Utc>,
        pub current_bid_cents: Option<i64>,
        pub bids: Vec<Bid>,
    }

    #[derive(Serialize, Debug)]
    pub struct Item {
        pub id: Uuid,
        pub name: String,
        pub description: String,
        pub price_cents: i64,
        pub kind: String,
        pub images: Vec<String>,
        pub seller_id: Uuid,
        pub seller_name: String,
        pub category: String,
        pub condition: String,
        pub enhanced: bool,
        pub delivery_available: bool,
        pub auction: Option<Auction>,
        pub created_at: DateTime<Utc>,
    }

    impl From<entities::Item> for Item {
        fn from(item: entities::Item) -> Self {
            Item {
                id: item.id,
                name: item.name,
                description: item.description,
                price_cents: item.price_cents,
                kind: kind_str(item.kind).to_owned(),
                images: item.images,
                seller_id: item.seller_id,
                seller_name: item.seller_name,
                category: item.category,
                condition: condition_str(item.condition).to_owned(),
                enhanced: item.enhanced,
                delivery_available: item.delivery_available,
                auction: item.auction.map(|a| Auction {
                    ends_at: a.ends_at,
                    current_bid_cents: a.current_bid_cents,
                    bids: a
                        .bids
                        .into_iter()
                        .map(|b| Bid {
                            bidder_id: b.bidder_id,
                            bidder_name: b.bidder_name,
                            amount_cents: b.amount_cents,
                            placed_at: b.placed_at,
                        })
                        .collect(),
                }),
                created_at: item.created_at,
            }
        }
    }

    #[derive(Serialize, Debug, Default)]
    pub struct ItemList {
        pub items: Vec<Item>,
        pub total: usize,
    }

    impl ItemList {
        pub fn from_items(items: Vec<entities::Item>) -> Self {
            let items: Vec<Item> = items.into_iter().map(Item::from).collect();
            ItemList {
                total: items.len(),
                items,
            }
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateListing {
        pub name: String,
        #[serde(default)]
        pub description: String,
        pub price_cents: i64,
        pub kind: String,
        pub images: Vec<String>,
        #[serde(default)]
        pub category: String,
        pub condition: String,
        #[serde(default)]
        pub enhanced: bool,
        #[serde(default)]
        pub delivery_available: bool,
        pub auction_ends_at: Option<DateTime<Utc>>,
    }

    impl CreateListing {
        pub fn into_draft(self) -> Result<ListingDraft, ApiError> {
            Ok(ListingDraft {
                name: self.name,
                description: self.description,
                price_cents: self.price_cents,
                kind: parse_kind(&self.kind)?,
                images: self.images,
                category: self.category,
                condition: parse_condition(&self.condition)?,
                enhanced: self.enhanced,
                delivery_available: self.delivery_available,
                auction_ends_at: self.auction_ends_at,
            })
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct PlaceBid {
        pub amount_cents: i64,
    }

    pub fn kind_str(kind: entities::ItemKind) -> &'static str {
        match kind {
            entities::ItemKind::Sale => "sale",
            entities::ItemKind::Auction => "auction",
        }
    }

    pub fn condition_str(condition: entities::Condition) -> &'static str {
        match condition {
            entities::Condition::New => "new",
            entities::Condition::LikeNew => "like_new",
            entities::Condition::Good => "good",
            entities::Condition::NotWorking => "not_working",
        }
    }

    fn parse_kind(value: &str) -> Result<entities::ItemKind, ApiError> {
        match value {
            "sale" => Ok(entities::ItemKind::Sale),
            "auction" => Ok(entities::ItemKind::Auction),
            other => Err(ApiError(MarketError::Validation(format!(
                "unknown item type \"{other}\""
            )))),
        }
    }

    fn parse_condition(value: &str) -> Result<entities::Condition, ApiError> {
        match value {
            "new" => Ok(entities::Condition::New),
            "like_new" => Ok(entities::Condition::LikeNew),
            "good" => Ok(entities::Condition::Good),
            "not_working" => Ok(entities::Condition::NotWorking),
            other => Err(ApiError(MarketError::Validation(format!(
                "unknown condition \"{other}\""
            )))),
        }
    }
}
