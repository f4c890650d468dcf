//! Process-lifetime in-memory entity store
//!
//! Canonical home of every collection the service works with. There is no
//! persistence: the store is seeded at construction and lives exactly as long
//! as the process. Consumers never hold references into the collections;
//! repositories hand out cloned snapshots and funnel every mutation through
//! the write guard.

use crate::infrastructure::entities::{
    AuctionState, Bid, BuyRequestStatus, Condition, Conversation, Item, ItemKind, LastMessage,
    Message, Participant, SubscriptionStatus, User,
};
use chrono::{Duration, Utc};
use di::{inject, injectable};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::{Uuid, uuid};

/// Fixed identity that receives item reports.
pub const ADMIN_USER_ID: Uuid = uuid!("00000000-0000-4000-8000-00000000ad01");

/// Sentinel item id marking per-admin report channels. Report conversations
/// are the one exception to the (item, participant pair) uniqueness rule.
pub const SYSTEM_REPORTS_ITEM: Uuid = Uuid::nil();

/// Synthetic counterpart participant in report channels.
pub const SYSTEM_USER_ID: Uuid = uuid!("00000000-0000-4000-8000-00000000ad00");

pub struct StoreInner {
    pub items: Vec<Item>,
    pub users: Vec<User>,
    pub conversations: Vec<Conversation>,
    pub messages: Vec<Message>,
    pub banned_emails: Vec<String>,
}

pub struct MarketStore {
    inner: RwLock<StoreInner>,
}

#[injectable]
impl MarketStore {
    #[inject]
    pub fn create() -> MarketStore {
        MarketStore {
            inner: RwLock::new(seed()),
        }
    }
}

impl MarketStore {
    pub fn read(&self) -> RwLockReadGuard<'_, StoreInner> {
        self.inner.read().expect("store lock poisoned")
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, StoreInner> {
        self.inner.write().expect("store lock poisoned")
    }
}

/// Id of the seeded account the session starts out pointing at.
pub const SEED_USER_ID: Uuid = uuid!("00000000-0000-4000-8000-0000000000a1");

const SEED_SELLER_ID: Uuid = uuid!("00000000-0000-4000-8000-0000000000b2");

fn seed() -> StoreInner {
    let now = Utc::now();

    let current = User {
        id: SEED_USER_ID,
        name: "Mia Hansen".to_owned(),
        email: "mia@example.com".to_owned(),
        password: "password123".to_owned(),
        location: Some("Copenhagen".to_owned()),
        bio: Some("Selling what no longer sparks joy.".to_owned()),
        private_profile: false,
        subscription: SubscriptionStatus::FreeTrial,
        items_listed: 1,
        avatar_url: None,
        enhanced_credits: 0,
        sum_of_ratings: 43,
        total_ratings: 10,
        is_admin: false,
    };

    let seller = User {
        id: SEED_SELLER_ID,
        name: "Lena Fischer".to_owned(),
        email: "lena@example.com".to_owned(),
        password: "hunter2hunter".to_owned(),
        location: Some("Berlin".to_owned()),
        bio: None,
        private_profile: false,
        subscription: SubscriptionStatus::Subscribed,
        items_listed: 2,
        avatar_url: None,
        enhanced_credits: 0,
        sum_of_ratings: 9,
        total_ratings: 2,
        is_admin: false,
    };

    let admin = User {
        id: ADMIN_USER_ID,
        name: "Administrator".to_owned(),
        email: "admin@marketplace.local".to_owned(),
        password: "not-a-real-secret".to_owned(),
        location: None,
        bio: None,
        private_profile: true,
        subscription: SubscriptionStatus::PremiumPlus,
        items_listed: 0,
        avatar_url: None,
        enhanced_credits: 100,
        sum_of_ratings: 0,
        total_ratings: 0,
        is_admin: true,
    };

    let bike = Item {
        id: uuid!("00000000-0000-4000-8000-0000000001a1"),
        name: "City bike, 7-speed".to_owned(),
        description: "Well kept commuter bike, new brake pads last spring.".to_owned(),
        price_cents: 120_00,
        kind: ItemKind::Sale,
        images: vec!["/static/seed/bike-front.jpg".to_owned()],
        seller_id: current.id,
        seller_name: current.name.clone(),
        category: "Sports & Outdoors".to_owned(),
        condition: Condition::Good,
        enhanced: false,
        delivery_available: false,
        auction: None,
        created_at: now - Duration::days(4),
    };

    let lamp = Item {
        id: uuid!("00000000-0000-4000-8000-0000000001a2"),
        name: "Vintage desk lamp".to_owned(),
        description: "Brass arm lamp from the 70s, rewired.".to_owned(),
        price_cents: 45_00,
        kind: ItemKind::Sale,
        images: vec![
            "/static/seed/lamp-on.jpg".to_owned(),
            "/static/seed/lamp-detail.jpg".to_owned(),
        ],
        seller_id: seller.id,
        seller_name: seller.name.clone(),
        category: "Home & Living".to_owned(),
        condition: Condition::LikeNew,
        enhanced: true,
        delivery_available: true,
        auction: None,
        created_at: now - Duration::days(2),
    };

    let camera = Item {
        id: uuid!("00000000-0000-4000-8000-0000000001a3"),
        name: "Film camera (untested)".to_owned(),
        description: "Shutter fires but light meter is dead. Sold as-is.".to_owned(),
        price_cents: 30_00,
        kind: ItemKind::Auction,
        images: vec!["/static/seed/camera.jpg".to_owned()],
        seller_id: seller.id,
        seller_name: seller.name.clone(),
        category: "Electronics".to_owned(),
        condition: Condition::NotWorking,
        enhanced: false,
        delivery_available: true,
        auction: Some(AuctionState {
            ends_at: now + Duration::days(5),
            current_bid_cents: Some(36_00),
            bids: vec![Bid {
                bidder_id: current.id,
                bidder_name: current.name.clone(),
                amount_cents: 36_00,
                placed_at: now - Duration::hours(8),
            }],
        }),
        created_at: now - Duration::days(1),
    };

    let lamp_thread_id = uuid!("00000000-0000-4000-8000-0000000002c1");
    let lamp_thread = Conversation {
        id: lamp_thread_id,
        item_id: lamp.id,
        item_name: lamp.name.clone(),
        item_thumbnail: lamp.images.first().cloned(),
        participants: [Participant::from(&current), Participant::from(&seller)],
        last_message: Some(LastMessage {
            content: "Is the lamp still available?".to_owned(),
            sent_at: now - Duration::hours(20),
        }),
        unread_count: 1,
        buy_request: BuyRequestStatus::None_,
        price_at_request_cents: None,
        item_unavailable: false,
    };

    let lamp_question = Message {
        id: uuid!("00000000-0000-4000-8000-0000000003d1"),
        conversation_id: lamp_thread_id,
        from_id: current.id,
        to_id: seller.id,
        item_id: lamp.id,
        content: "Is the lamp still available?".to_owned(),
        sent_at: now - Duration::hours(20),
        read: true,
        system: false,
    };

    StoreInner {
        items: vec![bike, lamp, camera],
        users: vec![current, seller, admin],
        conversations: vec![lamp_thread],
        messages: vec![lamp_question],
        banned_emails: vec![
            "spam@example.com".to_owned(),
            "scammer@example.net".to_owned(),
        ],
    }
}
