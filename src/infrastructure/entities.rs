//! Store entities

use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Sale,
    Auction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    New,
    LikeNew,
    Good,
    NotWorking,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bid {
    pub bidder_id: Uuid,
    pub bidder_name: String,
    pub amount_cents: i64,
    pub placed_at: DateTime<Utc>,
}

/// Auction-only state. `bids` is append-only; `current_bid_cents` tracks the
/// highest accepted bid and is `None` until the first bid lands.
#[derive(Debug, Clone, PartialEq)]
pub struct AuctionState {
    pub ends_at: DateTime<Utc>,
    pub current_bid_cents: Option<i64>,
    pub bids: Vec<Bid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// For auctions this is the starting price. Always > 0.
    pub price_cents: i64,
    pub kind: ItemKind,
    /// Ordered, non-empty; the first entry is the canonical thumbnail.
    pub images: Vec<String>,
    pub seller_id: Uuid,
    /// Display-only denormalization of the seller's name at listing time.
    pub seller_name: String,
    pub category: String,
    pub condition: Condition,
    pub enhanced: bool,
    pub delivery_available: bool,
    pub auction: Option<AuctionState>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionStatus {
    None_,
    FreeTrial,
    Subscribed,
    PremiumPlus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    /// Login credential. Uniqueness is not enforced by construction.
    pub email: String,
    /// Plaintext, mock accounts only.
    pub password: String,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub private_profile: bool,
    pub subscription: SubscriptionStatus,
    pub items_listed: u32,
    pub avatar_url: Option<String>,
    pub enhanced_credits: u32,
    pub sum_of_ratings: u32,
    pub total_ratings: u32,
    pub is_admin: bool,
}

/// Reduced user projection embedded in conversations.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub avatar_url: Option<String>,
}

impl From<&User> for Participant {
    fn from(user: &User) -> Self {
        Participant {
            id: user.id,
            name: user.name.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuyRequestStatus {
    None_,
    PendingSellerResponse,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LastMessage {
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub item_thumbnail: Option<String>,
    pub participants: [Participant; 2],
    pub last_message: Option<LastMessage>,
    pub unread_count: u32,
    pub buy_request: BuyRequestStatus,
    pub price_at_request_cents: Option<i64>,
    pub item_unavailable: bool,
}

impl Conversation {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.participants.iter().any(|p| p.id == user_id)
    }

    /// The participant that is not `user_id`, if `user_id` is a participant.
    pub fn other_participant(&self, user_id: Uuid) -> Option<&Participant> {
        if !self.involves(user_id) {
            return None;
        }
        self.participants.iter().find(|p| p.id != user_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    /// Membership is assigned at creation, never recomputed.
    pub conversation_id: Uuid,
    pub from_id: Uuid,
    pub to_id: Uuid,
    pub item_id: Uuid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
    pub system: bool,
}
