//! DI "Interfaces"

use crate::core::error::MarketError;
use crate::infrastructure::entities::{
    Condition, Conversation, Item, ItemKind, Message, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Submitted listing form, validated by the catalog service.
#[derive(Debug, Clone)]
pub struct ListingDraft {
    pub name: String,
    pub description: String,
    pub price_cents: i64,
    pub kind: ItemKind,
    pub images: Vec<String>,
    pub category: String,
    pub condition: Condition,
    pub enhanced: bool,
    pub delivery_available: bool,
    /// Required when `kind` is `Auction`, ignored otherwise.
    pub auction_ends_at: Option<DateTime<Utc>>,
}

/// Submitted account-creation form.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub location: Option<String>,
    pub wants_admin: bool,
    /// Must match the admin setup key when `wants_admin` is set.
    pub admin_key: Option<String>,
}

/// Profile edit; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub private_profile: Option<bool>,
}

#[async_trait]
pub trait CatalogService: Send + Sync {
    /// All items, optionally narrowed by a free-text search query.
    async fn browse(&self, query: Option<&str>) -> Vec<Item>;

    /// Returns `Err(NotFound)` when no item carries the id.
    async fn item_detail(&self, id: Uuid) -> Result<Item, MarketError>;

    /// The current user's own listings, enhanced ones first.
    async fn my_listings(&self) -> Result<Vec<Item>, MarketError>;

    /// Validates the draft, applies the subscription gate and inserts the
    /// listing. Denial leaves the store untouched.
    async fn create_listing(&self, draft: ListingDraft) -> Result<Item, MarketError>;

    /// Removes a listing by id. Removing an absent id is not an error.
    async fn remove_listing(&self, id: Uuid) -> Result<(), MarketError>;

    /// Places a bid on an auction item. A bid must beat the current highest
    /// bid, or meet the starting price when there are no bids yet, and the
    /// auction must still be open. Returns the updated item.
    async fn place_bid(&self, item_id: Uuid, amount_cents: i64) -> Result<Item, MarketError>;
}

#[async_trait]
pub trait MessagingService: Send + Sync {
    /// Every conversation the current user participates in, store order.
    async fn my_conversations(&self) -> Result<Vec<Conversation>, MarketError>;

    /// Conversations with unread messages, newest activity first.
    async fn unread_conversations(&self) -> Result<Vec<Conversation>, MarketError>;

    /// Finds the conversation for (item, current user, seller) or creates it
    /// at the front of the collection. Never produces a duplicate.
    async fn contact_seller(&self, item_id: Uuid) -> Result<Conversation, MarketError>;

    /// Transcript for a conversation, ascending by send time. Reading a
    /// transcript does not clear unread counts.
    async fn transcript(&self, conversation_id: Uuid) -> Result<Vec<Message>, MarketError>;

    /// Appends a message from the current user to the other participant and
    /// refreshes the conversation snapshot.
    async fn send_message(
        &self,
        conversation_id: Uuid,
        content: String,
    ) -> Result<Message, MarketError>;

    /// Files a report for an item: a system message into the admin's report
    /// channel. Bumps the channel's unread count and re-sorts the whole
    /// conversation collection by latest activity.
    async fn report_item(&self, item_id: Uuid, reason: String) -> Result<Message, MarketError>;
}

#[async_trait]
pub trait AccountService: Send + Sync {
    /// The record the session currently points at.
    ///
    /// Returns `Err(Unauthorized)` when the session has no user.
    async fn current_user(&self) -> Result<User, MarketError>;

    /// Exact email+password match against the current user's record. Success
    /// sets the persisted `isLoggedIn` flag (and `stayLoggedIn` per `stay`).
    async fn login(&self, email: &str, password: &str, stay: bool) -> Result<User, MarketError>;

    /// Elevation path: the exact setup key overwrites the current user's
    /// record with the fixed admin identity and sets `isLoggedIn`. Any other
    /// key changes nothing.
    async fn admin_login(&self, key: &str) -> Result<User, MarketError>;

    /// Creates a directory entry with zeroed quota fields and points the
    /// session at it.
    async fn create_account(&self, form: NewAccount) -> Result<User, MarketError>;

    /// Case-insensitive directory lookup; on match the session is repointed,
    /// on miss it is left untouched.
    async fn set_current_user_by_name(&self, name: &str) -> Result<User, MarketError>;

    /// Applies profile edits to the current user's directory record.
    async fn update_profile(&self, changes: ProfileChanges) -> Result<User, MarketError>;

    /// Stores avatar bytes under `avatars/<user id>/<sanitized name>` and
    /// records the returned URL on the profile. Fails outright when no
    /// storage backend is configured.
    async fn upload_avatar(&self, filename: &str, bytes: Vec<u8>) -> Result<String, MarketError>;

    /// Directory record by id, for public profile pages.
    async fn public_profile(&self, id: Uuid) -> Result<User, MarketError>;

    /// Clears `isLoggedIn` only; the store is untouched.
    async fn logout(&self);
}
