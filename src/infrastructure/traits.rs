//! Infrastructure traits, used for DI on higher levels
//!
//! Repository operations over the in-memory store are total: lookups return
//! `Option`, mutations on missing rows are no-ops. Error classification
//! happens in the service layer.

use crate::infrastructure::entities::{Bid, Conversation, Item, Message, User};
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn list(&self) -> Vec<Item>;
    async fn find(&self, id: Uuid) -> Option<Item>;
    async fn insert(&self, item: Item);

    /// Removes the first item with a matching id. No-op when absent.
    async fn remove(&self, id: Uuid);

    /// Appends a bid and raises the item's current bid. Returns the updated
    /// snapshot, or `None` when the item does not exist or is not an auction.
    async fn place_bid(&self, item_id: Uuid, bid: Bid) -> Option<Item>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: Uuid) -> Option<User>;

    /// Case-insensitive name lookup; first match wins.
    async fn find_by_name_ci(&self, name: &str) -> Option<User>;

    async fn insert(&self, user: User);

    /// Replaces the record with the same id. Returns false when absent.
    async fn update(&self, user: User) -> bool;

    async fn is_email_banned(&self, email: &str) -> bool;
    async fn increment_items_listed(&self, id: Uuid);

    /// Decrements the user's enhanced-listing credits. Returns false when the
    /// user is absent or has no credits left; no mutation in that case.
    async fn consume_enhanced_credit(&self, id: Uuid) -> bool;
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn list(&self) -> Vec<Conversation>;
    async fn find(&self, id: Uuid) -> Option<Conversation>;

    /// Conversation for an item between two participants, participant order
    /// ignored.
    async fn find_for_item(&self, item_id: Uuid, a: Uuid, b: Uuid) -> Option<Conversation>;

    /// The per-admin report channel (sentinel item id).
    async fn find_reports_channel(&self, admin_id: Uuid) -> Option<Conversation>;

    /// Inserts at the front of the collection ordering.
    async fn insert_front(&self, conversation: Conversation);

    /// Appends the message and refreshes the owning conversation's
    /// last-message snapshot. Returns false when the conversation is absent;
    /// nothing is appended in that case.
    async fn record_message(&self, message: Message) -> bool;

    /// Transcript for a conversation, ascending by send time.
    async fn messages_for(&self, conversation_id: Uuid) -> Vec<Message>;

    async fn bump_unread(&self, conversation_id: Uuid);

    /// Reorders the whole collection descending by last-message time.
    /// Conversations without a last message sink to the back.
    async fn sort_by_last_message_desc(&self);
}
