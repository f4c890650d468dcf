//! Repository implementations over the in-memory store
//!
//! Every read hands back a cloned snapshot; callers never see live references
//! into the store's collections.

use crate::infrastructure::entities::{Bid, Conversation, Item, LastMessage, Message, User};
use crate::infrastructure::store::{MarketStore, SYSTEM_REPORTS_ITEM};
use crate::infrastructure::traits::{ConversationRepository, ItemRepository, UserRepository};
use async_trait::async_trait;
use di::{Ref, injectable};
use uuid::Uuid;

#[injectable(ItemRepository)]
pub struct InMemoryItemRepository {
    store: Ref<MarketStore>,
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn list(&self) -> Vec<Item> {
        self.store.read().items.clone()
    }

    async fn find(&self, id: Uuid) -> Option<Item> {
        self.store.read().items.iter().find(|i| i.id == id).cloned()
    }

    async fn insert(&self, item: Item) {
        self.store.write().items.push(item);
    }

    async fn remove(&self, id: Uuid) {
        let mut inner = self.store.write();
        if let Some(pos) = inner.items.iter().position(|i| i.id == id) {
            inner.items.remove(pos);
        }
    }

    async fn place_bid(&self, item_id: Uuid, bid: Bid) -> Option<Item> {
        let mut inner = self.store.write();
        let item = inner.items.iter_mut().find(|i| i.id == item_id)?;
        let auction = item.auction.as_mut()?;
        auction.current_bid_cents = Some(bid.amount_cents);
        auction.bids.push(bid);
        Some(item.clone())
    }
}

#[injectable(UserRepository)]
pub struct InMemoryUserRepository {
    store: Ref<MarketStore>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find(&self, id: Uuid) -> Option<User> {
        self.store.read().users.iter().find(|u| u.id == id).cloned()
    }

    async fn find_by_name_ci(&self, name: &str) -> Option<User> {
        let wanted = name.trim().to_lowercase();
        self.store
            .read()
            .users
            .iter()
            .find(|u| u.name.trim().to_lowercase() == wanted)
            .cloned()
    }

    async fn insert(&self, user: User) {
        self.store.write().users.push(user);
    }

    async fn update(&self, user: User) -> bool {
        let mut inner = self.store.write();
        match inner.users.iter_mut().find(|u| u.id == user.id) {
            Some(slot) => {
                *slot = user;
                true
            }
            None => false,
        }
    }

    async fn is_email_banned(&self, email: &str) -> bool {
        let wanted = email.trim().to_lowercase();
        self.store
            .read()
            .banned_emails
            .iter()
            .any(|e| e.to_lowercase() == wanted)
    }

    async fn increment_items_listed(&self, id: Uuid) {
        let mut inner = self.store.write();
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == id) {
            user.items_listed += 1;
        }
    }

    async fn consume_enhanced_credit(&self, id: Uuid) -> bool {
        let mut inner = self.store.write();
        match inner.users.iter_mut().find(|u| u.id == id) {
            Some(user) if user.enhanced_credits > 0 => {
                user.enhanced_credits -= 1;
                true
            }
            _ => false,
        }
    }
}

#[injectable(ConversationRepository)]
pub struct InMemoryConversationRepository {
    store: Ref<MarketStore>,
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn list(&self) -> Vec<Conversation> {
        self.store.read().conversations.clone()
    }

    async fn find(&self, id: Uuid) -> Option<Conversation> {
        self.store
            .read()
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    async fn find_for_item(&self, item_id: Uuid, a: Uuid, b: Uuid) -> Option<Conversation> {
        self.store
            .read()
            .conversations
            .iter()
            .find(|c| c.item_id == item_id && c.involves(a) && c.involves(b))
            .cloned()
    }

    async fn find_reports_channel(&self, admin_id: Uuid) -> Option<Conversation> {
        self.store
            .read()
            .conversations
            .iter()
            .find(|c| c.item_id == SYSTEM_REPORTS_ITEM && c.involves(admin_id))
            .cloned()
    }

    async fn insert_front(&self, conversation: Conversation) {
        self.store.write().conversations.insert(0, conversation);
    }

    async fn record_message(&self, message: Message) -> bool {
        let mut guard = self.store.write();
        let inner = &mut *guard;
        let Some(conversation) = inner
            .conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
        else {
            return false;
        };
        conversation.last_message = Some(LastMessage {
            content: message.content.clone(),
            sent_at: message.sent_at,
        });
        inner.messages.push(message);
        true
    }

    async fn messages_for(&self, conversation_id: Uuid) -> Vec<Message> {
        let mut messages: Vec<Message> = self
            .store
            .read()
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.sent_at);
        messages
    }

    async fn bump_unread(&self, conversation_id: Uuid) {
        let mut inner = self.store.write();
        if let Some(conversation) = inner
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            conversation.unread_count += 1;
        }
    }

    async fn sort_by_last_message_desc(&self) {
        self.store
            .write()
            .conversations
            .sort_by_key(|c| std::cmp::Reverse(c.last_message.as_ref().map(|m| m.sent_at)));
    }
}
