//! Implementations for the services the app needs.
//!

use crate::core::error::MarketError;
use crate::core::quota::can_list;
use crate::core::traits::{
    AccountService, CatalogService, ListingDraft, MessagingService, NewAccount, ProfileChanges,
};
use crate::core::views;
use crate::infrastructure::entities::{
    AuctionState, Bid, BuyRequestStatus, Conversation, Item, ItemKind, LastMessage, Message,
    Participant, SubscriptionStatus, User,
};
use crate::infrastructure::session::Session;
use crate::infrastructure::storage::{FileStorage, sanitize_filename};
use crate::infrastructure::store::{ADMIN_USER_ID, SYSTEM_REPORTS_ITEM, SYSTEM_USER_ID};
use crate::infrastructure::traits::{ConversationRepository, ItemRepository, UserRepository};
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::{info, warn};
use uuid::Uuid;

/// Shared setup secret: equality with this string is the whole admin
/// authorization story. Compared verbatim at the admin-login and
/// account-creation call sites.
pub const ADMIN_SETUP_KEY: &str = "marketplace-setup-2024";

const ADMIN_NAME: &str = "Administrator";
const ADMIN_EMAIL: &str = "admin@marketplace.local";
const ADMIN_PASSWORD: &str = "not-a-real-secret";
const ADMIN_ENHANCED_CREDITS: u32 = 100;

/// Minimum length for a report reason, whitespace-trimmed.
const MIN_REPORT_REASON_LEN: usize = 10;

fn current_user_id(session: &Session) -> Result<Uuid, MarketError> {
    session.current_user().ok_or(MarketError::Unauthorized)
}

#[injectable(CatalogService)]
pub struct MyCatalogService {
    items: Ref<dyn ItemRepository>,
    users: Ref<dyn UserRepository>,
    session: Ref<Session>,
}

impl MyCatalogService {
    async fn current_user(&self) -> Result<User, MarketError> {
        let id = current_user_id(&self.session)?;
        self.users.find(id).await.ok_or(MarketError::Unauthorized)
    }
}

#[async_trait]
impl CatalogService for MyCatalogService {
    async fn browse(&self, query: Option<&str>) -> Vec<Item> {
        let items = self.items.list().await;
        match query {
            Some(q) => views::search(&items, q),
            None => items,
        }
    }

    async fn item_detail(&self, id: Uuid) -> Result<Item, MarketError> {
        self.items.find(id).await.ok_or(MarketError::NotFound("item"))
    }

    async fn my_listings(&self) -> Result<Vec<Item>, MarketError> {
        let user_id = current_user_id(&self.session)?;
        let items = self.items.list().await;
        Ok(views::own_listings(&items, user_id))
    }

    async fn create_listing(&self, draft: ListingDraft) -> Result<Item, MarketError> {
        let user = self.current_user().await?;

        if draft.name.trim().is_empty() {
            return Err(MarketError::Validation("name is required".to_owned()));
        }
        if draft.price_cents <= 0 {
            return Err(MarketError::Validation(
                "price must be greater than zero".to_owned(),
            ));
        }
        if draft.images.is_empty() {
            return Err(MarketError::Validation(
                "at least one image is required".to_owned(),
            ));
        }
        let auction = match draft.kind {
            ItemKind::Auction => {
                let ends_at = draft.auction_ends_at.ok_or_else(|| {
                    MarketError::Validation("auction end time is required".to_owned())
                })?;
                Some(AuctionState {
                    ends_at,
                    current_bid_cents: None,
                    bids: Vec::new(),
                })
            }
            ItemKind::Sale => None,
        };

        // recomputed on every submission, never cached
        if !can_list(user.subscription, user.items_listed) {
            warn!("listing denied for {}: quota", user.id);
            return Err(MarketError::QuotaExceeded);
        }

        if draft.enhanced {
            let has_credit = user.subscription == SubscriptionStatus::PremiumPlus
                && self.users.consume_enhanced_credit(user.id).await;
            if !has_credit {
                return Err(MarketError::Validation(
                    "no enhanced listing credits available".to_owned(),
                ));
            }
        }

        let item = Item {
            id: Uuid::new_v4(),
            name: draft.name.trim().to_owned(),
            description: draft.description,
            price_cents: draft.price_cents,
            kind: draft.kind,
            images: draft.images,
            seller_id: user.id,
            seller_name: user.name.clone(),
            category: draft.category,
            condition: draft.condition,
            enhanced: draft.enhanced,
            delivery_available: draft.delivery_available,
            auction,
            created_at: Utc::now(),
        };
        self.items.insert(item.clone()).await;
        self.users.increment_items_listed(user.id).await;
        info!("listing {} created by {}", item.id, user.id);
        Ok(item)
    }

    async fn remove_listing(&self, id: Uuid) -> Result<(), MarketError> {
        current_user_id(&self.session)?;
        self.items.remove(id).await;
        Ok(())
    }

    async fn place_bid(&self, item_id: Uuid, amount_cents: i64) -> Result<Item, MarketError> {
        let user = self.current_user().await?;
        let item = self.item_detail(item_id).await?;
        let auction = item
            .auction
            .as_ref()
            .ok_or_else(|| MarketError::Validation("item is not an auction".to_owned()))?;

        if auction.ends_at <= Utc::now() {
            return Err(MarketError::Validation("auction has ended".to_owned()));
        }
        match auction.current_bid_cents {
            Some(highest) if amount_cents <= highest => {
                return Err(MarketError::Validation(format!(
                    "bid must be higher than the current bid of {highest}"
                )));
            }
            None if amount_cents < item.price_cents => {
                return Err(MarketError::Validation(
                    "bid must meet the starting price".to_owned(),
                ));
            }
            _ => {}
        }

        let bid = Bid {
            bidder_id: user.id,
            bidder_name: user.name,
            amount_cents,
            placed_at: Utc::now(),
        };
        self.items
            .place_bid(item_id, bid)
            .await
            .ok_or(MarketError::NotFound("item"))
    }
}

#[injectable(MessagingService)]
pub struct MyMessagingService {
    conversations: Ref<dyn ConversationRepository>,
    items: Ref<dyn ItemRepository>,
    users: Ref<dyn UserRepository>,
    session: Ref<Session>,
}

impl MyMessagingService {
    async fn current_participant(&self) -> Result<Participant, MarketError> {
        let id = current_user_id(&self.session)?;
        let user = self.users.find(id).await.ok_or(MarketError::Unauthorized)?;
        Ok(Participant::from(&user))
    }

    /// Existing report channel for the admin, or a fresh one at the front of
    /// the collection.
    async fn reports_channel(&self) -> Result<Conversation, MarketError> {
        if let Some(channel) = self.conversations.find_reports_channel(ADMIN_USER_ID).await {
            return Ok(channel);
        }
        let admin = match self.users.find(ADMIN_USER_ID).await {
            Some(user) => Participant::from(&user),
            None => Participant {
                id: ADMIN_USER_ID,
                name: ADMIN_NAME.to_owned(),
                avatar_url: None,
            },
        };
        let channel = Conversation {
            id: Uuid::new_v4(),
            item_id: SYSTEM_REPORTS_ITEM,
            item_name: "Reported items".to_owned(),
            item_thumbnail: None,
            participants: [
                admin,
                Participant {
                    id: SYSTEM_USER_ID,
                    name: "System".to_owned(),
                    avatar_url: None,
                },
            ],
            last_message: None,
            unread_count: 0,
            buy_request: BuyRequestStatus::None_,
            price_at_request_cents: None,
            item_unavailable: false,
        };
        self.conversations.insert_front(channel.clone()).await;
        Ok(channel)
    }
}

#[async_trait]
impl MessagingService for MyMessagingService {
    async fn my_conversations(&self) -> Result<Vec<Conversation>, MarketError> {
        let user_id = current_user_id(&self.session)?;
        Ok(self
            .conversations
            .list()
            .await
            .into_iter()
            .filter(|c| c.involves(user_id))
            .collect())
    }

    async fn unread_conversations(&self) -> Result<Vec<Conversation>, MarketError> {
        let user_id = current_user_id(&self.session)?;
        let conversations = self.conversations.list().await;
        Ok(views::unread_conversations(&conversations, user_id))
    }

    async fn contact_seller(&self, item_id: Uuid) -> Result<Conversation, MarketError> {
        let me = self.current_participant().await?;
        let item = self
            .items
            .find(item_id)
            .await
            .ok_or(MarketError::NotFound("item"))?;

        if let Some(existing) = self
            .conversations
            .find_for_item(item.id, me.id, item.seller_id)
            .await
        {
            return Ok(existing);
        }

        // Sellers that never registered get a stub participant so the thread
        // can still be rendered.
        let seller = match self.users.find(item.seller_id).await {
            Some(user) => Participant::from(&user),
            None => Participant {
                id: item.seller_id,
                name: item.seller_name.clone(),
                avatar_url: None,
            },
        };

        let conversation = Conversation {
            id: Uuid::new_v4(),
            item_id: item.id,
            item_name: item.name.clone(),
            item_thumbnail: item.images.first().cloned(),
            participants: [me, seller],
            last_message: Some(LastMessage {
                content: "Conversation started".to_owned(),
                sent_at: Utc::now(),
            }),
            unread_count: 0,
            buy_request: BuyRequestStatus::None_,
            price_at_request_cents: None,
            item_unavailable: false,
        };
        self.conversations.insert_front(conversation.clone()).await;
        info!("conversation {} opened for item {}", conversation.id, item.id);
        Ok(conversation)
    }

    async fn transcript(&self, conversation_id: Uuid) -> Result<Vec<Message>, MarketError> {
        if self.conversations.find(conversation_id).await.is_none() {
            return Err(MarketError::NotFound("conversation"));
        }
        Ok(self.conversations.messages_for(conversation_id).await)
    }

    async fn send_message(
        &self,
        conversation_id: Uuid,
        content: String,
    ) -> Result<Message, MarketError> {
        let user_id = current_user_id(&self.session)?;
        let content = content.trim().to_owned();
        if content.is_empty() {
            return Err(MarketError::Validation("message is empty".to_owned()));
        }
        let conversation = self
            .conversations
            .find(conversation_id)
            .await
            .ok_or(MarketError::NotFound("conversation"))?;
        let to = conversation
            .other_participant(user_id)
            .ok_or(MarketError::Unauthorized)?;

        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            from_id: user_id,
            to_id: to.id,
            item_id: conversation.item_id,
            content,
            sent_at: Utc::now(),
            // the sender's own copy is already read
            read: true,
            system: false,
        };
        if !self.conversations.record_message(message.clone()).await {
            return Err(MarketError::NotFound("conversation"));
        }
        Ok(message)
    }

    async fn report_item(&self, item_id: Uuid, reason: String) -> Result<Message, MarketError> {
        let user_id = current_user_id(&self.session)?;
        let reason = reason.trim().to_owned();
        if reason.chars().count() < MIN_REPORT_REASON_LEN {
            return Err(MarketError::Validation(format!(
                "reason must be at least {MIN_REPORT_REASON_LEN} characters"
            )));
        }
        let item = self
            .items
            .find(item_id)
            .await
            .ok_or(MarketError::NotFound("item"))?;

        let channel = self.reports_channel().await?;
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id: channel.id,
            from_id: user_id,
            to_id: ADMIN_USER_ID,
            item_id: item.id,
            content: format!("Report for \"{}\" ({}): {}", item.name, item.id, reason),
            sent_at: Utc::now(),
            read: false,
            system: true,
        };
        if !self.conversations.record_message(message.clone()).await {
            return Err(MarketError::NotFound("conversation"));
        }
        self.conversations.bump_unread(channel.id).await;
        // global ordering side effect: every conversation is re-sorted by
        // latest activity, which also moves the report channel to the front
        self.conversations.sort_by_last_message_desc().await;
        warn!("item {} reported by {}", item.id, user_id);
        Ok(message)
    }
}

#[injectable(AccountService)]
pub struct MyAccountService {
    users: Ref<dyn UserRepository>,
    session: Ref<Session>,
    storage: Ref<dyn FileStorage>,
}

#[async_trait]
impl AccountService for MyAccountService {
    async fn current_user(&self) -> Result<User, MarketError> {
        let id = current_user_id(&self.session)?;
        self.users.find(id).await.ok_or(MarketError::Unauthorized)
    }

    async fn login(&self, email: &str, password: &str, stay: bool) -> Result<User, MarketError> {
        let user = self.current_user().await?;
        // exact equality against the record the session points at; not a
        // directory scan
        if user.email != email || user.password != password {
            return Err(MarketError::Unauthorized);
        }
        self.session.set_logged_in(true);
        self.session.set_stay_logged_in(stay);
        info!("user {} logged in", user.id);
        Ok(user)
    }

    async fn admin_login(&self, key: &str) -> Result<User, MarketError> {
        if key != ADMIN_SETUP_KEY {
            return Err(MarketError::Unauthorized);
        }
        let mut user = self.current_user().await?;
        user.name = ADMIN_NAME.to_owned();
        user.email = ADMIN_EMAIL.to_owned();
        user.password = ADMIN_PASSWORD.to_owned();
        user.subscription = SubscriptionStatus::PremiumPlus;
        user.enhanced_credits = ADMIN_ENHANCED_CREDITS;
        user.is_admin = true;
        self.users.update(user.clone()).await;
        self.session.set_logged_in(true);
        warn!("account {} elevated to admin", user.id);
        Ok(user)
    }

    async fn create_account(&self, form: NewAccount) -> Result<User, MarketError> {
        if form.name.trim().is_empty() {
            return Err(MarketError::Validation("name is required".to_owned()));
        }
        if form.email.trim().is_empty() {
            return Err(MarketError::Validation("email is required".to_owned()));
        }
        if form.password.is_empty() {
            return Err(MarketError::Validation("password is required".to_owned()));
        }
        if form.password != form.password_confirmation {
            return Err(MarketError::Validation(
                "passwords do not match".to_owned(),
            ));
        }
        if form.wants_admin && form.admin_key.as_deref() != Some(ADMIN_SETUP_KEY) {
            return Err(MarketError::Unauthorized);
        }
        if self.users.is_email_banned(&form.email).await {
            return Err(MarketError::Validation(
                "this email address is banned".to_owned(),
            ));
        }

        let user = User {
            id: Uuid::new_v4(),
            name: form.name.trim().to_owned(),
            email: form.email.trim().to_owned(),
            password: form.password,
            location: form.location,
            bio: None,
            private_profile: false,
            subscription: SubscriptionStatus::None_,
            items_listed: 0,
            avatar_url: None,
            enhanced_credits: 0,
            sum_of_ratings: 0,
            total_ratings: 0,
            is_admin: form.wants_admin,
        };
        self.users.insert(user.clone()).await;
        self.session.set_current_user(user.id);
        info!("account {} created", user.id);
        Ok(user)
    }

    async fn set_current_user_by_name(&self, name: &str) -> Result<User, MarketError> {
        let user = self
            .users
            .find_by_name_ci(name)
            .await
            .ok_or(MarketError::NotFound("user"))?;
        self.session.set_current_user(user.id);
        Ok(user)
    }

    async fn update_profile(&self, changes: ProfileChanges) -> Result<User, MarketError> {
        let mut user = self.current_user().await?;
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(location) = changes.location {
            user.location = Some(location);
        }
        if let Some(bio) = changes.bio {
            user.bio = Some(bio);
        }
        if let Some(private_profile) = changes.private_profile {
            user.private_profile = private_profile;
        }
        self.users.update(user.clone()).await;
        Ok(user)
    }

    async fn upload_avatar(&self, filename: &str, bytes: Vec<u8>) -> Result<String, MarketError> {
        let mut user = self.current_user().await?;
        let path = format!("avatars/{}/{}", user.id, sanitize_filename(filename));
        let url = self.storage.store(&path, bytes).await?;
        user.avatar_url = Some(url.clone());
        self.users.update(user).await;
        Ok(url)
    }

    async fn public_profile(&self, id: Uuid) -> Result<User, MarketError> {
        self.users.find(id).await.ok_or(MarketError::NotFound("user"))
    }

    async fn logout(&self) {
        self.session.set_logged_in(false);
    }
}
