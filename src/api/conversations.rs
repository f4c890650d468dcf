//! Messaging endpoints

use crate::api::{ApiError, ensure_logged_in};
use crate::core::traits::MessagingService;
use crate::core::views;
use crate::infrastructure::session::Session;
use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_conversations))
        .route("/unread", get(unread_summary))
        .route("/contact", post(contact_seller))
        .route("/:id/messages", get(conversation_messages).post(post_message))
}

async fn list_conversations(
    Inject(messaging): Inject<dyn MessagingService>,
) -> Result<Json<schemas::ConversationList>, ApiError> {
    let conversations = messaging.my_conversations().await?;
    Ok(Json(schemas::ConversationList::from_conversations(
        conversations,
    )))
}

async fn unread_summary(
    Inject(messaging): Inject<dyn MessagingService>,
) -> Result<Json<schemas::UnreadSummary>, ApiError> {
    let conversations = messaging.unread_conversations().await?;
    let total = views::unread_total(&conversations);
    Ok(Json(schemas::UnreadSummary {
        conversations: conversations
            .into_iter()
            .map(schemas::Conversation::from)
            .collect(),
        total,
    }))
}

async fn contact_seller(
    Inject(messaging): Inject<dyn MessagingService>,
    Json(request): Json<schemas::ContactSeller>,
) -> Result<Json<schemas::Conversation>, ApiError> {
    let conversation = messaging.contact_seller(request.item_id).await?;
    Ok(Json(conversation.into()))
}

async fn conversation_messages(
    Inject(messaging): Inject<dyn MessagingService>,
    Path(conversation_id): Path<Uuid>,
) -> Result<Json<schemas::MessagesList>, ApiError> {
    let messages = messaging.transcript(conversation_id).await?;
    Ok(Json(schemas::MessagesList {
        messages: messages.into_iter().map(schemas::Message::from).collect(),
    }))
}

async fn post_message(
    Inject(messaging): Inject<dyn MessagingService>,
    Inject(session): Inject<Session>,
    Path(conversation_id): Path<Uuid>,
    Json(request): Json<schemas::CreateMessage>,
) -> Result<(StatusCode, Json<schemas::Message>), ApiError> {
    ensure_logged_in(&session)?;
    let message = messaging.send_message(conversation_id, request.content).await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

/// `POST /reports`, mounted outside the `/conversations` nest.
pub async fn report_item(
    Inject(messaging): Inject<dyn MessagingService>,
    Inject(session): Inject<Session>,
    Json(request): Json<schemas::CreateReport>,
) -> Result<(StatusCode, Json<schemas::Message>), ApiError> {
    ensure_logged_in(&session)?;
    let message = messaging
        .report_item(request.item_id, request.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(message.into())))
}

pub mod schemas {
    use crate::infrastructure::entities;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Serialize, Debug)]
    pub struct Participant {
        pub id: Uuid,
        pub name: String,
        pub avatar_url: Option<String>,
    }

    #[derive(Serialize, Debug)]
    pub struct LastMessage {
        pub content: String,
        pub sent_at: DateTime<Utc>,
    }

    #[derive(Serialize, Debug)]
    pub struct Conversation {
        pub id: Uuid,
        pub item_id: Uuid,
        pub item_name: String,
        pub item_thumbnail: Option<String>,
        pub participants: Vec<Participant>,
        pub last_message: Option<LastMessage>,
        pub unread_count: u32,
        pub buy_request: String,
        pub price_at_request_cents: Option<i64>,
        pub item_unavailable: bool,
    }

    impl From<entities::Conversation> for Conversation {
        fn from(conversation: entities::Conversation) -> Self {
            Conversation {
                id: conversation.id,
                item_id: conversation.item_id,
                item_name: conversation.item_name,
                item_thumbnail: conversation.item_thumbnail,
                participants: conversation
                    .participants
                    .into_iter()
                    .map(|p| Participant {
                        id: p.id,
                        name: p.name,
                        avatar_url: p.avatar_url,
                    })
                    .collect(),
                last_message: conversation.last_message.map(|m| LastMessage {
                    content: m.content,
                    sent_at: m.sent_at,
                }),
                unread_count: conversation.unread_count,
                buy_request: buy_request_str(conversation.buy_request).to_owned(),
                price_at_request_cents: conversation.price_at_request_cents,
                item_unavailable: conversation.item_unavailable,
            }
        }
    }

    #[derive(Serialize, Debug, Default)]
    pub struct ConversationList {
        pub conversations: Vec<Conversation>,
    }

    impl ConversationList {
        pub fn from_conversations(conversations: Vec<entities::Conversation>) -> Self {
            ConversationList {
                conversations: conversations
                    .into_iter()
                    .map(Conversation::from)
                    .collect(),
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct UnreadSummary {
        pub conversations: Vec<Conversation>,
        pub total: u32,
    }

    #[derive(Serialize, Debug)]
    pub struct Message {
        pub id: Uuid,
        pub conversation_id: Uuid,
        pub from_id: Uuid,
        pub to_id: Uuid,
        pub item_id: Uuid,
        pub content: String,
        pub sent_at: DateTime<Utc>,
        pub read: bool,
        pub system: bool,
    }

    impl From<entities::Message> for Message {
        fn from(message: entities::Message) -> Self {
            Message {
                id: message.id,
                conversation_id: message.conversation_id,
                from_id: message.from_id,
                to_id: message.to_id,
                item_id: message.item_id,
                content: message.content,
                sent_at: message.sent_at,
                read: message.read,
                system: message.system,
            }
        }
    }

    #[derive(Serialize, Debug, Default)]
    pub struct MessagesList {
        pub messages: Vec<Message>,
    }

    #[derive(Deserialize, Debug)]
    pub struct ContactSeller {
        pub item_id: Uuid,
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateMessage {
        pub content: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateReport {
        pub item_id: Uuid,
        pub reason: String,
    }

    fn buy_request_str(status: entities::BuyRequestStatus) -> &'static str {
        match status {
            entities::BuyRequestStatus::None_ => "none",
            entities::BuyRequestStatus::PendingSellerResponse => "pending_seller_response",
            entities::BuyRequestStatus::Accepted => "accepted",
            entities::BuyRequestStatus::Declined => "declined",
        }
    }
}
