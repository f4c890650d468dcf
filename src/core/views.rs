//! Derived view projections
//!
//! Pure functions over store snapshots. Nothing here mutates; every screen
//! recomputes its projection from a fresh snapshot on each request.

use crate::infrastructure::entities::{Conversation, Item};
use uuid::Uuid;

/// Case-insensitive substring match over name, description and category.
/// An empty or whitespace-only query keeps everything.
pub fn search(items: &[Item], query: &str) -> Vec<Item> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| {
            item.name.to_lowercase().contains(&needle)
                || item.description.to_lowercase().contains(&needle)
                || item.category.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// The user's own listings, enhanced ones first, input order otherwise.
pub fn own_listings(items: &[Item], user_id: Uuid) -> Vec<Item> {
    let mut own: Vec<Item> = items
        .iter()
        .filter(|item| item.seller_id == user_id)
        .cloned()
        .collect();
    // stable sort keeps the relative order inside each group
    own.sort_by_key(|item| !item.enhanced);
    own
}

/// Conversations the user participates in that carry unread messages,
/// newest activity first.
pub fn unread_conversations(conversations: &[Conversation], user_id: Uuid) -> Vec<Conversation> {
    let mut unread: Vec<Conversation> = conversations
        .iter()
        .filter(|c| c.involves(user_id) && c.unread_count > 0)
        .cloned()
        .collect();
    unread.sort_by_key(|c| std::cmp::Reverse(c.last_message.as_ref().map(|m| m.sent_at)));
    unread
}

/// Badge total: unread counts summed over the unread projection.
pub fn unread_total(unread: &[Conversation]) -> u32 {
    unread.iter().map(|c| c.unread_count).sum()
}

/// Five-position star rendering of an aggregate rating.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingDisplay {
    /// No ratings yet; distinct from an average of zero.
    NoRatings,
    Stars {
        average: f64,
        full: u8,
        half: u8,
        empty: u8,
    },
}

/// `floor(average)` full stars, one half star when the fractional part is
/// at least 0.5, empty stars for the rest of the five positions.
pub fn star_breakdown(sum_of_ratings: u32, total_ratings: u32) -> RatingDisplay {
    if total_ratings == 0 {
        return RatingDisplay::NoRatings;
    }
    let average = f64::from(sum_of_ratings) / f64::from(total_ratings);
    let full = (average.floor() as u8).min(5);
    let half = if average - f64::from(full) >= 0.5 && full < 5 {
        1
    } else {
        0
    };
    RatingDisplay::Stars {
        average,
        full,
        half,
        empty: 5 - full - half,
    }
}
