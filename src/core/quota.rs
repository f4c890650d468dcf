//! Subscription gating for listing creation

use crate::infrastructure::entities::SubscriptionStatus;

/// Free-trial accounts may hold at most this many listings.
pub const FREE_TRIAL_LISTING_CAP: u32 = 3;

/// Whether a user may create one more listing. Evaluated fresh at every
/// submission; the result is never cached.
pub fn can_list(subscription: SubscriptionStatus, items_listed: u32) -> bool {
    match subscription {
        SubscriptionStatus::Subscribed | SubscriptionStatus::PremiumPlus => true,
        SubscriptionStatus::FreeTrial => items_listed < FREE_TRIAL_LISTING_CAP,
        SubscriptionStatus::None_ => false,
    }
}
