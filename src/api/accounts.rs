//! Account, session and profile endpoints

use crate::api::{ApiError, ensure_logged_in};
use crate::core::error::MarketError;
use crate::core::traits::{AccountService, NewAccount, ProfileChanges};
use crate::infrastructure::session::Session;
use axum::extract::{Multipart, Path};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use di_axum::Inject;
use uuid::Uuid;

pub fn router() -> Router {
    Router::new()
        .route("/accounts", post(create_account))
        .route("/accounts/login", post(login))
        .route("/accounts/admin-login", post(admin_login))
        .route("/accounts/logout", post(logout))
        .route("/accounts/switch", post(switch_user))
        .route("/profile", get(profile).put(update_profile))
        .route("/profile/avatar", post(upload_avatar))
        .route("/users/:id", get(public_profile))
}

async fn create_account(
    Inject(accounts): Inject<dyn AccountService>,
    Json(request): Json<schemas::CreateAccount>,
) -> Result<(StatusCode, Json<schemas::Profile>), ApiError> {
    let user = accounts
        .create_account(NewAccount {
            name: request.name,
            email: request.email,
            password: request.password,
            password_confirmation: request.password_confirmation,
            location: request.location,
            wants_admin: request.wants_admin,
            admin_key: request.admin_key,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn login(
    Inject(accounts): Inject<dyn AccountService>,
    Json(request): Json<schemas::Login>,
) -> Result<Json<schemas::Profile>, ApiError> {
    let user = accounts
        .login(&request.email, &request.password, request.stay_logged_in)
        .await?;
    Ok(Json(user.into()))
}

async fn admin_login(
    Inject(accounts): Inject<dyn AccountService>,
    Json(request): Json<schemas::AdminLogin>,
) -> Result<Json<schemas::Profile>, ApiError> {
    let user = accounts.admin_login(&request.key).await?;
    Ok(Json(user.into()))
}

async fn logout(Inject(accounts): Inject<dyn AccountService>) -> StatusCode {
    accounts.logout().await;
    StatusCode::NO_CONTENT
}

async fn switch_user(
    Inject(accounts): Inject<dyn AccountService>,
    Json(request): Json<schemas::SwitchUser>,
) -> Result<Json<schemas::Profile>, ApiError> {
    let user = accounts.set_current_user_by_name(&request.name).await?;
    Ok(Json(user.into()))
}

async fn profile(
    Inject(accounts): Inject<dyn AccountService>,
    Inject(session): Inject<Session>,
) -> Result<Json<schemas::Profile>, ApiError> {
    ensure_logged_in(&session)?;
    let user = accounts.current_user().await?;
    Ok(Json(user.into()))
}

async fn update_profile(
    Inject(accounts): Inject<dyn AccountService>,
    Inject(session): Inject<Session>,
    Json(request): Json<schemas::UpdateProfile>,
) -> Result<Json<schemas::Profile>, ApiError> {
    ensure_logged_in(&session)?;
    let user = accounts
        .update_profile(ProfileChanges {
            name: request.name,
            location: request.location,
            bio: request.bio,
            private_profile: request.private_profile,
        })
        .await?;
    Ok(Json(user.into()))
}

async fn upload_avatar(
    Inject(accounts): Inject<dyn AccountService>,
    Inject(session): Inject<Session>,
    mut multipart: Multipart,
) -> Result<Json<schemas::AvatarUploaded>, ApiError> {
    ensure_logged_in(&session)?;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError(MarketError::Validation(e.to_string())))?
    {
        if field.name() == Some("avatar") {
            let filename = field.file_name().unwrap_or("upload").to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError(MarketError::Validation(e.to_string())))?
                .to_vec();
            let avatar_url = accounts.upload_avatar(&filename, bytes).await?;
            return Ok(Json(schemas::AvatarUploaded { avatar_url }));
        }
    }
    Err(ApiError(MarketError::Validation(
        "avatar field is missing".to_owned(),
    )))
}

async fn public_profile(
    Inject(accounts): Inject<dyn AccountService>,
    Path(id): Path<Uuid>,
) -> Result<Json<schemas::PublicProfile>, ApiError> {
    let user = accounts.public_profile(id).await?;
    Ok(Json(user.into()))
}

pub mod schemas {
    use crate::core::views::{RatingDisplay, star_breakdown};
    use crate::infrastructure::entities::{self, SubscriptionStatus};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Serialize, Debug)]
    pub struct Rating {
        pub has_ratings: bool,
        pub average: Option<f64>,
        pub full_stars: u8,
        pub half_stars: u8,
        pub empty_stars: u8,
    }

    impl Rating {
        fn of(user: &entities::User) -> Self {
            match star_breakdown(user.sum_of_ratings, user.total_ratings) {
                RatingDisplay::NoRatings => Rating {
                    has_ratings: false,
                    average: None,
                    full_stars: 0,
                    half_stars: 0,
                    empty_stars: 5,
                },
                RatingDisplay::Stars {
                    average,
                    full,
                    half,
                    empty,
                } => Rating {
                    has_ratings: true,
                    average: Some(average),
                    full_stars: full,
                    half_stars: half,
                    empty_stars: empty,
                },
            }
        }
    }

    #[derive(Serialize, Debug)]
    pub struct Profile {
        pub id: Uuid,
        pub name: String,
        pub email: String,
        pub location: Option<String>,
        pub bio: Option<String>,
        pub private_profile: bool,
        pub subscription: String,
        pub items_listed: u32,
        pub avatar_url: Option<String>,
        pub enhanced_credits: u32,
        pub is_admin: bool,
        pub rating: Rating,
    }

    impl From<entities::User> for Profile {
        fn from(user: entities::User) -> Self {
            let rating = Rating::of(&user);
            Profile {
                id: user.id,
                name: user.name,
                email: user.email,
                location: user.location,
                bio: user.bio,
                private_profile: user.private_profile,
                subscription: subscription_str(user.subscription).to_owned(),
                items_listed: user.items_listed,
                avatar_url: user.avatar_url,
                enhanced_credits: user.enhanced_credits,
                is_admin: user.is_admin,
                rating,
            }
        }
    }

    /// Public view: location and bio are withheld for private profiles.
    #[derive(Serialize, Debug)]
    pub struct PublicProfile {
        pub id: Uuid,
        pub name: String,
        pub avatar_url: Option<String>,
        pub location: Option<String>,
        pub bio: Option<String>,
        pub rating: Rating,
    }

    impl From<entities::User> for PublicProfile {
        fn from(user: entities::User) -> Self {
            let rating = Rating::of(&user);
            let (location, bio) = if user.private_profile {
                (None, None)
            } else {
                (user.location, user.bio)
            };
            PublicProfile {
                id: user.id,
                name: user.name,
                avatar_url: user.avatar_url,
                location,
                bio,
                rating,
            }
        }
    }

    #[derive(Deserialize, Debug)]
    pub struct CreateAccount {
        pub name: String,
        pub email: String,
        pub password: String,
        pub password_confirmation: String,
        pub location: Option<String>,
        #[serde(default)]
        pub wants_admin: bool,
        pub admin_key: Option<String>,
    }

    #[derive(Deserialize, Debug)]
    pub struct Login {
        pub email: String,
        pub password: String,
        #[serde(default)]
        pub stay_logged_in: bool,
    }

    #[derive(Deserialize, Debug)]
    pub struct AdminLogin {
        pub key: String,
    }

    #[derive(Deserialize, Debug)]
    pub struct SwitchUser {
        pub name: String,
    }

    #[derive(Deserialize, Debug, Default)]
    pub struct UpdateProfile {
        pub name: Option<String>,
        pub location: Option<String>,
        pub bio: Option<String>,
        pub private_profile: Option<bool>,
    }

    #[derive(Serialize, Debug)]
    pub struct AvatarUploaded {
        pub avatar_url: String,
    }

    fn subscription_str(status: SubscriptionStatus) -> &'static str {
        match status {
            SubscriptionStatus::None_ => "none",
            SubscriptionStatus::FreeTrial => "free_trial",
            SubscriptionStatus::Subscribed => "subscribed",
            SubscriptionStatus::PremiumPlus => "premium_plus",
        }
    }
}
