//! HTTP surface
//!
//! One router per resource, each with its `schemas` submodule mapping
//! entities to wire types. Shared plumbing lives here.

use crate::core::error::MarketError;
use crate::infrastructure::session::Session;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub mod accounts;
pub mod conversations;
pub mod items;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

/// Domain failure as an HTTP response: a status code plus a JSON error body.
#[derive(Debug)]
pub struct ApiError(pub MarketError);

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            MarketError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            MarketError::Unauthorized => StatusCode::UNAUTHORIZED,
            MarketError::NotFound(_) => StatusCode::NOT_FOUND,
            MarketError::QuotaExceeded => StatusCode::FORBIDDEN,
            MarketError::Storage(_) => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Gate for authenticated-only routes: the persisted `isLoggedIn` flag must
/// be present.
pub fn ensure_logged_in(session: &Session) -> Result<(), ApiError> {
    if session.is_logged_in() {
        Ok(())
    } else {
        Err(ApiError(MarketError::Unauthorized))
    }
}
