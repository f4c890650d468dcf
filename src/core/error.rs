//! Domain error taxonomy

use crate::infrastructure::storage::StorageError;
use thiserror::Error;

/// Every failure a flow can surface. All of them are recoverable: the caller
/// can immediately retry the same action, and no partial mutation is left
/// behind by a failed flow.
#[derive(Debug, Error)]
pub enum MarketError {
    /// Malformed input, rejected before any store mutation.
    #[error("{0}")]
    Validation(String),

    /// Wrong password, wrong admin key, banned email. Deliberately does not
    /// say which field was wrong, except the banned-email case which is
    /// reported as an explicit validation message.
    #[error("not authorized")]
    Unauthorized,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// Listing denied by the subscription gate.
    #[error("listing limit reached for the current plan")]
    QuotaExceeded,

    /// The external storage backend is missing or rejected the upload. The
    /// whole submission aborts; nothing was saved.
    #[error("storage backend error: {0}")]
    Storage(String),
}

impl From<StorageError> for MarketError {
    fn from(err: StorageError) -> Self {
        MarketError::Storage(err.to_string())
    }
}
