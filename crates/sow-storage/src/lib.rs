//! Storage abstraction for statements of work.
//!
//! Backend crates (`sow-store-sqlite`, `sow-store-postgres`) implement [`Store`] so the
//! server never depends on a specific database engine or schema details.

use thiserror::Error;

mod store;
pub mod types;

pub use store::*;
pub use types::*;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    #[error("already exists")]
    AlreadyExists,
    #[error("conflict")]
    Conflict,
    #[error("signing token already used")]
    TokenUsed,
    #[error("signing token expired")]
    TokenExpired,
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Rejection a token in `state` produces, or `None` when the token is still valid.
    pub fn for_token_state(state: TokenState) -> Option<Self> {
        match state {
            TokenState::Valid => None,
            TokenState::Used => Some(StoreError::TokenUsed),
            TokenState::Expired => Some(StoreError::TokenExpired),
        }
    }
}
