//! The Store trait that backends implement.

use crate::types::*;
use crate::StoreError;

/// Persistence for SOW records and their signing tokens.
///
/// Every method that writes to both tables does so inside a single backend transaction.
#[cfg_attr(feature = "test-support", mockall::automock)]
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // ───────────────────────────────────── SOWs ───────────────────────────────────────────

    /// Insert a SOW (status `sent`) together with its first signing token.
    /// Either both rows are written or neither is.
    async fn create_sow_with_token(
        &self,
        params: &CreateSowParams,
    ) -> Result<(Sow, SigningToken), StoreError>;

    /// Get a SOW by ID.
    async fn get_sow(&self, sow_id: &SowId) -> Result<Sow, StoreError>;

    /// List every SOW, newest first.
    async fn list_sows(&self) -> Result<Vec<Sow>, StoreError>;

    /// Delete a SOW and all of its tokens.
    async fn delete_sow(&self, sow_id: &SowId) -> Result<(), StoreError>;

    // ───────────────────────────────────── Tokens ─────────────────────────────────────────

    /// Issue an additional token for a SOW that is not yet completed.
    /// Returns `Conflict` when the SOW is already completed.
    async fn issue_token(&self, params: &IssueTokenParams) -> Result<SigningToken, StoreError>;

    /// Get a token by its bearer string.
    async fn get_token(&self, token: &str) -> Result<SigningToken, StoreError>;

    /// List all tokens issued for a SOW, oldest first.
    async fn list_tokens(&self, sow_id: &SowId) -> Result<Vec<SigningToken>, StoreError>;

    // ───────────────────────────────────── Signing ────────────────────────────────────────

    /// Consume a token and record the client's acknowledgement on its SOW.
    ///
    /// The token is claimed with a conditional update (`used = false AND expires_at > now`),
    /// so among concurrent callers exactly one succeeds. Losers get `TokenUsed`,
    /// `TokenExpired` or `NotFound` and nothing is written for them.
    async fn complete_signing(&self, params: &CompleteSigningParams) -> Result<Sow, StoreError>;
}
