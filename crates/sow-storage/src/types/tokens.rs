//! Signing token types.

use chrono::{DateTime, Utc};

use super::{SigningTokenId, SowId};

/// Single-use, time-limited bearer capability to view and sign one SOW.
#[derive(Clone, Debug)]
pub struct SigningToken {
    pub id: SigningTokenId,
    pub token: String,
    pub sow_id: SowId,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Derived state of a token at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenState {
    Valid,
    Used,
    Expired,
}

impl SigningToken {
    /// A used token reports `Used` even after its deadline passes.
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.used {
            TokenState::Used
        } else if now >= self.expires_at {
            TokenState::Expired
        } else {
            TokenState::Valid
        }
    }
}

/// Parameters for issuing a token.
#[derive(Clone, Debug)]
pub struct IssueTokenParams {
    pub sow_id: SowId,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Parameters for the completion write.
#[derive(Clone, Debug)]
pub struct CompleteSigningParams {
    pub token: String,
    /// The name the link holder typed. Not a credential.
    pub acknowledgement: String,
    pub signed_at: DateTime<Utc>,
}
