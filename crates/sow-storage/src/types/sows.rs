//! SOW record types.

use chrono::{DateTime, Utc};
use std::str::FromStr;

use super::{SowData, SowId};

/// Lifecycle status of a SOW. `Completed` is terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SowStatus {
    Draft,
    Sent,
    Completed,
}

/// Error type for parsing SowStatus from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSowStatusError(pub String);

impl std::fmt::Display for ParseSowStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid sow status: {}", self.0)
    }
}

impl std::error::Error for ParseSowStatusError {}

impl FromStr for SowStatus {
    type Err = ParseSowStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SowStatus::Draft),
            "sent" => Ok(SowStatus::Sent),
            "completed" => Ok(SowStatus::Completed),
            _ => Err(ParseSowStatusError(s.to_string())),
        }
    }
}

impl SowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SowStatus::Draft => "draft",
            SowStatus::Sent => "sent",
            SowStatus::Completed => "completed",
        }
    }
}

/// SOW record
#[derive(Clone, Debug)]
pub struct Sow {
    pub id: SowId,
    pub client_name: String,
    pub client_email: String,
    pub data: SowData,
    pub provider_signature: String,
    pub provider_signed_at: DateTime<Utc>,
    pub client_signature: Option<String>,
    pub client_signed_at: Option<DateTime<Utc>>,
    pub status: SowStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parameters for creating a SOW together with its first signing token
#[derive(Clone, Debug)]
pub struct CreateSowParams {
    pub client_name: String,
    pub client_email: String,
    pub data: SowData,
    pub provider_signature: String,
    pub provider_signed_at: DateTime<Utc>,
    pub token: String,
    pub token_expires_at: DateTime<Utc>,
}
