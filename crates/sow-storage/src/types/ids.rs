//! Strongly-typed identifiers.

use uuid::Uuid;

/// Statement of work identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SowId(pub Uuid);

/// Signing token row identifier (distinct from the bearer token string).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SigningTokenId(pub Uuid);
