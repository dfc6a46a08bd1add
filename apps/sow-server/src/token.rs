//! Signing token generation.

use rand::{distr::Alphanumeric, Rng};

/// Length of a signing token in characters.
pub const TOKEN_LEN: usize = 32;

/// Generate a random URL-safe signing token of [`TOKEN_LEN`] alphanumerics.
pub fn generate_signing_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}
