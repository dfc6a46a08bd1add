//! Server unit and integration tests.
//!
//! - `common` - shared harness (in-memory SQLite, recording email provider)
//! - `creation` - SOW creation and link reissue
//! - `signing` - link resolution, completion and replay protection
//! - `dashboard` - listing, filtering and payload round-trips
//! - `http` - the axum router end to end
//! - `mock_store` - store failures surfaced through the API
//! - `store_backend` - backend selection

pub mod common;

mod http;
