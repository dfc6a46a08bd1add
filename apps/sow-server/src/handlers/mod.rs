//! HTTP handlers.
//!
//! - `sows` - creation, reissue, lookup and deletion of SOW records
//! - `signing` - link resolution and completion
//! - `dashboard` - the filtered list view

mod dashboard;
mod signing;
mod sows;

use crate::error::ApiError;
use crate::server::SowServer;
use axum::{
    extract::rejection::JsonRejection,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sow_storage::{Sow, SowData, SowId};
use uuid::Uuid;

/// Routes under `/api`.
pub fn router(server: SowServer) -> Router {
    Router::new()
        .route("/api/send-sow", post(sows::send_sow))
        .route("/api/complete-sow", post(signing::complete_sow))
        .route("/api/sign/{token}", get(signing::open_link))
        .route("/api/dashboard", get(dashboard::dashboard))
        .route("/api/sows/{id}", get(sows::get_sow).delete(sows::delete_sow))
        .route("/api/sows/{id}/tokens", post(sows::reissue_token))
        .with_state(server)
}

/// Wire representation of a SOW record.
#[derive(Debug, Serialize)]
pub struct SowView {
    pub id: Uuid,
    pub client_name: String,
    pub client_email: String,
    pub data: SowData,
    pub arcodic_signature: String,
    pub arcodic_signed_at: DateTime<Utc>,
    pub client_signature: Option<String>,
    pub client_signed_at: Option<DateTime<Utc>>,
    pub status: &'static str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Sow> for SowView {
    fn from(sow: Sow) -> Self {
        Self {
            id: sow.id.0,
            client_name: sow.client_name,
            client_email: sow.client_email,
            data: sow.data,
            arcodic_signature: sow.provider_signature,
            arcodic_signed_at: sow.provider_signed_at,
            client_signature: sow.client_signature,
            client_signed_at: sow.client_signed_at,
            status: sow.status.as_str(),
            created_at: sow.created_at,
            updated_at: sow.updated_at,
        }
    }
}

/// Unwrap a JSON body, reporting malformed input as a validation error.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|e| ApiError::Validation(e.body_text()))
}

/// Path ids that do not parse cannot name an existing record.
fn parse_sow_id(raw: &str) -> Result<SowId, ApiError> {
    Uuid::parse_str(raw)
        .map(SowId)
        .map_err(|_| ApiError::NotFound("Statement of work not found".to_string()))
}
