use super::{json_body, SowView};
use crate::error::ApiError;
use crate::server::{ExecutedSow, SowServer};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct OpenLinkResponse {
    pub state: &'static str,
    pub sow: SowView,
}

pub async fn open_link(
    State(server): State<SowServer>,
    Path(token): Path<String>,
) -> Result<Json<OpenLinkResponse>, ApiError> {
    let sow = server.begin_signing(&token).await?;
    Ok(Json(OpenLinkResponse {
        state: "ready",
        sow: sow.into(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct CompleteSowBody {
    #[serde(default)]
    pub token: String,
    /// Typed name of the person signing
    #[serde(default)]
    pub client_signature: String,
}

#[derive(Debug, Serialize)]
pub struct CompleteSowResponse {
    pub success: bool,
    pub sow_id: Uuid,
    /// False when either executed copy could not be emailed
    pub email_delivered: bool,
}

impl From<ExecutedSow> for CompleteSowResponse {
    fn from(executed: ExecutedSow) -> Self {
        Self {
            success: true,
            sow_id: executed.sow.id.0,
            email_delivered: executed.delivery.all_delivered(),
        }
    }
}

pub async fn complete_sow(
    State(server): State<SowServer>,
    body: Result<Json<CompleteSowBody>, JsonRejection>,
) -> Result<Json<CompleteSowResponse>, ApiError> {
    let body = json_body(body)?;
    let executed = server
        .complete_signing(&body.token, &body.client_signature)
        .await?;
    Ok(Json(executed.into()))
}
