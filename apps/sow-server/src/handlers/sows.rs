use super::{json_body, parse_sow_id, SowView};
use crate::error::ApiError;
use crate::server::{CreateSowRequest, IssuedSow, SowServer};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sow_storage::SowData;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct SendSowBody {
    #[serde(default)]
    pub data: SowData,
    #[serde(default)]
    pub arcodic_signature: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_name: String,
}

#[derive(Debug, Serialize)]
pub struct SendSowResponse {
    pub success: bool,
    pub sow_id: Uuid,
    pub signing_url: String,
    pub email_delivered: bool,
}

impl From<IssuedSow> for SendSowResponse {
    fn from(issued: IssuedSow) -> Self {
        Self {
            success: true,
            sow_id: issued.sow.id.0,
            signing_url: issued.signing_url,
            email_delivered: issued.delivery.all_delivered(),
        }
    }
}

pub async fn send_sow(
    State(server): State<SowServer>,
    body: Result<Json<SendSowBody>, JsonRejection>,
) -> Result<Json<SendSowResponse>, ApiError> {
    let body = json_body(body)?;
    let issued = server
        .create_sow(CreateSowRequest {
            client_name: body.client_name,
            client_email: body.client_email,
            provider_signature: body.arcodic_signature,
            data: body.data,
        })
        .await?;
    Ok(Json(issued.into()))
}

pub async fn reissue_token(
    State(server): State<SowServer>,
    Path(id): Path<String>,
) -> Result<Json<SendSowResponse>, ApiError> {
    let sow_id = parse_sow_id(&id)?;
    let issued = server.reissue_token(&sow_id).await?;
    Ok(Json(issued.into()))
}

pub async fn get_sow(
    State(server): State<SowServer>,
    Path(id): Path<String>,
) -> Result<Json<SowView>, ApiError> {
    let sow_id = parse_sow_id(&id)?;
    Ok(Json(server.get_sow(&sow_id).await?.into()))
}

pub async fn delete_sow(
    State(server): State<SowServer>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let sow_id = parse_sow_id(&id)?;
    server.delete_sow(&sow_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
