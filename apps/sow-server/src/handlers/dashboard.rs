use super::SowView;
use crate::dashboard::{DashboardQuery, StatusCounts};
use crate::error::ApiError;
use crate::server::SowServer;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub sows: Vec<SowView>,
    pub counts: StatusCounts,
    pub selected: Option<SowView>,
}

pub async fn dashboard(
    State(server): State<SowServer>,
    query: Result<Query<DashboardQuery>, QueryRejection>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::Validation(e.body_text()))?;
    let dashboard = server.dashboard(&query).await?;

    Ok(Json(DashboardResponse {
        sows: dashboard.sows.into_iter().map(SowView::from).collect(),
        counts: dashboard.counts,
        selected: dashboard.selected.map(SowView::from),
    }))
}
