//! Prediction record handlers

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use gluco_core::PatientRecord;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

/// Upper bound on a single listing
const MAX_LIMIT: i64 = 500;

/// Query parameters for record listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListRecordsQuery {
    /// Number of records to return
    #[param(default = 50)]
    pub limit: Option<i64>,
}

/// List the most recent prediction records, newest first
#[utoipa::path(
    get,
    path = "/records",
    tag = "records",
    params(ListRecordsQuery),
    responses(
        (status = 200, description = "Recent records", body = [PatientRecord]),
        (status = 500, description = "Record store failure", body = crate::error::ApiError)
    )
)]
pub async fn list_records(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListRecordsQuery>,
) -> Result<Json<Vec<PatientRecord>>, AppError> {
    state.increment_requests();

    let limit = params
        .limit
        .unwrap_or(state.config.database.list_limit)
        .clamp(1, MAX_LIMIT);
    let records = state.records.list_records(limit).await?;

    Ok(Json(records))
}
