use axum::{extract::State, Json};

use crate::{
    api_state::ApiState,
    dto::{ClearResponse, SeedResponse},
    error::ApiError,
};

pub async fn seed_data(State(state): State<ApiState>) -> Result<Json<SeedResponse>, ApiError> {
    let report = state.admin.seed_default_corpus().await?;

    Ok(Json(SeedResponse {
        total: report.total,
        counts_by_type: report.counts_by_type,
    }))
}

pub async fn clear_data(State(state): State<ApiState>) -> Result<Json<ClearResponse>, ApiError> {
    let report = state.admin.clear_all().await?;

    Ok(Json(ClearResponse {
        vector_rows_deleted: report.vector_rows_deleted,
    }))
}
