use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use metering_client::domain::{Reading, ReadingFilter};

use super::{error::ApiResult, AppState};
use crate::{error::MeteringError, export::readings_to_csv, service::GenerationRequest};

pub(super) async fn list(
    State(state): State<AppState>,
    Query(filter): Query<ReadingFilter>,
) -> ApiResult<Json<Vec<Reading>>> {
    Ok(Json(state.service.list_readings(&filter).await?))
}

pub(super) async fn export(
    State(state): State<AppState>,
    Query(filter): Query<ReadingFilter>,
) -> ApiResult<impl IntoResponse> {
    let readings = state.service.list_readings(&filter).await?;
    let body = readings_to_csv(&readings).map_err(MeteringError::Store)?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"metering-data.csv\""),
        ],
        body,
    ))
}

pub(super) async fn generate(
    State(state): State<AppState>,
    Json(req): Json<GenerationRequest>,
) -> ApiResult<(StatusCode, Json<Vec<Reading>>)> {
    let readings = state.service.generate_readings(&req).await?;
    Ok((StatusCode::CREATED, Json(readings)))
}
