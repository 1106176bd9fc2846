use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use metering_client::domain::{Baseline, NewBaseline};

use super::{error::ApiResult, AppState};

pub(super) async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Baseline>>> {
    Ok(Json(state.service.list_baselines().await?))
}

pub(super) async fn get_one(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Json<Baseline>> {
    Ok(Json(state.service.get_baseline(id).await?))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewBaseline>,
) -> ApiResult<(StatusCode, Json<Baseline>)> {
    let created = state.service.create_baseline(&body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<StatusCode> {
    state.service.delete_baseline(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
