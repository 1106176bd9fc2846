use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use metering_client::domain::{NewTarget, Target};
use serde::Deserialize;

use super::{error::ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct TargetQuery {
    definition_id: Option<i32>,
}

pub(super) async fn list(
    State(state): State<AppState>,
    Query(q): Query<TargetQuery>,
) -> ApiResult<Json<Vec<Target>>> {
    Ok(Json(state.service.list_targets(q.definition_id).await?))
}

pub(super) async fn get_one(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Json<Target>> {
    Ok(Json(state.service.get_target(id).await?))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewTarget>,
) -> ApiResult<(StatusCode, Json<Target>)> {
    let created = state.service.create_target(&body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<NewTarget>,
) -> ApiResult<Json<Target>> {
    Ok(Json(state.service.update_target(id, &body).await?))
}

pub(super) async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<StatusCode> {
    state.service.delete_target(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
