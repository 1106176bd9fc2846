use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use metering_client::domain::{EnpiDefinition, NewEnpiDefinition};

use super::{error::ApiResult, AppState};

pub(super) async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<EnpiDefinition>>> {
    Ok(Json(state.service.list_definitions().await?))
}

pub(super) async fn get_one(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Json<EnpiDefinition>> {
    Ok(Json(state.service.get_definition(id).await?))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewEnpiDefinition>,
) -> ApiResult<(StatusCode, Json<EnpiDefinition>)> {
    let created = state.service.create_definition(&body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<NewEnpiDefinition>,
) -> ApiResult<Json<EnpiDefinition>> {
    Ok(Json(state.service.update_definition(id, &body).await?))
}

pub(super) async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<StatusCode> {
    state.service.delete_definition(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
