use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use metering_client::domain::{Classification, NewClassification};

use super::{error::ApiResult, AppState};

pub(super) async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Classification>>> {
    Ok(Json(state.service.list_classifications().await?))
}

pub(super) async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<Classification>> {
    Ok(Json(state.service.get_classification(id).await?))
}

pub(super) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewClassification>,
) -> ApiResult<(StatusCode, Json<Classification>)> {
    let created = state.service.create_classification(&body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub(super) async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(body): Json<NewClassification>,
) -> ApiResult<Json<Classification>> {
    Ok(Json(state.service.update_classification(id, &body).await?))
}

pub(super) async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<StatusCode> {
    state.service.delete_classification(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
