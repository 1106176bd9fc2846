use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use metering_client::domain::Indicator;
use serde::Serialize;

use super::{error::ApiResult, AppState};
use crate::service::IndicatorRequest;

/// Indicator plus its derived improvement over the baseline.
#[derive(Debug, Serialize)]
pub(super) struct IndicatorView {
    #[serde(flatten)]
    indicator: Indicator,
    improvement_percent: Option<f64>,
}

impl From<Indicator> for IndicatorView {
    fn from(indicator: Indicator) -> Self {
        let improvement_percent = indicator.improvement_percent();
        Self {
            indicator,
            improvement_percent,
        }
    }
}

pub(super) async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<IndicatorView>>> {
    let rows = state.service.list_indicators().await?;
    Ok(Json(rows.into_iter().map(IndicatorView::from).collect()))
}

pub(super) async fn get_one(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<Json<IndicatorView>> {
    Ok(Json(state.service.get_indicator(id).await?.into()))
}

pub(super) async fn calculate(
    State(state): State<AppState>,
    Json(req): Json<IndicatorRequest>,
) -> ApiResult<(StatusCode, Json<IndicatorView>)> {
    let indicator = state.service.calculate_indicator(&req).await?;
    Ok((StatusCode::CREATED, Json(indicator.into())))
}

pub(super) async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<StatusCode> {
    state.service.delete_indicator(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
