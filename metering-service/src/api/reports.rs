use axum::{
    extract::{Query, State},
    Json,
};
use metering_client::domain::ReadingFilter;
use serde::Deserialize;

use super::{error::ApiResult, AppState};
use crate::report::{ClassificationTotals, DailyPoint, GroupBy, LoadHeatmap, Metric, ParetoEntry, Summary};

#[derive(Debug, Deserialize)]
pub(super) struct ParetoParams {
    group_by: GroupBy,
    #[serde(default = "default_metric")]
    metric: Metric,
}

fn default_metric() -> Metric {
    Metric::Energy
}

pub(super) async fn pareto(
    State(state): State<AppState>,
    Query(filter): Query<ReadingFilter>,
    Query(params): Query<ParetoParams>,
) -> ApiResult<Json<Vec<ParetoEntry>>> {
    Ok(Json(
        state
            .service
            .pareto_report(&filter, params.group_by, params.metric)
            .await?,
    ))
}

pub(super) async fn heatmap(
    State(state): State<AppState>,
    Query(filter): Query<ReadingFilter>,
) -> ApiResult<Json<LoadHeatmap>> {
    Ok(Json(state.service.heatmap_report(&filter).await?))
}

pub(super) async fn daily(
    State(state): State<AppState>,
    Query(filter): Query<ReadingFilter>,
) -> ApiResult<Json<Vec<DailyPoint>>> {
    Ok(Json(state.service.daily_report(&filter).await?))
}

pub(super) async fn summary(
    State(state): State<AppState>,
    Query(filter): Query<ReadingFilter>,
) -> ApiResult<Json<Summary>> {
    Ok(Json(state.service.summary_report(&filter).await?))
}

pub(super) async fn classifications(
    State(state): State<AppState>,
    Query(filter): Query<ReadingFilter>,
) -> ApiResult<Json<Vec<ClassificationTotals>>> {
    Ok(Json(state.service.classification_report(&filter).await?))
}
