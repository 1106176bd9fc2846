//! JSON HTTP API over [`MeteringService`].

mod baselines;
mod classifications;
mod definitions;
mod enpi;
pub mod error;
mod metering_data;
mod reports;
mod targets;

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};

use crate::service::MeteringService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MeteringService>,
}

pub fn router(service: Arc<MeteringService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/classifications",
            get(classifications::list).post(classifications::create),
        )
        .route(
            "/api/classifications/:id",
            get(classifications::get_one)
                .put(classifications::update)
                .delete(classifications::delete),
        )
        .route("/api/metering-data", get(metering_data::list))
        .route("/api/metering-data/export", get(metering_data::export))
        .route("/api/metering-data/generate", post(metering_data::generate))
        .route("/api/enpi", get(enpi::list))
        .route("/api/enpi/calculate", post(enpi::calculate))
        .route("/api/enpi/:id", get(enpi::get_one).delete(enpi::delete))
        .route("/api/baselines", get(baselines::list).post(baselines::create))
        .route("/api/baselines/:id", get(baselines::get_one).delete(baselines::delete))
        .route(
            "/api/enpi-definitions",
            get(definitions::list).post(definitions::create),
        )
        .route(
            "/api/enpi-definitions/:id",
            get(definitions::get_one)
                .put(definitions::update)
                .delete(definitions::delete),
        )
        .route("/api/targets", get(targets::list).post(targets::create))
        .route(
            "/api/targets/:id",
            get(targets::get_one).put(targets::update).delete(targets::delete),
        )
        .route("/api/reports/pareto", get(reports::pareto))
        .route("/api/reports/heatmap", get(reports::heatmap))
        .route("/api/reports/daily", get(reports::daily))
        .route("/api/reports/summary", get(reports::summary))
        .route("/api/reports/classifications", get(reports::classifications))
        .layer(middleware::from_fn(track_requests))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn track_requests(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    tracing::debug!(%method, %path, %status, "request handled");
    metrics::counter!("http_requests_total", "method" => method, "path" => path, "status" => status).increment(1);

    response
}
