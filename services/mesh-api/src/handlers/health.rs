//! Health and metrics handlers.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mesh_aggregator::LookupStatus;
use mesh_common::Domain;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    pub degraded: bool,
    pub lookups: Vec<LookupReport>,
}

#[derive(Serialize)]
pub struct LookupReport {
    pub domain: Domain,
    pub cells: usize,
    pub assigned_cells: usize,
    #[serde(flatten)]
    pub status: LookupStatus,
}

/// GET /health - Basic health check
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /ready - Readiness plus latitude lookup status
///
/// Degraded lookups still serve requests, so they do not make the service
/// unready.
pub async fn ready_handler(Extension(state): Extension<Arc<AppState>>) -> Json<ReadyResponse> {
    let lookups = state.service.lookups();
    let reports = lookups
        .iter()
        .map(|lookup| LookupReport {
            domain: lookup.domain(),
            cells: lookup.cell_count(),
            assigned_cells: lookup.assigned_cells(),
            status: lookup.status().clone(),
        })
        .collect();

    Json(ReadyResponse {
        ready: true,
        degraded: lookups.any_degraded(),
        lookups: reports,
    })
}

/// GET /metrics - Prometheus metrics
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    let body = state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "ok");
    }
}
