//! Mesh geometry handler.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
};
use mesh_aggregator::{MeshGeometry, MeshRequest};

use super::{respond, run_blocking, FieldParams};
use crate::error::ApiError;
use crate::metrics::RequestTimer;
use crate::state::AppState;

/// GET /v1/datasets/:dataset/mesh
pub async fn mesh_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(dataset): Path<String>,
    Query(params): Query<FieldParams>,
) -> Response {
    let timer = RequestTimer::start("mesh");
    respond(timer, mesh(state, dataset, params).await)
}

async fn mesh(
    state: Arc<AppState>,
    dataset: String,
    params: FieldParams,
) -> Result<MeshGeometry, ApiError> {
    let request = MeshRequest::new(dataset, params.domain()?);
    run_blocking(state, move |service| service.mesh(&request)).await
}
