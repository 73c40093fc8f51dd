//! Per-triangle value handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
};
use mesh_aggregator::{TrisAggRequest, TrisRequest};

use super::{respond, run_blocking, DataResponse, FieldParams};
use crate::error::ApiError;
use crate::metrics::RequestTimer;
use crate::state::AppState;

/// GET /v1/datasets/:dataset/tris
pub async fn tris_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(dataset): Path<String>,
    Query(params): Query<FieldParams>,
) -> Response {
    let timer = RequestTimer::start("tris");
    respond(timer, tris(state, dataset, params).await)
}

async fn tris(
    state: Arc<AppState>,
    dataset: String,
    params: FieldParams,
) -> Result<DataResponse<f32>, ApiError> {
    let request = TrisRequest::new(dataset, params.variable()?, params.domain()?)
        .at_time(params.time()?)
        .at_height(params.height()?);
    let data = run_blocking(state, move |service| service.tris(&request)).await?;
    Ok(DataResponse { data })
}

/// GET /v1/datasets/:dataset/tris-agg
pub async fn tris_agg_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(dataset): Path<String>,
    Query(params): Query<FieldParams>,
) -> Response {
    let timer = RequestTimer::start("tris_agg");
    respond(timer, tris_agg(state, dataset, params).await)
}

async fn tris_agg(
    state: Arc<AppState>,
    dataset: String,
    params: FieldParams,
) -> Result<DataResponse<f64>, ApiError> {
    let request = tris_agg_request(dataset, &params)?;
    let data = run_blocking(state, move |service| service.tris_agg(&request)).await?;
    Ok(DataResponse { data })
}

pub(crate) fn tris_agg_request(
    dataset: String,
    params: &FieldParams,
) -> Result<TrisAggRequest, ApiError> {
    let mut request = TrisAggRequest::new(dataset, params.variable()?, params.domain()?)
        .at_time(params.time()?)
        .with_reduction(params.reduction()?);
    if let Some(traversal) = params.traversal()? {
        request = request.with_traversal(traversal);
    }
    Ok(request)
}
