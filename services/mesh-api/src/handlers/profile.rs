//! Latitude profile handlers.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    response::Response,
};
use mesh_aggregator::{HeightProfile, HeightProfileRequest, LatProfileRequest};

use super::{respond, run_blocking, DataResponse, FieldParams};
use crate::error::ApiError;
use crate::metrics::RequestTimer;
use crate::state::AppState;

/// GET /v1/datasets/:dataset/height-profile
pub async fn height_profile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(dataset): Path<String>,
    Query(params): Query<FieldParams>,
) -> Response {
    let timer = RequestTimer::start("height_profile");
    respond(timer, height_profile(state, dataset, params).await)
}

async fn height_profile(
    state: Arc<AppState>,
    dataset: String,
    params: FieldParams,
) -> Result<HeightProfile, ApiError> {
    let request = HeightProfileRequest::new(dataset, params.variable()?, params.domain()?)
        .at_time(params.time()?)
        .with_reduction(params.reduction()?);
    run_blocking(state, move |service| service.height_profile(&request)).await
}

/// GET /v1/datasets/:dataset/lat-profile
pub async fn lat_profile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(dataset): Path<String>,
    Query(params): Query<FieldParams>,
) -> Response {
    let timer = RequestTimer::start("lat_profile");
    respond(timer, lat_profile(state, dataset, params).await)
}

async fn lat_profile(
    state: Arc<AppState>,
    dataset: String,
    params: FieldParams,
) -> Result<DataResponse<f64>, ApiError> {
    let request = LatProfileRequest::new(dataset, params.variable()?, params.domain()?)
        .at_time(params.time()?)
        .at_height(params.height()?)
        .with_reduction(params.reduction()?);
    let data = run_blocking(state, move |service| service.lat_profile(&request)).await?;
    Ok(DataResponse { data })
}
