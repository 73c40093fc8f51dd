//! Mapping of engine errors onto HTTP responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use mesh_aggregator::AggregationError;
use mesh_common::MeshError;
use serde::{Deserialize, Serialize};

/// Exception body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionResponse {
    /// Exception type identifier.
    #[serde(rename = "type")]
    pub type_: String,

    pub title: String,

    pub status: u16,

    pub detail: String,
}

impl ExceptionResponse {
    pub fn from_error(err: &MeshError) -> Self {
        let status = err.http_status_code();
        let title = StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Error")
            .to_string();
        Self {
            type_: format!("urn:mesh-api:error:{}", err.kind()),
            title,
            status,
            detail: err.to_string(),
        }
    }
}

/// Handler error carrying the client-facing kind.
#[derive(Debug)]
pub struct ApiError(pub MeshError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.http_status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn missing(param: &str) -> Self {
        Self(MeshError::InvalidParameter {
            param: param.to_string(),
            message: "missing required parameter".to_string(),
        })
    }
}

impl From<MeshError> for ApiError {
    fn from(err: MeshError) -> Self {
        Self(err)
    }
}

impl From<AggregationError> for ApiError {
    fn from(err: AggregationError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::to_string(&ExceptionResponse::from_error(&self.0))
            .unwrap_or_default();
        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}
