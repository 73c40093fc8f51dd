//! HTTP request handlers for the mesh API.

pub mod health;
pub mod mesh;
pub mod profile;
pub mod stream;
pub mod tris;

use std::sync::Arc;

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use mesh_aggregator::{AggregationError, MeshDataService};
use mesh_common::{Domain, MeshError, Reduction, Traversal};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::metrics::RequestTimer;
use crate::state::AppState;

/// Query parameters shared by the dataset endpoints.
///
/// Every value arrives as a string so malformed input is reported in the
/// exception body rather than as a bare extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct FieldParams {
    pub variable: Option<String>,
    pub domain: Option<String>,
    pub time: Option<String>,
    pub height: Option<String>,
    pub reduction: Option<String>,
    pub traversal: Option<String>,
}

impl FieldParams {
    pub fn variable(&self) -> Result<String, ApiError> {
        match &self.variable {
            Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => Err(ApiError::missing("variable")),
        }
    }

    pub fn domain(&self) -> Result<Domain, ApiError> {
        let value = self.domain.as_deref().ok_or_else(|| ApiError::missing("domain"))?;
        Ok(value.parse::<Domain>()?)
    }

    pub fn time(&self) -> Result<usize, ApiError> {
        parse_index("time", self.time.as_deref())
    }

    pub fn height(&self) -> Result<usize, ApiError> {
        parse_index("height", self.height.as_deref())
    }

    /// Defaults to sum.
    pub fn reduction(&self) -> Result<Reduction, ApiError> {
        match self.reduction.as_deref() {
            Some(value) => Ok(value.parse::<Reduction>()?),
            None => Ok(Reduction::default()),
        }
    }

    /// `None` keeps the engine's configured traversal.
    pub fn traversal(&self) -> Result<Option<Traversal>, ApiError> {
        match self.traversal.as_deref() {
            Some(value) => Ok(Some(value.parse::<Traversal>()?)),
            None => Ok(None),
        }
    }
}

fn parse_index(param: &str, value: Option<&str>) -> Result<usize, ApiError> {
    match value {
        None => Ok(0),
        Some(v) => v.trim().parse().map_err(|_| {
            ApiError(MeshError::InvalidParameter {
                param: param.to_string(),
                message: format!("'{}' is not a non-negative integer", v),
            })
        }),
    }
}

/// Body of the single-vector endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct DataResponse<T> {
    pub data: Vec<T>,
}

/// Run a synchronous engine operation on the blocking pool.
pub(crate) async fn run_blocking<T, F>(state: Arc<AppState>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&MeshDataService) -> Result<T, AggregationError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || op(&state.service))
        .await
        .map_err(|e| ApiError(MeshError::InternalError(format!("worker task failed: {}", e))))?
        .map_err(ApiError::from)
}

/// Record the outcome and turn it into a JSON response.
pub(crate) fn respond<T: Serialize>(timer: RequestTimer, result: Result<T, ApiError>) -> Response {
    timer.finish(&result);
    match result {
        Ok(body) => Json(body).into_response(),
        Err(e) => {
            tracing::debug!(error = %e.0, "Request rejected");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = FieldParams {
            variable: Some("temp".to_string()),
            domain: Some("dom01".to_string()),
            ..Default::default()
        };
        assert_eq!(params.time().unwrap(), 0);
        assert_eq!(params.height().unwrap(), 0);
        assert_eq!(params.reduction().unwrap(), Reduction::Sum);
        assert_eq!(params.traversal().unwrap(), None);
        assert_eq!(params.domain().unwrap(), Domain::Dom01);
    }

    #[test]
    fn test_invalid_values() {
        let params = FieldParams {
            time: Some("-1".to_string()),
            reduction: Some("median".to_string()),
            domain: Some("dom7".to_string()),
            ..Default::default()
        };
        assert!(params.time().is_err());
        assert!(params.reduction().is_err());
        assert_eq!(params.domain().unwrap_err().0.kind(), "unknown-domain");
        assert_eq!(params.variable().unwrap_err().0.kind(), "invalid-parameter");
    }
}
