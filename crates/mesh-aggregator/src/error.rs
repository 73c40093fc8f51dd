//! Error types for the aggregation engine.

use mesh_common::MeshError;
use netcdf_parser::NetCdfError;
use thiserror::Error;

use crate::lookup::LookupError;

/// Errors that can occur while slicing and reducing a dataset.
#[derive(Error, Debug)]
pub enum AggregationError {
    /// Dataset file missing or unreadable.
    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    /// Variable absent from the dataset.
    #[error("variable not found: {0}")]
    VariableNotFound(String),

    /// Variable axes disagree with the expected layout or domain.
    #[error("axis mismatch: {0}")]
    AxisMismatch(String),

    /// Requested time/height/cell index beyond the variable's extent.
    #[error("axis index out of range: {0}")]
    AxisOutOfRange(String),

    /// Underlying read failed.
    #[error("failed to read slice: {0}")]
    ReadFailed(String),

    /// Dataset identifier rejected.
    #[error("invalid dataset identifier: {0}")]
    InvalidDatasetId(String),

    /// Invalid request or configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Latitude lookup could not be built.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl AggregationError {
    pub fn axis_mismatch(msg: impl Into<String>) -> Self {
        Self::AxisMismatch(msg.into())
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::AxisOutOfRange(msg.into())
    }

    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}

impl From<NetCdfError> for AggregationError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::DatasetNotFound(msg) => Self::DatasetNotFound(msg),
            NetCdfError::VariableNotFound { dataset, variable } => {
                Self::VariableNotFound(format!("{} in {}", variable, dataset))
            }
            NetCdfError::InvalidDatasetId(msg) => Self::InvalidDatasetId(msg),
            NetCdfError::OutOfBounds(msg) => Self::AxisOutOfRange(msg),
            NetCdfError::ReadFailed(msg) => Self::ReadFailed(msg),
            NetCdfError::IoError(e) => Self::ReadFailed(e.to_string()),
        }
    }
}

impl From<AggregationError> for MeshError {
    fn from(err: AggregationError) -> Self {
        match err {
            AggregationError::DatasetNotFound(msg) => MeshError::DatasetNotFound(msg),
            AggregationError::VariableNotFound(msg) => MeshError::VariableNotFound(msg),
            AggregationError::AxisMismatch(msg) => MeshError::AxisMismatch(msg),
            AggregationError::AxisOutOfRange(msg) => MeshError::AxisOutOfRange(msg),
            AggregationError::ReadFailed(msg) => MeshError::DataReadError(msg),
            AggregationError::InvalidDatasetId(msg) => MeshError::InvalidDatasetId(msg),
            AggregationError::InvalidRequest(msg) => MeshError::InvalidParameter {
                param: "request".to_string(),
                message: msg,
            },
            AggregationError::Lookup(e) => MeshError::LookupUnavailable(e.to_string()),
        }
    }
}

/// Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregationError>;
