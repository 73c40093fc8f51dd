//! Error types shared by the mesh slicing crates and services.

use thiserror::Error;

/// Result type alias using MeshError.
pub type MeshResult<T> = Result<T, MeshError>;

/// Client-facing error kinds.
///
/// Library crates keep their own error enums and convert into this type at
/// the service boundary.
#[derive(Debug, Error)]
pub enum MeshError {
    // === Request Errors ===
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid dataset identifier: {0}")]
    InvalidDatasetId(String),

    #[error("Axis index out of range: {0}")]
    AxisOutOfRange(String),

    // === Data Errors ===
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Variable not found: {0}")]
    VariableNotFound(String),

    #[error("Axis mismatch: {0}")]
    AxisMismatch(String),

    #[error("Failed to read data: {0}")]
    DataReadError(String),

    // === Infrastructure Errors ===
    #[error("Latitude lookup unavailable: {0}")]
    LookupUnavailable(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl MeshError {
    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            MeshError::UnknownDomain(_)
            | MeshError::InvalidParameter { .. }
            | MeshError::InvalidDatasetId(_)
            | MeshError::AxisOutOfRange(_) => 400,

            MeshError::DatasetNotFound(_) | MeshError::VariableNotFound(_) => 404,

            MeshError::AxisMismatch(_) => 422,

            MeshError::LookupUnavailable(_) => 503,

            MeshError::DataReadError(_) | MeshError::InternalError(_) => 500,
        }
    }

    /// Short machine-readable kind, used in exception bodies and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            MeshError::UnknownDomain(_) => "unknown-domain",
            MeshError::InvalidParameter { .. } => "invalid-parameter",
            MeshError::InvalidDatasetId(_) => "invalid-dataset-id",
            MeshError::AxisOutOfRange(_) => "axis-out-of-range",
            MeshError::DatasetNotFound(_) => "dataset-not-found",
            MeshError::VariableNotFound(_) => "variable-not-found",
            MeshError::AxisMismatch(_) => "axis-mismatch",
            MeshError::DataReadError(_) => "data-read-error",
            MeshError::LookupUnavailable(_) => "lookup-unavailable",
            MeshError::InternalError(_) => "internal-error",
        }
    }
}
