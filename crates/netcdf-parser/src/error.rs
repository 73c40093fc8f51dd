//! Error types for NetCDF dataset access.

use mesh_common::MeshError;
use thiserror::Error;

/// Result type for NetCDF dataset operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF dataset access.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Dataset file missing or unreadable
    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    /// Variable absent from an opened dataset
    #[error("Variable '{variable}' not found in {dataset}")]
    VariableNotFound { dataset: String, variable: String },

    /// Dataset identifier rejected before touching the filesystem
    #[error("Invalid dataset identifier: {0}")]
    InvalidDatasetId(String),

    /// Requested hyperslab exceeds the variable's shape
    #[error("Slice out of bounds: {0}")]
    OutOfBounds(String),

    /// The netcdf library failed while reading values
    #[error("Read failed: {0}")]
    ReadFailed(String),
}

impl From<NetCdfError> for MeshError {
    fn from(err: NetCdfError) -> Self {
        match err {
            NetCdfError::DatasetNotFound(msg) => MeshError::DatasetNotFound(msg),
            NetCdfError::VariableNotFound { dataset, variable } => {
                MeshError::VariableNotFound(format!("{} in {}", variable, dataset))
            }
            NetCdfError::InvalidDatasetId(msg) => MeshError::InvalidDatasetId(msg),
            NetCdfError::OutOfBounds(msg) => MeshError::AxisOutOfRange(msg),
            NetCdfError::ReadFailed(msg) => MeshError::DataReadError(msg),
            NetCdfError::IoError(e) => MeshError::DataReadError(e.to_string()),
        }
    }
}
