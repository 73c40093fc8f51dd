//! Configuration for the aggregation engine.

use mesh_common::Traversal;
use serde::{Deserialize, Serialize};

/// Default number of cells per streamed batch.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Configuration for the aggregation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of cell aggregates per streamed batch.
    pub stream_batch_size: usize,

    /// Access pattern for per-triangle vertical reductions.
    pub traversal: Traversal,

    /// Boundary-vertex variables used for mesh reconstruction.
    pub mesh_variables: MeshVariables,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stream_batch_size: DEFAULT_BATCH_SIZE,
            traversal: Traversal::PerLevel,
            mesh_variables: MeshVariables::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MESH_STREAM_BATCH_SIZE") {
            if let Ok(size) = val.parse() {
                config.stream_batch_size = size;
            }
        }

        if let Ok(val) = std::env::var("MESH_TRAVERSAL") {
            if let Ok(traversal) = val.parse() {
                config.traversal = traversal;
            }
        }

        if let Ok(val) = std::env::var("MESH_CLON_VARIABLE") {
            config.mesh_variables.lon = val;
        }

        if let Ok(val) = std::env::var("MESH_CLAT_VARIABLE") {
            config.mesh_variables.lat = val;
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.stream_batch_size == 0 {
            return Err("stream_batch_size must be > 0".to_string());
        }

        if self.mesh_variables.lon.is_empty() || self.mesh_variables.lat.is_empty() {
            return Err("mesh variable names must not be empty".to_string());
        }

        Ok(())
    }
}

/// Names of the `(cell, vertex)` boundary variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshVariables {
    pub lon: String,
    pub lat: String,
}

impl Default for MeshVariables {
    fn default() -> Self {
        Self {
            lon: "clon_bnds".to_string(),
            lat: "clat_bnds".to_string(),
        }
    }
}
