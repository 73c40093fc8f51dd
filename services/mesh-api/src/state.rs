//! Application state for the mesh API.

use std::sync::Arc;

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, warn};

use mesh_aggregator::{DirectoryMembership, EngineConfig, LookupTables, MeshDataService};
use netcdf_parser::NetCdfSource;

use crate::config::{ServerSettings, ServiceConfig};

/// Shared application state.
pub struct AppState {
    /// Engine facade; all operations run through it.
    pub service: MeshDataService,

    /// Prometheus handle, absent when no recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    /// Build the state from startup settings.
    ///
    /// Latitude lookups are built here, once, before any request is served.
    pub fn new(settings: &ServerSettings) -> Result<Self> {
        let mut config = match &settings.config_path {
            Some(path) => ServiceConfig::load(path)?,
            None => ServiceConfig {
                engine: EngineConfig::from_env(),
                ..ServiceConfig::default()
            },
        };
        if let Some(size) = settings.batch_size {
            config.engine.stream_batch_size = size;
        }

        let registry = config.registry();
        let membership = DirectoryMembership::new(&settings.membership_dir);
        let lookups = LookupTables::build(&registry, &membership, settings.lookup_policy())
            .with_context(|| {
                format!(
                    "Failed to build latitude lookups from {:?}",
                    settings.membership_dir
                )
            })?;

        if lookups.any_degraded() {
            warn!("Serving with degraded latitude lookups; latitude profiles may be incorrect");
        }

        let source = NetCdfSource::new(&settings.data_dir);
        info!(
            data_dir = %settings.data_dir.display(),
            batch_size = config.engine.stream_batch_size,
            traversal = ?config.engine.traversal,
            "Dataset source ready"
        );

        let service = MeshDataService::new(Arc::new(registry), lookups, Arc::new(source), config.engine)
            .context("Invalid engine configuration")?;

        Ok(Self::with_service(service))
    }

    pub fn with_service(service: MeshDataService) -> Self {
        Self {
            service,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
