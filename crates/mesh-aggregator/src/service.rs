//! High-level mesh data service.
//!
//! `MeshDataService` is the single entry point for transports. It owns the
//! domain registry, the shared latitude lookup tables and the dataset source,
//! and runs one synchronous operation per call. Every call opens its dataset,
//! works on it and drops the handle before returning, on success and failure
//! alike.
//!
//! # Example
//!
//! ```rust,ignore
//! let service = MeshDataService::new(registry, lookups, source, EngineConfig::default())?;
//!
//! let request = LatProfileRequest::new("icon_2024.nc", "temp", Domain::Dom01)
//!     .at_height(10)
//!     .with_reduction(Reduction::Mean);
//! let bins = service.lat_profile(&request)?;
//! assert_eq!(bins.len(), 360);
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Instant;

use mesh_common::{Domain, DomainRegistry, DomainSpec, Traversal};
use netcdf_parser::{Dataset, DatasetSource};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{AggregationError, Result};
use crate::latitude::{height_profile, latitude_profile};
use crate::lookup::{LatitudeLookup, LookupTables};
use crate::mesh::{reconstruct_mesh, MeshGeometry};
use crate::query::{
    HeightProfileRequest, LatProfileRequest, MeshRequest, TrisAggRequest, TrisRequest,
};
use crate::slice::FieldVariable;
use crate::stream::{stream_triangle_aggregates, StreamSummary, TriangleBatch};
use crate::triangles::{aggregate_triangles, raw_triangles};

/// Latitude profiles of every height level, ascending.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeightProfile {
    pub levels: Vec<Vec<f64>>,
}

/// Engine facade shared by all request handlers.
pub struct MeshDataService {
    registry: Arc<DomainRegistry>,
    lookups: LookupTables,
    source: Arc<dyn DatasetSource>,
    config: EngineConfig,
}

impl MeshDataService {
    /// Create a service; fails if `config` is invalid.
    pub fn new(
        registry: Arc<DomainRegistry>,
        lookups: LookupTables,
        source: Arc<dyn DatasetSource>,
        config: EngineConfig,
    ) -> Result<Self> {
        config.validate().map_err(AggregationError::InvalidRequest)?;
        Ok(Self {
            registry,
            lookups,
            source,
            config,
        })
    }

    pub fn registry(&self) -> &DomainRegistry {
        &self.registry
    }

    pub fn lookups(&self) -> &LookupTables {
        &self.lookups
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// GetHeightProfile: one 360-bin profile per height level.
    pub fn height_profile(&self, req: &HeightProfileRequest) -> Result<HeightProfile> {
        self.observe("height_profile", &req.dataset, || {
            let dataset = self.open(&req.dataset)?;
            let spec = self.spec(req.domain);
            let field = FieldVariable::resolve(dataset.as_ref(), &req.variable, spec)?;
            let lookup = self.lookup(req.domain);
            let levels = height_profile(&field, lookup, req.time, req.reduction)?;
            Ok(HeightProfile { levels })
        })
    }

    /// GetAggValuesPerLon: one 360-bin profile at a single level.
    pub fn lat_profile(&self, req: &LatProfileRequest) -> Result<Vec<f64>> {
        self.observe("lat_profile", &req.dataset, || {
            let dataset = self.open(&req.dataset)?;
            let spec = self.spec(req.domain);
            let field = FieldVariable::resolve(dataset.as_ref(), &req.variable, spec)?;
            let lookup = self.lookup(req.domain);
            latitude_profile(&field, lookup, req.time, req.height, req.reduction)
        })
    }

    /// GetMesh: block-ordered triangle vertices in degrees.
    pub fn mesh(&self, req: &MeshRequest) -> Result<MeshGeometry> {
        self.observe("mesh", &req.dataset, || {
            let dataset = self.open(&req.dataset)?;
            let spec = self.spec(req.domain);
            reconstruct_mesh(dataset.as_ref(), spec, &self.config.mesh_variables)
        })
    }

    /// GetTris: raw values of one level.
    pub fn tris(&self, req: &TrisRequest) -> Result<Vec<f32>> {
        self.observe("tris", &req.dataset, || {
            let dataset = self.open(&req.dataset)?;
            let spec = self.spec(req.domain);
            let field = FieldVariable::resolve(dataset.as_ref(), &req.variable, spec)?;
            raw_triangles(&field, req.time, req.height)
        })
    }

    /// GetTrisAgg: one vertical reduction per cell.
    pub fn tris_agg(&self, req: &TrisAggRequest) -> Result<Vec<f64>> {
        self.observe("tris_agg", &req.dataset, || {
            let dataset = self.open(&req.dataset)?;
            let spec = self.spec(req.domain);
            let field = FieldVariable::resolve(dataset.as_ref(), &req.variable, spec)?;
            aggregate_triangles(
                &field,
                req.time,
                0..field.cell_count(),
                req.reduction,
                self.traversal(req),
            )
        })
    }

    /// GetTrisAggStream: the values of [`Self::tris_agg`] delivered to `sink`
    /// in ascending batches of at most the configured batch size.
    pub fn tris_agg_stream<F>(&self, req: &TrisAggRequest, sink: F) -> Result<StreamSummary>
    where
        F: FnMut(TriangleBatch) -> ControlFlow<()>,
    {
        let result = self.observe("tris_agg_stream", &req.dataset, || {
            let dataset = self.open(&req.dataset)?;
            let spec = self.spec(req.domain);
            let field = FieldVariable::resolve(dataset.as_ref(), &req.variable, spec)?;
            stream_triangle_aggregates(
                &field,
                req.time,
                req.reduction,
                self.traversal(req),
                self.config.stream_batch_size,
                sink,
            )
        });

        if let Ok(summary) = &result {
            debug!(
                dataset = %req.dataset,
                batches = summary.batches,
                cells = summary.cells,
                cancelled = summary.cancelled,
                "Triangle stream finished"
            );
        }
        result
    }

    fn open(&self, dataset: &str) -> Result<Box<dyn Dataset>> {
        Ok(self.source.open(dataset)?)
    }

    fn spec(&self, domain: Domain) -> &DomainSpec {
        self.registry.get(domain)
    }

    fn lookup(&self, domain: Domain) -> &LatitudeLookup {
        let lookup = self.lookups.get(domain);
        if lookup.is_degraded() {
            warn!(domain = %domain, "Aggregating with a degraded latitude lookup");
        }
        lookup
    }

    fn traversal(&self, req: &TrisAggRequest) -> Traversal {
        req.traversal.unwrap_or(self.config.traversal)
    }

    fn observe<T>(
        &self,
        operation: &str,
        dataset: &str,
        run: impl FnOnce() -> Result<T>,
    ) -> Result<T> {
        let started = Instant::now();
        let result = run();
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        match &result {
            Ok(_) => info!(operation, dataset, elapsed_ms, "Request completed"),
            Err(e) => warn!(operation, dataset, elapsed_ms, error = %e, "Request failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{LookupPolicy, StaticMembership};
    use mesh_common::Reduction;
    use test_utils::fixtures::two_bin;
    use test_utils::{create_boundary_vertices, create_field, MemoryDataset, MemorySource};

    fn service_with(source: MemorySource, registry: DomainRegistry) -> MeshDataService {
        let membership = StaticMembership::new()
            .with_domain(Domain::Dom01, test_utils::banded_membership(8, 360));
        let lookups =
            LookupTables::build(&registry, &membership, LookupPolicy::Degrade).unwrap();
        MeshDataService::new(
            Arc::new(registry),
            lookups,
            Arc::new(source),
            EngineConfig {
                stream_batch_size: 3,
                ..EngineConfig::default()
            },
        )
        .unwrap()
    }

    fn small_service() -> (MeshDataService, Arc<std::sync::atomic::AtomicUsize>) {
        let (lons, lats) = create_boundary_vertices(8);
        let source = MemorySource::new().with_dataset(
            MemoryDataset::new("icon.nc")
                .with_field("temp", &create_field(3, 8))
                .with_boundaries("clon_bnds", "clat_bnds", &lons, &lats),
        );
        let handles = source.handle_counter();
        (service_with(source, DomainRegistry::new(8, 16)), handles)
    }

    #[test]
    fn test_all_operations_release_handles() {
        let (service, handles) = small_service();

        let profile = service
            .height_profile(&HeightProfileRequest::new("icon.nc", "temp", Domain::Dom01))
            .unwrap();
        assert_eq!(profile.levels.len(), 3);

        let bins = service
            .lat_profile(&LatProfileRequest::new("icon.nc", "temp", Domain::Dom01).at_height(2))
            .unwrap();
        assert_eq!(bins.len(), 360);
        assert_eq!(bins, profile.levels[2]);

        let mesh = service.mesh(&MeshRequest::new("icon.nc", Domain::Dom01)).unwrap();
        assert_eq!(mesh.len(), 24);

        let raw = service
            .tris(&TrisRequest::new("icon.nc", "temp", Domain::Dom01).at_height(1))
            .unwrap();
        assert_eq!(raw[7], 1007.0);

        let agg = service
            .tris_agg(&TrisAggRequest::new("icon.nc", "temp", Domain::Dom01))
            .unwrap();
        assert_eq!(agg[0], 3000.0);

        assert_eq!(handles.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_errors_release_handles() {
        let (service, handles) = small_service();

        let err = service
            .tris_agg(&TrisAggRequest::new("icon.nc", "salt", Domain::Dom01))
            .err()
            .unwrap();
        assert!(matches!(err, AggregationError::VariableNotFound(_)));

        let err = service
            .tris(&TrisRequest::new("icon.nc", "temp", Domain::Dom02))
            .err()
            .unwrap();
        assert!(matches!(err, AggregationError::AxisMismatch(_)));

        let err = service
            .mesh(&MeshRequest::new("other.nc", Domain::Dom01))
            .err()
            .unwrap();
        assert!(matches!(err, AggregationError::DatasetNotFound(_)));

        assert_eq!(handles.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stream_matches_tris_agg() {
        let (service, handles) = small_service();
        let req = TrisAggRequest::new("icon.nc", "temp", Domain::Dom01)
            .with_reduction(Reduction::Mean)
            .with_traversal(Traversal::PerCell);

        let whole = service.tris_agg(&req).unwrap();
        let mut streamed = Vec::new();
        let summary = service
            .tris_agg_stream(&req, |batch| {
                assert!(batch.len() <= 3);
                streamed.extend(batch.values);
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(summary.batches, 3);
        assert_eq!(streamed, whole);
        assert_eq!(handles.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_degraded_lookup_is_reported() {
        let (service, _) = small_service();
        assert!(!service.lookups().get(Domain::Dom01).is_degraded());
        assert!(service.lookups().get(Domain::Dom02).is_degraded());
    }

    #[test]
    fn test_two_bin_example_through_service() {
        let registry = DomainRegistry::new(two_bin::CELL_COUNT, 16);
        let spec = DomainSpec {
            lat_bin_count: two_bin::BIN_COUNT,
            ..*registry.get(Domain::Dom01)
        };
        let lookups = LookupTables::new(
            LatitudeLookup::from_membership(&spec, two_bin::membership()).unwrap(),
            LatitudeLookup::unassigned(registry.get(Domain::Dom02)),
        );
        let source = MemorySource::new().with_dataset(
            MemoryDataset::new("icon.nc").with_field("temp", &[two_bin::VALUES.to_vec()]),
        );
        let service = MeshDataService::new(
            Arc::new(registry),
            lookups,
            Arc::new(source),
            EngineConfig::default(),
        )
        .unwrap();

        let req = LatProfileRequest::new("icon.nc", "temp", Domain::Dom01)
            .with_reduction(Reduction::Mean);
        assert_eq!(service.lat_profile(&req).unwrap(), two_bin::MEAN_BINS.to_vec());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let registry = DomainRegistry::new(8, 16);
        let lookups = LookupTables::new(
            LatitudeLookup::unassigned(registry.get(Domain::Dom01)),
            LatitudeLookup::unassigned(registry.get(Domain::Dom02)),
        );
        let result = MeshDataService::new(
            Arc::new(registry),
            lookups,
            Arc::new(MemorySource::new()),
            EngineConfig {
                stream_batch_size: 0,
                ..EngineConfig::default()
            },
        );
        assert!(matches!(result, Err(AggregationError::InvalidRequest(_))));
    }
}
