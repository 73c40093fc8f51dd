//! Spatial aggregation over ICON unstructured triangular meshes.
//!
//! The engine reads `(time, height, cell)` fields from NetCDF datasets and
//! reduces them into:
//!
//! - latitude profiles: 360 bins built from a per-domain cell-to-bin lookup
//! - height profiles: one latitude profile per vertical level
//! - per-triangle aggregates: one vertical sum or mean per cell, whole or
//!   streamed in bounded batches
//! - mesh geometry: triangle vertex coordinates in degrees
//!
//! All operations are synchronous. Lookup tables are built once at startup
//! and shared read-only; dataset handles live for one request.
//!
//! # Example
//!
//! ```rust,ignore
//! use mesh_aggregator::{LookupTables, DirectoryMembership, LookupPolicy, MeshDataService};
//!
//! let registry = DomainRegistry::default();
//! let membership = DirectoryMembership::new("/data/membership");
//! let lookups = LookupTables::build(&registry, &membership, LookupPolicy::Degrade)?;
//! let service = MeshDataService::new(
//!     Arc::new(registry),
//!     lookups,
//!     Arc::new(NetCdfSource::new("/data/icon")),
//!     EngineConfig::default(),
//! )?;
//! ```

pub mod config;
pub mod error;
pub mod latitude;
pub mod lookup;
pub mod mesh;
pub mod query;
pub mod service;
pub mod slice;
pub mod stream;
pub mod triangles;

pub use config::{EngineConfig, MeshVariables, DEFAULT_BATCH_SIZE};
pub use error::{AggregationError, Result};
pub use latitude::{aggregate_latitudes, height_profile, latitude_profile};
pub use lookup::{
    DirectoryMembership, LatitudeLookup, LookupError, LookupPolicy, LookupStatus, LookupTables,
    MembershipSource, StaticMembership,
};
pub use mesh::{reconstruct_mesh, MeshGeometry};
pub use query::{
    HeightProfileRequest, LatProfileRequest, MeshRequest, TrisAggRequest, TrisRequest,
};
pub use service::{HeightProfile, MeshDataService};
pub use slice::{AxisWindow, BoundaryVariable, BoundaryWindow, FieldVariable};
pub use stream::{stream_triangle_aggregates, StreamSummary, TriangleBatch, TriangleBatcher};
pub use triangles::{aggregate_triangles, raw_triangles};
