//! Common types and utilities shared across the mesh slicing crates.

pub mod dataset_id;
pub mod domain;
pub mod error;
pub mod reduction;

pub use dataset_id::validate_dataset_id;
pub use domain::{Domain, DomainRegistry, DomainSpec, LAT_BIN_COUNT};
pub use error::{MeshError, MeshResult};
pub use reduction::{Reduction, Traversal};
