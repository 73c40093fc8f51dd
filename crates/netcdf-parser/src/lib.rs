//! NetCDF dataset access for ICON model output.
//!
//! This crate provides the dataset capability consumed by the aggregation
//! engine: open a dataset by identifier, resolve a variable, report its axis
//! lengths and read hyperslabs as flat buffers.
//!
//! # ICON Data Structure
//!
//! ICON output on the native triangular grid stores 3-D fields with the fixed
//! axis order `(time, height, ncells)`. Cell geometry is stored as boundary
//! vertex coordinates in radians, `clon_bnds`/`clat_bnds`, with axis order
//! `(ncells, vertices)`.

pub mod dataset;
pub mod error;
pub mod native;

pub use dataset::{check_window, Dataset, DatasetSource};
pub use error::{NetCdfError, NetCdfResult};
pub use native::{silence_hdf5_errors, NetCdfDataset, NetCdfSource};
