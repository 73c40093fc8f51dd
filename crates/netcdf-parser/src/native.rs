//! Native NetCDF access using the netcdf library.
//!
//! Datasets are opened straight from the configured data directory; the
//! netcdf library (which wraps libnetcdf/HDF5) needs a real file path.

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Once;

use mesh_common::validate_dataset_id;
use tracing::debug;

use crate::dataset::{check_window, Dataset, DatasetSource};
use crate::error::{NetCdfError, NetCdfResult};

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints verbose error messages to stderr even when errors
/// are handled gracefully by the Rust code (e.g., when probing for a variable
/// that doesn't exist). This creates confusing log spam like:
///
/// ```text
/// HDF5-DIAG: Error detected in HDF5 (1.10.8) thread 3:
///   #003: ../../../src/H5Adense.c line 397 in H5A__dense_open(): can't locate attribute in name index
/// ```
///
/// Call early in startup, before any HDF5/NetCDF operations occur. Safe to
/// call multiple times.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and we're passing null pointers
        // to disable error output, which is a documented valid use.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// Opens NetCDF files relative to a data directory.
#[derive(Debug, Clone)]
pub struct NetCdfSource {
    data_dir: PathBuf,
}

impl NetCdfSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        silence_hdf5_errors();
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Resolve a dataset identifier to a path inside the data directory.
    pub fn resolve(&self, id: &str) -> NetCdfResult<PathBuf> {
        validate_dataset_id(id).map_err(|e| NetCdfError::InvalidDatasetId(e.to_string()))?;
        Ok(self.data_dir.join(id))
    }
}

impl DatasetSource for NetCdfSource {
    fn open(&self, id: &str) -> NetCdfResult<Box<dyn Dataset>> {
        let path = self.resolve(id)?;
        if !path.is_file() {
            return Err(NetCdfError::DatasetNotFound(id.to_string()));
        }

        let file = netcdf::open(&path).map_err(|e| {
            NetCdfError::DatasetNotFound(format!("{}: unable to read nc file: {}", id, e))
        })?;

        debug!(dataset = %id, path = %path.display(), "Opened NetCDF dataset");

        Ok(Box::new(NetCdfDataset {
            id: id.to_string(),
            file,
        }))
    }
}

/// A NetCDF file opened for one request.
pub struct NetCdfDataset {
    id: String,
    file: netcdf::File,
}

impl NetCdfDataset {
    fn variable(&self, name: &str) -> NetCdfResult<netcdf::Variable<'_>> {
        self.file
            .variable(name)
            .ok_or_else(|| NetCdfError::VariableNotFound {
                dataset: self.id.clone(),
                variable: name.to_string(),
            })
    }

    fn windowed_ranges(
        &self,
        name: &str,
        start: &[usize],
        count: &[usize],
    ) -> NetCdfResult<Vec<Range<usize>>> {
        let shape = self.variable_shape(name)?;
        check_window(name, &shape, start, count)?;
        Ok(start.iter().zip(count).map(|(&s, &c)| s..s + c).collect())
    }
}

/// Read a hyperslab with per-rank extents.
macro_rules! read_hyperslab {
    ($var:expr, $ty:ty, $ranges:expr, $name:expr) => {{
        let r = $ranges;
        let result = match r.len() {
            2 => $var.get_values::<$ty, _>((r[0].clone(), r[1].clone())),
            3 => $var.get_values::<$ty, _>((r[0].clone(), r[1].clone(), r[2].clone())),
            4 => $var.get_values::<$ty, _>((
                r[0].clone(),
                r[1].clone(),
                r[2].clone(),
                r[3].clone(),
            )),
            rank => {
                return Err(NetCdfError::ReadFailed(format!(
                    "{}: unsupported variable rank {}",
                    $name, rank
                )))
            }
        };
        result.map_err(|e| NetCdfError::ReadFailed(format!("{}: {}", $name, e)))
    }};
}

impl Dataset for NetCdfDataset {
    fn id(&self) -> &str {
        &self.id
    }

    fn variable_shape(&self, variable: &str) -> NetCdfResult<Vec<usize>> {
        let var = self.variable(variable)?;
        Ok(var.dimensions().iter().map(|d| d.len()).collect())
    }

    fn read_f32(
        &self,
        variable: &str,
        start: &[usize],
        count: &[usize],
    ) -> NetCdfResult<Vec<f32>> {
        let ranges = self.windowed_ranges(variable, start, count)?;
        let var = self.variable(variable)?;
        read_hyperslab!(var, f32, &ranges, variable)
    }

    fn read_f64(
        &self,
        variable: &str,
        start: &[usize],
        count: &[usize],
    ) -> NetCdfResult<Vec<f64>> {
        let ranges = self.windowed_ranges(variable, start, count)?;
        let var = self.variable(variable)?;
        read_hyperslab!(var, f64, &ranges, variable)
    }
}
