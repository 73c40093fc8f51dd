//! In-memory datasets implementing the dataset access traits.
//!
//! Values are stored row-major as `f64` and converted on read, mirroring how
//! the netcdf library converts on `get_values`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use mesh_common::validate_dataset_id;
use netcdf_parser::{check_window, Dataset, DatasetSource, NetCdfError, NetCdfResult};

#[derive(Debug, Clone)]
struct MemoryVariable {
    shape: Vec<usize>,
    data: Vec<f64>,
}

/// A dataset held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryDataset {
    id: String,
    variables: HashMap<String, MemoryVariable>,
    reads: Arc<AtomicUsize>,
    fail_after: Option<usize>,
    open_handles: Option<Arc<AtomicUsize>>,
}

impl Clone for MemoryDataset {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            variables: self.variables.clone(),
            reads: Arc::clone(&self.reads),
            fail_after: self.fail_after,
            open_handles: None,
        }
    }
}

impl Drop for MemoryDataset {
    fn drop(&mut self) {
        if let Some(handles) = &self.open_handles {
            handles.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl MemoryDataset {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            variables: HashMap::new(),
            reads: Arc::new(AtomicUsize::new(0)),
            fail_after: None,
            open_handles: None,
        }
    }

    /// Add a variable with an explicit shape and row-major data.
    pub fn with_variable(mut self, name: &str, shape: Vec<usize>, data: Vec<f64>) -> Self {
        let expected: usize = shape.iter().product();
        assert_eq!(
            data.len(),
            expected,
            "variable {} has {} values for shape {:?}",
            name,
            data.len(),
            shape
        );
        self.variables
            .insert(name.to_string(), MemoryVariable { shape, data });
        self
    }

    /// Add a `(time, height, cell)` field from `steps[time][level][cell]`.
    pub fn with_time_field(self, name: &str, steps: &[Vec<Vec<f32>>]) -> Self {
        let ntime = steps.len();
        let nheight = steps.first().map(|s| s.len()).unwrap_or(0);
        let ncells = steps
            .first()
            .and_then(|s| s.first())
            .map(|l| l.len())
            .unwrap_or(0);

        let data: Vec<f64> = steps
            .iter()
            .flat_map(|levels| levels.iter().flat_map(|cells| cells.iter().map(|&v| v as f64)))
            .collect();

        self.with_variable(name, vec![ntime, nheight, ncells], data)
    }

    /// Add a single-time-step `(1, height, cell)` field from `levels[level][cell]`.
    pub fn with_field(self, name: &str, levels: &[Vec<f32>]) -> Self {
        self.with_time_field(name, &[levels.to_vec()])
    }

    /// Add `(cell, vertex)` boundary variables from per-cell vertex triples.
    pub fn with_boundaries(
        self,
        lon_name: &str,
        lat_name: &str,
        lons: &[[f64; 3]],
        lats: &[[f64; 3]],
    ) -> Self {
        let ncells = lons.len();
        let flat_lon: Vec<f64> = lons.iter().flat_map(|v| v.iter().copied()).collect();
        let flat_lat: Vec<f64> = lats.iter().flat_map(|v| v.iter().copied()).collect();
        self.with_variable(lon_name, vec![ncells, 3], flat_lon)
            .with_variable(lat_name, vec![lats.len(), 3], flat_lat)
    }

    /// Make every read after the first `reads` fail.
    pub fn failing_after(mut self, reads: usize) -> Self {
        self.fail_after = Some(reads);
        self
    }

    /// Number of hyperslab reads served so far (shared across clones).
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Shared read counter, useful once the dataset has moved into a source.
    pub fn read_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.reads)
    }

    fn read(&self, name: &str, start: &[usize], count: &[usize]) -> NetCdfResult<Vec<f64>> {
        let var = self
            .variables
            .get(name)
            .ok_or_else(|| NetCdfError::VariableNotFound {
                dataset: self.id.clone(),
                variable: name.to_string(),
            })?;
        let len = check_window(name, &var.shape, start, count)?;

        let served = self.reads.fetch_add(1, Ordering::SeqCst);
        if let Some(limit) = self.fail_after {
            if served >= limit {
                return Err(NetCdfError::ReadFailed(format!(
                    "{}: injected failure after {} reads",
                    name, limit
                )));
            }
        }

        let rank = var.shape.len();
        let mut strides = vec![1usize; rank];
        for axis in (0..rank.saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * var.shape[axis + 1];
        }

        let mut out = Vec::with_capacity(len);
        if len == 0 {
            return Ok(out);
        }

        let mut index = vec![0usize; rank];
        loop {
            let offset: usize = (0..rank).map(|a| (start[a] + index[a]) * strides[a]).sum();
            out.push(var.data[offset]);

            let mut axis = rank;
            loop {
                if axis == 0 {
                    return Ok(out);
                }
                axis -= 1;
                index[axis] += 1;
                if index[axis] < count[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
    }
}

impl Dataset for MemoryDataset {
    fn id(&self) -> &str {
        &self.id
    }

    fn variable_shape(&self, variable: &str) -> NetCdfResult<Vec<usize>> {
        self.variables
            .get(variable)
            .map(|v| v.shape.clone())
            .ok_or_else(|| NetCdfError::VariableNotFound {
                dataset: self.id.clone(),
                variable: variable.to_string(),
            })
    }

    fn read_f32(
        &self,
        variable: &str,
        start: &[usize],
        count: &[usize],
    ) -> NetCdfResult<Vec<f32>> {
        Ok(self
            .read(variable, start, count)?
            .into_iter()
            .map(|v| v as f32)
            .collect())
    }

    fn read_f64(
        &self,
        variable: &str,
        start: &[usize],
        count: &[usize],
    ) -> NetCdfResult<Vec<f64>> {
        self.read(variable, start, count)
    }
}

/// A dataset source serving in-memory datasets by identifier.
#[derive(Debug, Default)]
pub struct MemorySource {
    datasets: HashMap<String, MemoryDataset>,
    open_handles: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, dataset: MemoryDataset) -> Self {
        self.insert(dataset);
        self
    }

    pub fn insert(&mut self, dataset: MemoryDataset) {
        self.datasets.insert(dataset.id.clone(), dataset);
    }

    /// Number of datasets currently opened and not yet dropped.
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    /// Shared handle counter, useful once the source has moved into an `Arc<dyn _>`.
    pub fn handle_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.open_handles)
    }
}

impl DatasetSource for MemorySource {
    fn open(&self, id: &str) -> NetCdfResult<Box<dyn Dataset>> {
        validate_dataset_id(id).map_err(|e| NetCdfError::InvalidDatasetId(e.to_string()))?;
        let dataset = self
            .datasets
            .get(id)
            .ok_or_else(|| NetCdfError::DatasetNotFound(id.to_string()))?;

        let mut handle = dataset.clone();
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        handle.open_handles = Some(Arc::clone(&self.open_handles));
        Ok(Box::new(handle))
    }
}
