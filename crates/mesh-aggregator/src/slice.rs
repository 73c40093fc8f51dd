//! Axis-window reads over ICON variables.
//!
//! Field variables have the fixed axis order `(time, height, cell)`;
//! boundary-vertex variables have `(cell, vertex)`. The order is a contract
//! with the data format and is checked, never negotiated.

use std::ops::Range;

use mesh_common::DomainSpec;
use netcdf_parser::Dataset;

use crate::error::{AggregationError, Result};

pub const TIME_AXIS: usize = 0;
pub const HEIGHT_AXIS: usize = 1;
pub const CELL_AXIS: usize = 2;

/// Number of boundary vertices per triangular cell.
pub const VERTICES_PER_CELL: usize = 3;

/// Address of a run of cells at one `(time, height)` position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisWindow {
    pub time: usize,
    pub height: usize,
    pub cells: Range<usize>,
}

impl AxisWindow {
    pub fn new(time: usize, height: usize, cells: Range<usize>) -> Self {
        Self {
            time,
            height,
            cells,
        }
    }

    fn start(&self) -> [usize; 3] {
        [self.time, self.height, self.cells.start]
    }

    fn count(&self) -> [usize; 3] {
        [1, 1, self.cells.len()]
    }
}

/// Address of one vertex offset over a run of cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryWindow {
    pub cells: Range<usize>,
    pub vertex: usize,
}

/// A resolved `(time, height, cell)` variable of one dataset.
pub struct FieldVariable<'a> {
    dataset: &'a dyn Dataset,
    name: String,
    time_count: usize,
    height_count: usize,
    cell_count: usize,
}

impl<'a> FieldVariable<'a> {
    /// Resolve `name` and check its axes against `spec`.
    pub fn resolve(dataset: &'a dyn Dataset, name: &str, spec: &DomainSpec) -> Result<Self> {
        let shape = dataset.variable_shape(name)?;
        if shape.len() != 3 {
            return Err(AggregationError::axis_mismatch(format!(
                "{} has {} axes, expected (time, height, cell)",
                name,
                shape.len()
            )));
        }
        if shape[CELL_AXIS] != spec.cell_count {
            return Err(AggregationError::axis_mismatch(format!(
                "{} cell axis has {} cells, {} expects {}",
                name, shape[CELL_AXIS], spec.domain, spec.cell_count
            )));
        }

        Ok(Self {
            dataset,
            name: name.to_string(),
            time_count: shape[TIME_AXIS],
            height_count: shape[HEIGHT_AXIS],
            cell_count: shape[CELL_AXIS],
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn time_count(&self) -> usize {
        self.time_count
    }

    /// Number of vertical levels.
    pub fn height_count(&self) -> usize {
        self.height_count
    }

    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    pub fn check_time(&self, time: usize) -> Result<()> {
        if time >= self.time_count {
            return Err(AggregationError::out_of_range(format!(
                "{}: time {} >= {}",
                self.name, time, self.time_count
            )));
        }
        Ok(())
    }

    pub fn check_height(&self, height: usize) -> Result<()> {
        if height >= self.height_count {
            return Err(AggregationError::out_of_range(format!(
                "{}: height {} >= {}",
                self.name, height, self.height_count
            )));
        }
        Ok(())
    }

    fn check_cells(&self, cells: &Range<usize>) -> Result<()> {
        if cells.start > cells.end || cells.end > self.cell_count {
            return Err(AggregationError::out_of_range(format!(
                "{}: cells {}..{} outside 0..{}",
                self.name, cells.start, cells.end, self.cell_count
            )));
        }
        Ok(())
    }

    /// Read one value per cell of `window.cells`.
    pub fn read_window(&self, window: &AxisWindow) -> Result<Vec<f32>> {
        self.check_time(window.time)?;
        self.check_height(window.height)?;
        self.check_cells(&window.cells)?;

        let values = self
            .dataset
            .read_f32(&self.name, &window.start(), &window.count())?;
        expect_len(&self.name, values, window.cells.len())
    }

    /// Read every cell at one level.
    pub fn read_level(&self, time: usize, height: usize) -> Result<Vec<f32>> {
        self.read_window(&AxisWindow::new(time, height, 0..self.cell_count))
    }

    /// Read the full vertical profile of one cell, one value per level.
    pub fn read_column(&self, time: usize, cell: usize) -> Result<Vec<f32>> {
        self.check_time(time)?;
        self.check_cells(&(cell..cell + 1))?;

        let values = self.dataset.read_f32(
            &self.name,
            &[time, 0, cell],
            &[1, self.height_count, 1],
        )?;
        expect_len(&self.name, values, self.height_count)
    }
}

/// A resolved `(cell, vertex)` boundary variable of one dataset.
pub struct BoundaryVariable<'a> {
    dataset: &'a dyn Dataset,
    name: String,
    cell_count: usize,
}

impl<'a> BoundaryVariable<'a> {
    pub fn resolve(dataset: &'a dyn Dataset, name: &str, spec: &DomainSpec) -> Result<Self> {
        let shape = dataset.variable_shape(name)?;
        if shape.len() != 2 {
            return Err(AggregationError::axis_mismatch(format!(
                "{} has {} axes, expected (cell, vertex)",
                name,
                shape.len()
            )));
        }
        if shape[0] != spec.cell_count {
            return Err(AggregationError::axis_mismatch(format!(
                "{} cell axis has {} cells, {} expects {}",
                name, shape[0], spec.domain, spec.cell_count
            )));
        }
        if shape[1] < VERTICES_PER_CELL {
            return Err(AggregationError::axis_mismatch(format!(
                "{} has {} vertices per cell, expected {}",
                name, shape[1], VERTICES_PER_CELL
            )));
        }

        Ok(Self {
            dataset,
            name: name.to_string(),
            cell_count: shape[0],
        })
    }

    pub fn read_window(&self, window: &BoundaryWindow) -> Result<Vec<f64>> {
        if window.vertex >= VERTICES_PER_CELL || window.cells.end > self.cell_count {
            return Err(AggregationError::out_of_range(format!(
                "{}: vertex {} cells {}..{}",
                self.name, window.vertex, window.cells.start, window.cells.end
            )));
        }
        let values = self.dataset.read_f64(
            &self.name,
            &[window.cells.start, window.vertex],
            &[window.cells.len(), 1],
        )?;
        expect_len(&self.name, values, window.cells.len())
    }

    /// Read vertex `vertex` of every cell.
    pub fn read_vertex(&self, vertex: usize) -> Result<Vec<f64>> {
        self.read_window(&BoundaryWindow {
            cells: 0..self.cell_count,
            vertex,
        })
    }
}

fn expect_len<T>(name: &str, values: Vec<T>, expected: usize) -> Result<Vec<T>> {
    if values.len() != expected {
        return Err(AggregationError::ReadFailed(format!(
            "{}: read {} values, expected {}",
            name,
            values.len(),
            expected
        )));
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_common::Domain;
    use test_utils::{create_field, MemoryDataset};

    fn spec(cells: usize) -> DomainSpec {
        DomainSpec::new(Domain::Dom01, cells)
    }

    #[test]
    fn test_resolve_reports_axes() {
        let ds = MemoryDataset::new("a.nc").with_field("temp", &create_field(4, 10));
        let field = FieldVariable::resolve(&ds, "temp", &spec(10)).unwrap();
        assert_eq!(field.time_count(), 1);
        assert_eq!(field.height_count(), 4);
        assert_eq!(field.cell_count(), 10);
    }

    #[test]
    fn test_resolve_rejects_wrong_cell_count() {
        let ds = MemoryDataset::new("a.nc").with_field("temp", &create_field(4, 10));
        let err = FieldVariable::resolve(&ds, "temp", &spec(12)).err().unwrap();
        assert!(matches!(err, AggregationError::AxisMismatch(_)));
    }

    #[test]
    fn test_resolve_rejects_wrong_rank() {
        let ds = MemoryDataset::new("a.nc").with_variable("flat", vec![10], vec![0.0; 10]);
        let err = FieldVariable::resolve(&ds, "flat", &spec(10)).err().unwrap();
        assert!(matches!(err, AggregationError::AxisMismatch(_)));
    }

    #[test]
    fn test_resolve_missing_variable() {
        let ds = MemoryDataset::new("a.nc");
        let err = FieldVariable::resolve(&ds, "temp", &spec(10)).err().unwrap();
        assert!(matches!(err, AggregationError::VariableNotFound(_)));
    }

    #[test]
    fn test_read_window_and_column() {
        let ds = MemoryDataset::new("a.nc").with_field("temp", &create_field(3, 6));
        let field = FieldVariable::resolve(&ds, "temp", &spec(6)).unwrap();

        let window = field.read_window(&AxisWindow::new(0, 2, 1..4)).unwrap();
        assert_eq!(window, vec![2001.0, 2002.0, 2003.0]);

        let column = field.read_column(0, 5).unwrap();
        assert_eq!(column, vec![5.0, 1005.0, 2005.0]);
    }

    #[test]
    fn test_out_of_range_indices() {
        let ds = MemoryDataset::new("a.nc").with_field("temp", &create_field(3, 6));
        let field = FieldVariable::resolve(&ds, "temp", &spec(6)).unwrap();
        assert!(matches!(
            field.read_level(1, 0),
            Err(AggregationError::AxisOutOfRange(_))
        ));
        assert!(matches!(
            field.read_level(0, 3),
            Err(AggregationError::AxisOutOfRange(_))
        ));
        assert!(matches!(
            field.read_window(&AxisWindow::new(0, 0, 4..7)),
            Err(AggregationError::AxisOutOfRange(_))
        ));
    }

    #[test]
    fn test_boundary_variable_checks_vertices() {
        let ds = MemoryDataset::new("a.nc").with_variable("clon_bnds", vec![4, 2], vec![0.0; 8]);
        let err = BoundaryVariable::resolve(&ds, "clon_bnds", &spec(4)).err().unwrap();
        assert!(err.to_string().contains("vertices per cell"));
    }
}
