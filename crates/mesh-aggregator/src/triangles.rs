//! Per-triangle reductions over the vertical axis.

use std::ops::Range;

use mesh_common::{Reduction, Traversal};

use crate::error::{AggregationError, Result};
use crate::slice::{AxisWindow, FieldVariable};

/// Raw values of every cell at one `(time, height)` level.
pub fn raw_triangles(field: &FieldVariable<'_>, time: usize, height: usize) -> Result<Vec<f32>> {
    field.read_level(time, height)
}

/// Reduce every height level of each cell in `cells` into one value per cell.
///
/// Both traversals produce the same values up to floating-point rounding.
/// With zero height levels a mean is NaN and a sum is zero.
pub fn aggregate_triangles(
    field: &FieldVariable<'_>,
    time: usize,
    cells: Range<usize>,
    reduction: Reduction,
    traversal: Traversal,
) -> Result<Vec<f64>> {
    field.check_time(time)?;
    if cells.end > field.cell_count() || cells.start > cells.end {
        return Err(AggregationError::out_of_range(format!(
            "cells {}..{} outside 0..{}",
            cells.start,
            cells.end,
            field.cell_count()
        )));
    }

    let mut totals = match traversal {
        Traversal::PerCell => per_cell(field, time, cells)?,
        Traversal::PerLevel => per_level(field, time, cells)?,
    };

    let levels = field.height_count();
    for total in totals.iter_mut() {
        *total = reduction.finish(*total, levels);
    }

    Ok(totals)
}

fn per_cell(field: &FieldVariable<'_>, time: usize, cells: Range<usize>) -> Result<Vec<f64>> {
    let mut totals = Vec::with_capacity(cells.len());
    if field.height_count() == 0 {
        totals.resize(cells.len(), 0.0);
        return Ok(totals);
    }
    for cell in cells {
        let column = field.read_column(time, cell)?;
        totals.push(column.iter().map(|&v| v as f64).sum());
    }
    Ok(totals)
}

fn per_level(field: &FieldVariable<'_>, time: usize, cells: Range<usize>) -> Result<Vec<f64>> {
    let mut totals = vec![0.0f64; cells.len()];
    for height in 0..field.height_count() {
        let level = field.read_window(&AxisWindow::new(time, height, cells.clone()))?;
        for (total, &value) in totals.iter_mut().zip(&level) {
            *total += value as f64;
        }
    }
    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mesh_common::{Domain, DomainSpec};
    use test_utils::fixtures::two_level;
    use test_utils::{assert_approx_eq, create_temperature_field, MemoryDataset};

    fn spec(cells: usize) -> DomainSpec {
        DomainSpec::new(Domain::Dom01, cells)
    }

    #[test]
    fn test_two_level_example() {
        let ds = MemoryDataset::new("a.nc").with_field("temp", &two_level::levels());
        let field = FieldVariable::resolve(&ds, "temp", &spec(2)).unwrap();

        for traversal in [Traversal::PerCell, Traversal::PerLevel] {
            let sum = aggregate_triangles(&field, 0, 0..2, Reduction::Sum, traversal).unwrap();
            assert_eq!(sum, two_level::SUM.to_vec());
            let mean = aggregate_triangles(&field, 0, 0..2, Reduction::Mean, traversal).unwrap();
            assert_eq!(mean, two_level::MEAN.to_vec());
        }
    }

    #[test]
    fn test_traversals_agree() {
        let cells = 300;
        let ds = MemoryDataset::new("a.nc")
            .with_field("temp", &create_temperature_field(7, cells));
        let field = FieldVariable::resolve(&ds, "temp", &spec(cells)).unwrap();

        let a = aggregate_triangles(&field, 0, 0..cells, Reduction::Mean, Traversal::PerCell)
            .unwrap();
        let b = aggregate_triangles(&field, 0, 0..cells, Reduction::Mean, Traversal::PerLevel)
            .unwrap();
        assert_eq!(a.len(), cells);
        for (x, y) in a.iter().zip(&b) {
            assert_approx_eq!(*x, *y, 1e-9);
        }
    }

    #[test]
    fn test_read_patterns() {
        let cells = 40;
        let ds = MemoryDataset::new("a.nc")
            .with_field("temp", &create_temperature_field(3, cells));
        let reads = ds.read_counter();
        let field = FieldVariable::resolve(&ds, "temp", &spec(cells)).unwrap();

        aggregate_triangles(&field, 0, 0..cells, Reduction::Sum, Traversal::PerLevel).unwrap();
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 3);

        aggregate_triangles(&field, 0, 0..cells, Reduction::Sum, Traversal::PerCell).unwrap();
        assert_eq!(reads.load(std::sync::atomic::Ordering::SeqCst), 3 + cells);
    }

    #[test]
    fn test_sub_range_and_time_index() {
        let ds = MemoryDataset::new("a.nc").with_time_field(
            "temp",
            &[
                vec![vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]],
                vec![vec![10.0, 20.0, 30.0], vec![30.0, 40.0, 50.0]],
            ],
        );
        let field = FieldVariable::resolve(&ds, "temp", &spec(3)).unwrap();

        let mean = aggregate_triangles(&field, 1, 1..3, Reduction::Mean, Traversal::PerLevel)
            .unwrap();
        assert_eq!(mean, vec![30.0, 40.0]);

        assert!(matches!(
            aggregate_triangles(&field, 2, 0..3, Reduction::Sum, Traversal::PerLevel),
            Err(AggregationError::AxisOutOfRange(_))
        ));
        assert!(matches!(
            aggregate_triangles(&field, 0, 2..4, Reduction::Sum, Traversal::PerCell),
            Err(AggregationError::AxisOutOfRange(_))
        ));
    }

    #[test]
    fn test_zero_levels() {
        let ds = MemoryDataset::new("a.nc").with_variable("temp", vec![1, 0, 2], vec![]);
        let field = FieldVariable::resolve(&ds, "temp", &spec(2)).unwrap();

        for traversal in [Traversal::PerCell, Traversal::PerLevel] {
            let sum = aggregate_triangles(&field, 0, 0..2, Reduction::Sum, traversal).unwrap();
            assert_eq!(sum, vec![0.0, 0.0]);
            let mean = aggregate_triangles(&field, 0, 0..2, Reduction::Mean, traversal).unwrap();
            assert!(mean.iter().all(|v| v.is_nan()));
        }
    }

    #[test]
    fn test_raw_triangles() {
        let ds = MemoryDataset::new("a.nc").with_field("temp", &two_level::levels());
        let field = FieldVariable::resolve(&ds, "temp", &spec(2)).unwrap();
        assert_eq!(raw_triangles(&field, 0, 1).unwrap(), two_level::LEVEL1.to_vec());
    }
}
