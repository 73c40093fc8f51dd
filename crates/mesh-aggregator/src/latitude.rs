//! Latitude-band reductions.

use mesh_common::Reduction;
use tracing::debug;

use crate::error::{AggregationError, Result};
use crate::lookup::LatitudeLookup;
use crate::slice::FieldVariable;

/// Reduce one value per cell into one value per latitude bin.
///
/// `values` must hold exactly one entry per cell of the lookup's domain.
/// Under [`Reduction::Mean`] each bin sum is divided by the bin's cell count;
/// a bin without cells yields NaN.
pub fn aggregate_latitudes(
    values: &[f32],
    lookup: &LatitudeLookup,
    reduction: Reduction,
) -> Result<Vec<f64>> {
    let cell_to_bin = lookup.cell_to_bin();
    if values.len() != cell_to_bin.len() {
        return Err(AggregationError::axis_mismatch(format!(
            "{} values for {} cells of {}",
            values.len(),
            cell_to_bin.len(),
            lookup.domain()
        )));
    }

    let mut bins = vec![0.0f64; lookup.lat_bin_count()];
    for (&value, &bin) in values.iter().zip(cell_to_bin) {
        bins[bin as usize] += value as f64;
    }

    if reduction.is_mean() {
        for (total, &count) in bins.iter_mut().zip(lookup.bin_count()) {
            *total = reduction.finish(*total, count as usize);
        }
    }

    Ok(bins)
}

/// Latitude profile of a single `(time, height)` level.
pub fn latitude_profile(
    field: &FieldVariable<'_>,
    lookup: &LatitudeLookup,
    time: usize,
    height: usize,
    reduction: Reduction,
) -> Result<Vec<f64>> {
    let values = field.read_level(time, height)?;
    aggregate_latitudes(&values, lookup, reduction)
}

/// Latitude profiles of every height level at one time step, in ascending
/// level order.
///
/// A failed level aborts the whole profile.
pub fn height_profile(
    field: &FieldVariable<'_>,
    lookup: &LatitudeLookup,
    time: usize,
    reduction: Reduction,
) -> Result<Vec<Vec<f64>>> {
    field.check_time(time)?;

    let mut levels = Vec::with_capacity(field.height_count());
    for height in 0..field.height_count() {
        levels.push(latitude_profile(field, lookup, time, height, reduction)?);
    }

    debug!(
        variable = field.name(),
        levels = levels.len(),
        "Computed height profile"
    );

    Ok(levels)
}
