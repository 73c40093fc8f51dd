//! Test data generators for creating synthetic ICON-like data.
//!
//! These generators create predictable, verifiable test data patterns
//! that can be used across the test suite.

use std::f64::consts::PI;

/// Creates the per-cell values of one height level.
///
/// Each cell value is calculated as: `level * 1000 + cell`
///
/// This makes it easy to verify that the right level and cell were read.
///
/// # Example
///
/// ```
/// use test_utils::create_level_values;
///
/// let level = create_level_values(4, 2);
/// assert_eq!(level, vec![2000.0, 2001.0, 2002.0, 2003.0]);
/// ```
pub fn create_level_values(cell_count: usize, level: usize) -> Vec<f32> {
    (0..cell_count)
        .map(|cell| (level * 1000 + cell) as f32)
        .collect()
}

/// Creates a full vertical field as `levels[level][cell]`.
pub fn create_field(nheight: usize, cell_count: usize) -> Vec<Vec<f32>> {
    (0..nheight)
        .map(|level| create_level_values(cell_count, level))
        .collect()
}

/// Creates a temperature-like field in Kelvin that cools with height.
///
/// Values vary smoothly with cell index so bin sums are not trivially equal.
pub fn create_temperature_field(nheight: usize, cell_count: usize) -> Vec<Vec<f32>> {
    (0..nheight)
        .map(|level| {
            (0..cell_count)
                .map(|cell| {
                    let phase = cell as f32 / cell_count.max(1) as f32;
                    288.0 - 6.5 * level as f32 + 10.0 * (phase * std::f32::consts::PI).sin()
                })
                .collect()
        })
        .collect()
}

/// Assigns cells to bins in contiguous bands.
///
/// Cell `c` lands in bin `c * bin_count / cell_count`, so every bin receives
/// at least one cell whenever `cell_count >= bin_count`.
///
/// Returns `(bin, cells)` pairs for every bin, including empty ones.
pub fn banded_membership(cell_count: usize, bin_count: usize) -> Vec<(usize, Vec<usize>)> {
    let mut bins: Vec<(usize, Vec<usize>)> = (0..bin_count).map(|b| (b, Vec::new())).collect();
    if bin_count == 0 {
        return bins;
    }
    for cell in 0..cell_count {
        let bin = cell * bin_count / cell_count;
        bins[bin].1.push(cell);
    }
    bins
}

/// Creates boundary vertex coordinates in radians for `cell_count` triangles.
///
/// Vertex `k` of cell `c` has longitude `(c + k / 10) * 0.001` rad and
/// latitude `-(c + k / 10) * 0.0005` rad.
pub fn create_boundary_vertices(cell_count: usize) -> (Vec<[f64; 3]>, Vec<[f64; 3]>) {
    let mut lons = Vec::with_capacity(cell_count);
    let mut lats = Vec::with_capacity(cell_count);
    for cell in 0..cell_count {
        let base = cell as f64;
        lons.push([
            base * 0.001,
            (base + 0.1) * 0.001,
            (base + 0.2) * 0.001,
        ]);
        lats.push([
            -base * 0.0005,
            -(base + 0.1) * 0.0005,
            -(base + 0.2) * 0.0005,
        ]);
    }
    (lons, lats)
}

/// Converts radians to degrees with the exact value of pi.
pub fn to_degrees(rad: f64) -> f64 {
    rad * 180.0 / PI
}
