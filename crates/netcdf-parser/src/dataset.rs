//! Dataset access traits.
//!
//! The aggregation engine consumes datasets only through these traits: open a
//! dataset by identifier, ask for a variable's shape, and read a hyperslab
//! (`start`/`count` per axis) as a flat row-major buffer.

use crate::error::{NetCdfError, NetCdfResult};

/// An opened, request-scoped dataset.
///
/// Dropping the value releases the underlying file handle.
pub trait Dataset {
    /// Identifier the dataset was opened with.
    fn id(&self) -> &str;

    /// Length of every axis of `variable`, in storage order.
    fn variable_shape(&self, variable: &str) -> NetCdfResult<Vec<usize>>;

    /// Read a hyperslab of `variable` converted to `f32`.
    fn read_f32(&self, variable: &str, start: &[usize], count: &[usize])
        -> NetCdfResult<Vec<f32>>;

    /// Read a hyperslab of `variable` converted to `f64`.
    fn read_f64(&self, variable: &str, start: &[usize], count: &[usize])
        -> NetCdfResult<Vec<f64>>;
}

/// Something that can open datasets by identifier.
pub trait DatasetSource: Send + Sync {
    fn open(&self, id: &str) -> NetCdfResult<Box<dyn Dataset>>;
}

/// Validate a `start`/`count` window against a variable shape.
///
/// Returns the number of elements the window addresses.
pub fn check_window(
    variable: &str,
    shape: &[usize],
    start: &[usize],
    count: &[usize],
) -> NetCdfResult<usize> {
    if start.len() != shape.len() || count.len() != shape.len() {
        return Err(NetCdfError::OutOfBounds(format!(
            "{}: window rank {}/{} does not match variable rank {}",
            variable,
            start.len(),
            count.len(),
            shape.len()
        )));
    }

    let mut len = 1usize;
    for (axis, ((&s, &c), &n)) in start.iter().zip(count).zip(shape).enumerate() {
        let end = s.checked_add(c).ok_or_else(|| {
            NetCdfError::OutOfBounds(format!("{}: axis {} overflows", variable, axis))
        })?;
        if end > n {
            return Err(NetCdfError::OutOfBounds(format!(
                "{}: axis {} window {}..{} exceeds length {}",
                variable, axis, s, end, n
            )));
        }
        len *= c;
    }
    Ok(len)
}
