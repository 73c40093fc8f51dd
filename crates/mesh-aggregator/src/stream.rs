//! Incremental emission of per-triangle aggregates.
//!
//! Cells are processed in ascending index order and every aggregate is
//! buffered into the current batch, which is handed to the consumer once it
//! reaches capacity. Each cell appears exactly once across all batches.

use std::ops::ControlFlow;

use mesh_common::{Reduction, Traversal};
use serde::Serialize;
use tracing::debug;

use crate::error::{AggregationError, Result};
use crate::slice::FieldVariable;
use crate::triangles::aggregate_triangles;

/// A run of consecutive cell aggregates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriangleBatch {
    /// Index of the first cell in `data`.
    pub offset: usize,
    #[serde(rename = "data")]
    pub values: Vec<f64>,
}

impl TriangleBatch {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Upper bound on the values preallocated per batch.
const MAX_PREALLOCATED: usize = 64 * 1024;

/// Buffers values and flushes them in batches of at most `capacity`.
#[derive(Debug)]
pub struct TriangleBatcher {
    capacity: usize,
    next_offset: usize,
    current: Vec<f64>,
}

impl TriangleBatcher {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(AggregationError::invalid_request(
                "stream batch size must be > 0",
            ));
        }
        Ok(Self {
            capacity,
            next_offset: 0,
            current: Vec::with_capacity(capacity.min(MAX_PREALLOCATED)),
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add the next cell's value; returns the batch if it just filled up.
    pub fn push(&mut self, value: f64) -> Option<TriangleBatch> {
        self.current.push(value);
        if self.current.len() == self.capacity {
            self.flush()
        } else {
            None
        }
    }

    /// Flush any buffered tail.
    pub fn finish(mut self) -> Option<TriangleBatch> {
        self.flush()
    }

    fn flush(&mut self) -> Option<TriangleBatch> {
        if self.current.is_empty() {
            return None;
        }
        let reserve = self.capacity.min(MAX_PREALLOCATED);
        let values = std::mem::replace(&mut self.current, Vec::with_capacity(reserve));
        let batch = TriangleBatch {
            offset: self.next_offset,
            values,
        };
        self.next_offset += batch.len();
        Some(batch)
    }
}

/// Outcome of a streamed aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StreamSummary {
    pub batches: usize,
    pub cells: usize,
    /// The consumer stopped the stream before every cell was emitted.
    pub cancelled: bool,
}

/// Aggregate every cell of `field` and hand the results to `sink` in
/// ascending batches of at most `batch_size` values.
///
/// Returning [`ControlFlow::Break`] from `sink` stops production; no further
/// reads are issued.
pub fn stream_triangle_aggregates<F>(
    field: &FieldVariable<'_>,
    time: usize,
    reduction: Reduction,
    traversal: Traversal,
    batch_size: usize,
    mut sink: F,
) -> Result<StreamSummary>
where
    F: FnMut(TriangleBatch) -> ControlFlow<()>,
{
    let mut batcher = TriangleBatcher::new(batch_size)?;
    field.check_time(time)?;

    let cell_count = field.cell_count();
    let mut summary = StreamSummary::default();
    let mut start = 0;

    while start < cell_count {
        let end = start.saturating_add(batch_size).min(cell_count);
        let values = aggregate_triangles(field, time, start..end, reduction, traversal)?;

        for value in values {
            if let Some(batch) = batcher.push(value) {
                summary.batches += 1;
                summary.cells += batch.len();
                if sink(batch).is_break() {
                    summary.cancelled = true;
                    debug!(cells = summary.cells, "Triangle stream cancelled by consumer");
                    return Ok(summary);
                }
            }
        }
        start = end;
    }

    if let Some(batch) = batcher.finish() {
        summary.batches += 1;
        summary.cells += batch.len();
        if sink(batch).is_break() {
            summary.cancelled = true;
        }
    }

    Ok(summary)
}
