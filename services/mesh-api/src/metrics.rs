//! Request metrics recorded through the `metrics` facade.
//!
//! Without an installed recorder (tests) every call is a no-op.

use std::time::Instant;

use metrics::{counter, histogram};

use crate::error::ApiError;

/// Times one engine operation and records its outcome.
pub struct RequestTimer {
    operation: &'static str,
    started: Instant,
}

impl RequestTimer {
    pub fn start(operation: &'static str) -> Self {
        counter!("mesh_requests_total", "operation" => operation).increment(1);
        Self {
            operation,
            started: Instant::now(),
        }
    }

    pub fn finish<T>(self, result: &Result<T, ApiError>) {
        self.record(result.as_ref().err());
    }

    pub fn fail(self, err: &ApiError) {
        self.record(Some(err));
    }

    fn record(self, err: Option<&ApiError>) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        histogram!("mesh_request_duration_ms", "operation" => self.operation).record(elapsed_ms);
        if let Some(e) = err {
            counter!(
                "mesh_request_errors_total",
                "operation" => self.operation,
                "kind" => e.0.kind()
            )
            .increment(1);
        }
    }
}

pub fn record_stream_batch(cells: usize) {
    counter!("mesh_stream_batches_total").increment(1);
    counter!("mesh_stream_cells_total").increment(cells as u64);
}
