//! Streaming per-triangle aggregates as NDJSON.
//!
//! The engine runs on the blocking pool and sends each batch over a bounded
//! channel; the response body drains the channel. When the client goes
//! away the receiver is dropped, the next send fails and the engine stops,
//! releasing the dataset.
//!
//! Errors raised before the first batch become ordinary error responses.
//! Later errors end the body with a single `{"error": ...}` line.

use std::convert::Infallible;
use std::ops::ControlFlow;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Extension, Path, Query},
    http::header,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::stream;
use mesh_aggregator::TriangleBatch;
use mesh_common::MeshError;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::tris::tris_agg_request;
use super::FieldParams;
use crate::error::{ApiError, ExceptionResponse};
use crate::metrics::{record_stream_batch, RequestTimer};
use crate::state::AppState;

/// Batches buffered between the engine and the client.
const CHANNEL_CAPACITY: usize = 4;

const NDJSON: &str = "application/x-ndjson";

enum StreamEvent {
    Batch(TriangleBatch),
    Failed(ApiError),
}

#[derive(Serialize)]
struct ErrorLine {
    error: ExceptionResponse,
}

/// GET /v1/datasets/:dataset/tris-agg/stream
pub async fn tris_agg_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(dataset): Path<String>,
    Query(params): Query<FieldParams>,
) -> Response {
    let timer = RequestTimer::start("tris_agg_stream");
    let request = match tris_agg_request(dataset, &params) {
        Ok(request) => request,
        Err(e) => {
            timer.fail(&e);
            return e.into_response();
        }
    };

    let (tx, mut rx) = mpsc::channel::<StreamEvent>(CHANNEL_CAPACITY);
    let producer = tokio::task::spawn_blocking(move || {
        let result = state
            .service
            .tris_agg_stream(&request, |batch| {
                let cells = batch.len();
                match tx.blocking_send(StreamEvent::Batch(batch)) {
                    Ok(()) => {
                        record_stream_batch(cells);
                        ControlFlow::Continue(())
                    }
                    Err(_) => ControlFlow::Break(()),
                }
            })
            .map_err(ApiError::from);

        timer.finish(&result);
        match result {
            Ok(summary) if summary.cancelled => {
                debug!(cells = summary.cells, "Client disconnected from triangle stream");
            }
            Ok(_) => {}
            Err(e) => {
                let _ = tx.blocking_send(StreamEvent::Failed(e));
            }
        }
    });

    let first = match first_event(&mut rx, producer).await {
        Ok(first) => first,
        Err(e) => return e.into_response(),
    };

    let body = stream::unfold((first, rx), |(pending, mut rx)| async move {
        let event = match pending {
            Some(event) => event,
            None => match rx.recv().await {
                Some(event) => event,
                None => return None,
            },
        };
        Some((Ok::<_, Infallible>(encode_line(&event)), (None, rx)))
    });

    ([(header::CONTENT_TYPE, NDJSON)], Body::from_stream(body)).into_response()
}

/// Wait for the producer's first event.
///
/// A channel closed before any event means the producer either panicked or
/// had no cells to emit; only the latter yields an empty body.
async fn first_event(
    rx: &mut mpsc::Receiver<StreamEvent>,
    producer: JoinHandle<()>,
) -> Result<Option<StreamEvent>, ApiError> {
    match rx.recv().await {
        Some(StreamEvent::Failed(e)) => Err(e),
        Some(event) => Ok(Some(event)),
        None => match producer.await {
            Ok(()) => Ok(None),
            Err(e) => {
                error!(error = %e, "Triangle stream producer failed before the first batch");
                Err(ApiError(MeshError::InternalError(format!(
                    "stream producer failed: {}",
                    e
                ))))
            }
        },
    }
}

fn encode_line(event: &StreamEvent) -> Bytes {
    let mut line = match event {
        StreamEvent::Batch(batch) => serde_json::to_vec(batch),
        StreamEvent::Failed(e) => serde_json::to_vec(&ErrorLine {
            error: ExceptionResponse::from_error(&e.0),
        }),
    }
    .unwrap_or_default();
    line.push(b'\n');
    Bytes::from(line)
}
