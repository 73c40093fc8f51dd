//! Mesh API Service Library
//!
//! HTTP transport for the spatial aggregation engine: latitude and height
//! profiles, mesh geometry and per-triangle values of ICON datasets.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Latitude profiles
        .route(
            "/v1/datasets/:dataset/height-profile",
            get(handlers::profile::height_profile_handler),
        )
        .route(
            "/v1/datasets/:dataset/lat-profile",
            get(handlers::profile::lat_profile_handler),
        )
        // Geometry
        .route("/v1/datasets/:dataset/mesh", get(handlers::mesh::mesh_handler))
        // Per-triangle values
        .route("/v1/datasets/:dataset/tris", get(handlers::tris::tris_handler))
        .route(
            "/v1/datasets/:dataset/tris-agg",
            get(handlers::tris::tris_agg_handler),
        )
        .route(
            "/v1/datasets/:dataset/tris-agg/stream",
            get(handlers::stream::tris_agg_stream_handler),
        )
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
