//! HTTP API server for the bookstore order service.
//!
//! Exposes the order store, the wholesaler-enriched product catalog, and
//! the storefront form endpoints as a JSON REST API, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod mail;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use order_store::OrderStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::orders::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: OrderStore + Clone + 'static>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/bestellung", post(routes::orders::create::<S>))
        .route("/bestellungen", get(routes::orders::list::<S>))
        .route("/bestellung/{id}", get(routes::orders::get::<S>))
        .route("/bestellung/{id}", delete(routes::orders::delete::<S>))
        .route("/bestellung/{id}/status", post(routes::orders::update_status::<S>))
        .route("/bestellung/{id}/export", post(routes::orders::export::<S>))
        .route("/storno/{token}", post(routes::orders::cancel::<S>))
        .route("/produkte", get(routes::products::list::<S>))
        .route("/produkte/{id}", get(routes::products::detail::<S>))
        .route("/newsletter", post(routes::forms::newsletter::<S>))
        .route("/kontakt", post(routes::forms::contact::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
