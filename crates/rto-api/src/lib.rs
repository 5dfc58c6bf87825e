//! # rto-api — Axum API Services for the RTO Optimizer
//!
//! The HTTP surface over the engine and read models.
//!
//! ## API Surface
//!
//! | Prefix                        | Module                  | Domain                      |
//! |-------------------------------|-------------------------|-----------------------------|
//! | `/api/webhooks/*`             | [`routes::webhooks`]    | Storefront + carrier feeds  |
//! | `/api/ndr/*`                  | [`routes::ndr`]         | Customer NDR resolution     |
//! | `/api/seller/*`               | [`routes::seller`]      | Challenges + dashboards     |
//! | `/api/analytics/*`            | [`routes::analytics`]   | Carrier lane scorecards     |
//! | `/openapi.json`               | [`openapi`]             | Generated spec              |
//! | `/health/*`                   | (this module)           | Probes                      |
//!
//! ## Crate Policy
//!
//! - No business logic in route handlers — they validate shape and delegate
//!   to [`rto_engine`] services and [`rto_metrics`] read models.
//! - All errors map to structured HTTP responses via [`AppError`].

pub mod error;
pub mod extractors;
pub mod openapi;
pub mod routes;
pub mod state;

pub use error::AppError;
pub use state::{AppConfig, AppState};

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Assemble the full application router.
///
/// Health probes are mounted alongside the API routes; there is no auth
/// layer on this surface, which is expected to sit behind a gateway.
///
/// Body size limit: 1 MiB. Webhook payloads are small; anything larger is
/// a feed misconfiguration.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::webhooks::router())
        .merge(routes::ndr::router())
        .merge(routes::seller::router())
        .merge(routes::analytics::router())
        .merge(openapi::router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness))
        .merge(api)
        .with_state(state)
}

/// Liveness probe. 200 whenever the process is up.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe. Verifies the read models answer queries.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let query = rto_metrics::ScorecardQuery::default();
    let _ = state.metrics.carrier_scorecard(&query);
    (StatusCode::OK, "ready")
}

// ─── Tests ───────────────────────────────────────────────────────────
