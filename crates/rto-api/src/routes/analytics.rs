//! # Carrier Analytics Routes
//!
//! Cross-brand carrier performance: the lane scorecard, bucketed by
//! carrier, destination pincode, and ISO week.

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};

use rto_metrics::{LaneScorecardRow, ScorecardQuery};

use crate::error::AppError;
use crate::state::AppState;

/// Build the analytics router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/analytics/scorecard", get(carrier_scorecard))
}

/// GET /api/analytics/scorecard?carrier=&pincode=&week_start= — lane scorecard rows.
#[utoipa::path(
    get,
    path = "/api/analytics/scorecard",
    params(
        ("carrier" = Option<String>, Query, description = "Restrict to one carrier"),
        ("pincode" = Option<String>, Query, description = "Restrict to one destination pincode"),
        ("week_start" = Option<String>, Query, description = "Restrict to the ISO week containing this RFC 3339 timestamp"),
    ),
    responses(
        (status = 200, description = "Scorecard rows, sorted by carrier, pincode, week"),
    ),
    tag = "analytics"
)]
pub(crate) async fn carrier_scorecard(
    State(state): State<AppState>,
    Query(query): Query<ScorecardQuery>,
) -> Result<Json<Vec<LaneScorecardRow>>, AppError> {
    Ok(Json(state.metrics.carrier_scorecard(&query)))
}
