//! # Seller Console Routes
//!
//! The seller-facing surface: challenge a suspicious NDR, record the
//! adjudication outcome, and read the brand dashboard. All routes are
//! brand-scoped; an order outside the requesting brand reads as not found.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use rto_core::{BrandId, ChallengeId, OrderId, Timestamp};
use rto_domain::ChallengeResolution;
use rto_engine::{ChallengeRequest, EngineError};
use rto_metrics::{Period, SellerDashboard};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

/// Build the seller console router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/seller/challenge-ndr", post(challenge_ndr))
        .route(
            "/api/seller/challenges/{challenge_id}/resolution",
            put(adjudicate_challenge),
        )
        .route("/api/seller/dashboard/{brand_id}", get(seller_dashboard))
}

// ─── Request / Response types ────────────────────────────────────────

/// A seller's challenge against the latest NDR on an order.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChallengeNdrRequest {
    /// The order carrying the suspicious NDR.
    pub order_id: String,
    /// The seller raising the challenge. Must own the order.
    pub brand_id: String,
    /// Why the seller believes the NDR is false.
    pub reason: String,
    /// Evidence artifacts to pull (call logs, GPS trace).
    #[serde(default)]
    pub evidence_requested: Vec<String>,
    /// Free-form comments.
    #[serde(default)]
    pub comments: Option<String>,
}

impl Validate for ChallengeNdrRequest {
    fn validate(&self) -> Result<(), String> {
        if self.reason.trim().is_empty() {
            return Err("reason must not be empty".to_string());
        }
        if self.reason.len() > 2000 {
            return Err("reason must not exceed 2000 characters".to_string());
        }
        Ok(())
    }
}

/// Challenge state as returned to the seller.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChallengeResponse {
    /// The challenge identifier.
    pub challenge_id: String,
    /// The disputed order.
    pub order_id: String,
    /// Lifecycle state: UNDER_REVIEW or RESOLVED.
    pub status: String,
    /// Adjudication outcome, present once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// When the challenge was opened, ISO 8601.
    pub created_at: String,
    /// When adjudication is expected, ISO 8601.
    pub expected_resolution_at: String,
    /// When adjudication landed, ISO 8601.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
}

impl ChallengeResponse {
    fn from_challenge(c: &rto_domain::Challenge) -> Self {
        Self {
            challenge_id: c.id.to_string(),
            order_id: c.order_id.to_string(),
            status: c.status.to_string(),
            resolution: c.resolution.map(|r| r.to_string()),
            created_at: c.created_at.to_iso8601(),
            expected_resolution_at: c.expected_resolution_at.to_iso8601(),
            resolved_at: c.resolved_at.map(|t| t.to_iso8601()),
        }
    }
}

/// Adjudication outcome payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjudicationRequest {
    /// ACCEPTED overturns the NDR; REJECTED lets it stand.
    #[schema(value_type = String, example = "ACCEPTED")]
    pub resolution: ChallengeResolution,
}

impl Validate for AdjudicationRequest {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Dashboard query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Reporting window: day, week, or month. Defaults to week.
    pub period: Option<String>,
}

// ─── Handlers ────────────────────────────────────────────────────────

/// POST /api/seller/challenge-ndr — open a challenge against an NDR.
#[utoipa::path(
    post,
    path = "/api/seller/challenge-ndr",
    request_body = ChallengeNdrRequest,
    responses(
        (status = 201, description = "Challenge opened under review", body = ChallengeResponse),
        (status = 404, description = "Order not found for this brand, or no NDR on record"),
        (status = 409, description = "The NDR event is already challenged"),
        (status = 422, description = "Invalid payload"),
    ),
    tag = "seller"
)]
pub(crate) async fn challenge_ndr(
    State(state): State<AppState>,
    body: Result<Json<ChallengeNdrRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ChallengeResponse>), AppError> {
    let req = extract_validated_json(body)?;

    let challenge = state.disputes.open_challenge(
        ChallengeRequest {
            order_id: OrderId::new(req.order_id).map_err(EngineError::from)?,
            brand_id: BrandId::new(req.brand_id).map_err(EngineError::from)?,
            reason: req.reason,
            evidence_requested: req.evidence_requested,
            comments: req.comments,
        },
        Timestamp::now(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(ChallengeResponse::from_challenge(&challenge)),
    ))
}

/// PUT /api/seller/challenges/{challenge_id}/resolution — record adjudication.
#[utoipa::path(
    put,
    path = "/api/seller/challenges/{challenge_id}/resolution",
    params(
        ("challenge_id" = String, Path, description = "Challenge identifier (UUID)"),
    ),
    request_body = AdjudicationRequest,
    responses(
        (status = 200, description = "Challenge resolved", body = ChallengeResponse),
        (status = 404, description = "Challenge not found"),
        (status = 409, description = "Challenge already resolved"),
        (status = 422, description = "Invalid payload"),
    ),
    tag = "seller"
)]
pub(crate) async fn adjudicate_challenge(
    State(state): State<AppState>,
    Path(challenge_id): Path<String>,
    body: Result<Json<AdjudicationRequest>, JsonRejection>,
) -> Result<Json<ChallengeResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let challenge_id = Uuid::parse_str(&challenge_id)
        .map(ChallengeId::from_uuid)
        .map_err(|_| AppError::Validation(format!("\"{challenge_id}\" is not a UUID")))?;

    let challenge =
        state
            .disputes
            .apply_adjudication(&challenge_id, req.resolution, Timestamp::now())?;

    Ok(Json(ChallengeResponse::from_challenge(&challenge)))
}

/// GET /api/seller/dashboard/{brand_id}?period= — brand performance.
#[utoipa::path(
    get,
    path = "/api/seller/dashboard/{brand_id}",
    params(
        ("brand_id" = String, Path, description = "Seller brand identifier"),
        ("period" = Option<String>, Query, description = "day, week, or month (default week)"),
    ),
    responses(
        (status = 200, description = "Dashboard over the trailing window"),
        (status = 422, description = "Invalid brand or period"),
    ),
    tag = "seller"
)]
pub(crate) async fn seller_dashboard(
    State(state): State<AppState>,
    Path(brand_id): Path<String>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<SellerDashboard>, AppError> {
    let brand_id = BrandId::new(brand_id).map_err(EngineError::from)?;
    let period = match query.period.as_deref() {
        None => Period::Week,
        Some(raw) => raw.parse().map_err(AppError::Validation)?,
    };

    let dashboard = state
        .metrics
        .seller_dashboard(&brand_id, period, Timestamp::now());
    Ok(Json(dashboard))
}
