//! # Customer NDR Resolution Routes
//!
//! The direct resolution API for an open NDR, used by the customer-facing
//! app or a support agent. Parallel to the message-reply channel on the
//! webhook surface; both converge on the same orchestrator.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use rto_core::{OrderId, Timestamp};
use rto_engine::{EngineError, ResolutionAction, ResolutionRequest};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{parse_timestamp, AddressPayload};
use crate::state::AppState;

/// Build the resolution router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/ndr/resolution", post(resolve_ndr))
}

/// A resolution choice for an order with an open NDR.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NdrResolutionRequest {
    /// The order to act on.
    pub order_id: String,
    /// RESCHEDULE, CHANGE_ADDRESS, SELF_PICKUP, DISPUTE, or RTO.
    #[schema(value_type = String, example = "RESCHEDULE")]
    pub action: ResolutionAction,
    /// New attempt date, ISO 8601. Required for RESCHEDULE, in the future.
    #[serde(default)]
    pub reschedule_date: Option<String>,
    /// Corrected address. Required for CHANGE_ADDRESS.
    #[serde(default)]
    pub new_address: Option<AddressPayload>,
    /// Free-form note, recorded on disputes.
    #[serde(default)]
    pub note: Option<String>,
}

impl Validate for NdrResolutionRequest {
    fn validate(&self) -> Result<(), String> {
        match self.action {
            ResolutionAction::Reschedule if self.reschedule_date.is_none() => {
                Err("reschedule_date is required for RESCHEDULE".to_string())
            }
            ResolutionAction::AddressChange => match &self.new_address {
                None => Err("new_address is required for CHANGE_ADDRESS".to_string()),
                Some(address) => address.validate(),
            },
            _ => Ok(()),
        }
    }
}

/// What the resolution produced.
#[derive(Debug, Serialize, ToSchema)]
pub struct NdrResolutionResponse {
    /// The order acted on.
    pub order_id: String,
    /// The action applied.
    pub action: String,
    /// The order's state afterwards.
    pub status: String,
    /// For disputes: whether the 2-hour window was met.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disputed_within_window: Option<bool>,
    /// For disputes: the challenge covering the disputed event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<String>,
}

/// POST /api/ndr/resolution — apply a resolution choice to an open NDR.
#[utoipa::path(
    post,
    path = "/api/ndr/resolution",
    request_body = NdrResolutionRequest,
    responses(
        (status = 200, description = "Resolution applied", body = NdrResolutionResponse),
        (status = 404, description = "Order not found, or no NDR on record for a dispute"),
        (status = 409, description = "A resolution is already in flight or the order is terminal"),
        (status = 422, description = "Invalid payload"),
    ),
    tag = "ndr"
)]
pub(crate) async fn resolve_ndr(
    State(state): State<AppState>,
    body: Result<Json<NdrResolutionRequest>, JsonRejection>,
) -> Result<Json<NdrResolutionResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let order_id = OrderId::new(req.order_id).map_err(EngineError::from)?;

    let reschedule_date = req
        .reschedule_date
        .as_deref()
        .map(|v| parse_timestamp("reschedule_date", v))
        .transpose()?;
    let new_address = req.new_address.map(|a| a.into_fields()).transpose()?;

    let outcome = state.orchestrator.resolve(
        &order_id,
        ResolutionRequest {
            action: req.action,
            reschedule_date,
            new_address,
            note: req.note,
        },
        Timestamp::now(),
    )?;

    Ok(Json(NdrResolutionResponse {
        order_id: outcome.order_id.to_string(),
        action: outcome.action.to_string(),
        status: outcome.order_status.to_string(),
        disputed_within_window: outcome.disputed_within_window,
        challenge_id: outcome.challenge_id.map(|id| id.to_string()),
    }))
}
