//! # Inbound Webhook Routes
//!
//! The system's write surface: storefront order and shipment registration,
//! the carrier tracking feed, and inbound customer message replies. Each
//! handler validates the payload shape, then delegates to the engine
//! services; no business logic lives here.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use rto_core::{BrandId, OrderId, ShipmentId, Timestamp};
use rto_domain::{EventCode, NdrCode, PaymentMode};
use rto_engine::{EngineError, IngestEvent, NewOrder, NewShipment};

use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::routes::{parse_timestamp, AddressPayload};
use crate::state::AppState;

/// Build the webhook router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/webhooks/order", post(register_order))
        .route("/api/webhooks/shipment", post(register_shipment))
        .route("/api/webhooks/courier-event", post(ingest_courier_event))
        .route("/api/webhooks/customer-reply", post(customer_reply))
}

// ─── Request / Response types ────────────────────────────────────────

/// Storefront order registration payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderWebhook {
    /// Storefront order identifier.
    pub order_id: String,
    /// Seller brand identifier.
    pub brand_id: String,
    /// Customer phone or email. Hashed before persistence; never stored raw.
    pub customer_contact: String,
    /// COD or PREPAID.
    #[schema(value_type = String, example = "COD")]
    pub payment_mode: PaymentMode,
    /// Order value in rupees.
    pub amount: f64,
    /// Delivery address.
    pub address: AddressPayload,
    /// Promised delivery date, ISO 8601.
    #[serde(default)]
    pub promised_delivery_date: Option<String>,
}

/// Registered order summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    /// The registered order.
    pub order_id: String,
    /// Resolution state.
    pub status: String,
    /// The minted address version.
    pub address_id: String,
    /// Registration time, ISO 8601.
    pub created_at: String,
}

/// Carrier shipment registration payload.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ShipmentWebhook {
    /// Carrier AWB identifier.
    pub shipment_id: String,
    /// The order this shipment fulfils.
    pub order_id: String,
    /// Carrier name.
    pub carrier: String,
}

/// Registered shipment summary.
#[derive(Debug, Serialize, ToSchema)]
pub struct ShipmentResponse {
    /// The registered shipment.
    pub shipment_id: String,
    /// The order it fulfils.
    pub order_id: String,
    /// Carrier name, normalized lowercase.
    pub carrier: String,
    /// Tracking state.
    pub status: String,
}

/// One carrier tracking event.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CourierEventWebhook {
    /// Carrier AWB identifier.
    pub shipment_id: String,
    /// Tracking code: PICKED_UP, IN_TRANSIT, OUT_FOR_DELIVERY, NDR, DELIVERED.
    #[schema(value_type = String, example = "NDR")]
    pub event_code: EventCode,
    /// NDR reason code, on NDR events. Unrecognized codes map to OTHER.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "CUSTOMER_UNAVAILABLE")]
    pub ndr_code: Option<NdrCode>,
    /// Free-text reason from the carrier feed.
    #[serde(default)]
    pub ndr_reason: Option<String>,
    /// Rider GPS latitude at the claimed attempt.
    #[serde(default)]
    pub gps_latitude: Option<f64>,
    /// Rider GPS longitude at the claimed attempt.
    #[serde(default)]
    pub gps_longitude: Option<f64>,
    /// Rider call duration to the customer, in seconds.
    #[serde(default)]
    pub call_duration_secs: Option<u32>,
    /// Outcome label from the rider's call log, when reported.
    #[serde(default)]
    pub call_outcome: Option<String>,
    /// When the carrier says the event happened, ISO 8601.
    pub timestamp: String,
}

/// Ingestion outcome with the proof verdict.
#[derive(Debug, Serialize, ToSchema)]
pub struct CourierEventResponse {
    /// The minted event identifier.
    pub event_id: String,
    /// Whether proof of attempt was demanded.
    pub proof_required: bool,
    /// Whether the demanded proof held.
    pub proof_validated: bool,
    /// Violations, empty when the proof held or was not demanded.
    pub violations: Vec<String>,
    /// The order's resolution state after the event, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<String>,
}

/// Inbound customer message reply.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CustomerReplyWebhook {
    /// Customer phone or email, matched by hash against pending prompts.
    pub contact: String,
    /// The reply text: a menu digit or keyword.
    pub message: String,
}

/// Outcome of a reply-driven resolution.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerReplyResponse {
    /// The order acted on.
    pub order_id: String,
    /// The action applied.
    pub action: String,
    /// The order's state afterwards.
    pub status: String,
}

// ─── Validation ──────────────────────────────────────────────────────

impl Validate for OrderWebhook {
    fn validate(&self) -> Result<(), String> {
        if self.customer_contact.trim().is_empty() {
            return Err("customer_contact must not be empty".to_string());
        }
        if !self.amount.is_finite() || self.amount < 0.0 {
            return Err("amount must be a non-negative number".to_string());
        }
        self.address.validate()
    }
}

impl Validate for ShipmentWebhook {
    fn validate(&self) -> Result<(), String> {
        if self.carrier.trim().is_empty() {
            return Err("carrier must not be empty".to_string());
        }
        Ok(())
    }
}

impl Validate for CourierEventWebhook {
    fn validate(&self) -> Result<(), String> {
        if self.timestamp.trim().is_empty() {
            return Err("timestamp must not be empty".to_string());
        }
        Ok(())
    }
}

impl Validate for CustomerReplyWebhook {
    fn validate(&self) -> Result<(), String> {
        if self.contact.trim().is_empty() {
            return Err("contact must not be empty".to_string());
        }
        if self.message.trim().is_empty() {
            return Err("message must not be empty".to_string());
        }
        Ok(())
    }
}

// ─── Handlers ────────────────────────────────────────────────────────

/// POST /api/webhooks/order — register a storefront order.
#[utoipa::path(
    post,
    path = "/api/webhooks/order",
    request_body = OrderWebhook,
    responses(
        (status = 201, description = "Order registered", body = OrderResponse),
        (status = 409, description = "Order already registered"),
        (status = 422, description = "Invalid payload"),
    ),
    tag = "webhooks"
)]
pub(crate) async fn register_order(
    State(state): State<AppState>,
    body: Result<Json<OrderWebhook>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderResponse>), AppError> {
    let req = extract_validated_json(body)?;

    let promised = req
        .promised_delivery_date
        .as_deref()
        .map(|v| parse_timestamp("promised_delivery_date", v))
        .transpose()?;

    let order = state.ingestor.register_order(
        NewOrder {
            order_id: OrderId::new(req.order_id).map_err(EngineError::from)?,
            brand_id: BrandId::new(req.brand_id).map_err(EngineError::from)?,
            customer_contact: req.customer_contact,
            payment_mode: req.payment_mode,
            amount: req.amount,
            address: req.address.into_fields()?,
            promised_delivery_date: promised,
        },
        Timestamp::now(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            order_id: order.id.to_string(),
            status: order.status.to_string(),
            address_id: order.address_id.to_string(),
            created_at: order.created_at.to_iso8601(),
        }),
    ))
}

/// POST /api/webhooks/shipment — register a carrier shipment against an order.
#[utoipa::path(
    post,
    path = "/api/webhooks/shipment",
    request_body = ShipmentWebhook,
    responses(
        (status = 201, description = "Shipment registered", body = ShipmentResponse),
        (status = 404, description = "Order not found"),
        (status = 422, description = "Invalid payload"),
    ),
    tag = "webhooks"
)]
pub(crate) async fn register_shipment(
    State(state): State<AppState>,
    body: Result<Json<ShipmentWebhook>, JsonRejection>,
) -> Result<(StatusCode, Json<ShipmentResponse>), AppError> {
    let req = extract_validated_json(body)?;

    let shipment = state.ingestor.register_shipment(
        NewShipment {
            shipment_id: ShipmentId::new(req.shipment_id).map_err(EngineError::from)?,
            order_id: OrderId::new(req.order_id).map_err(EngineError::from)?,
            carrier: req.carrier,
        },
        Timestamp::now(),
    )?;

    Ok((
        StatusCode::CREATED,
        Json(ShipmentResponse {
            shipment_id: shipment.id.to_string(),
            order_id: shipment.order_id.to_string(),
            carrier: shipment.carrier.clone(),
            status: shipment.status.to_string(),
        }),
    ))
}

/// POST /api/webhooks/courier-event — ingest one carrier tracking event.
///
/// Events against unknown shipments are rejected with 404. Missing order
/// or address context degrades to an explicit context violation on the
/// verdict, never a hard failure.
#[utoipa::path(
    post,
    path = "/api/webhooks/courier-event",
    request_body = CourierEventWebhook,
    responses(
        (status = 200, description = "Event ingested with verdict", body = CourierEventResponse),
        (status = 404, description = "Unknown shipment"),
        (status = 422, description = "Invalid payload"),
    ),
    tag = "webhooks"
)]
pub(crate) async fn ingest_courier_event(
    State(state): State<AppState>,
    body: Result<Json<CourierEventWebhook>, JsonRejection>,
) -> Result<Json<CourierEventResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let occurred_at = parse_timestamp("timestamp", &req.timestamp)?;

    let outcome = state.ingestor.ingest_event(
        IngestEvent {
            shipment_id: ShipmentId::new(req.shipment_id).map_err(EngineError::from)?,
            event_code: req.event_code,
            ndr_code: req.ndr_code,
            ndr_reason: req.ndr_reason,
            gps_latitude: req.gps_latitude,
            gps_longitude: req.gps_longitude,
            call_duration_secs: req.call_duration_secs,
            call_outcome: req.call_outcome,
            occurred_at,
        },
        Timestamp::now(),
    )?;

    Ok(Json(CourierEventResponse {
        event_id: outcome.event_id.to_string(),
        proof_required: outcome.proof_required,
        proof_validated: outcome.proof_validated,
        violations: outcome.violations,
        order_status: outcome.order_status.map(|s| s.to_string()),
    }))
}

/// POST /api/webhooks/customer-reply — apply a resolution from a message reply.
#[utoipa::path(
    post,
    path = "/api/webhooks/customer-reply",
    request_body = CustomerReplyWebhook,
    responses(
        (status = 200, description = "Resolution applied", body = CustomerReplyResponse),
        (status = 404, description = "No pending resolution for this contact"),
        (status = 422, description = "Unrecognized reply"),
    ),
    tag = "webhooks"
)]
pub(crate) async fn customer_reply(
    State(state): State<AppState>,
    body: Result<Json<CustomerReplyWebhook>, JsonRejection>,
) -> Result<Json<CustomerReplyResponse>, AppError> {
    let req = extract_validated_json(body)?;

    let outcome =
        state
            .orchestrator
            .resolve_from_reply(&req.contact, &req.message, Timestamp::now())?;

    Ok(Json(CustomerReplyResponse {
        order_id: outcome.order_id.to_string(),
        action: outcome.action.to_string(),
        status: outcome.order_status.to_string(),
    }))
}
