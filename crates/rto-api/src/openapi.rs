//! # OpenAPI Specification Assembly
//!
//! Assembles all utoipa-documented routes into a single OpenAPI spec,
//! served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the entire API surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "RTO Optimizer API",
        version = "0.1.0",
        description = "NDR proof validation and resolution engine for last-mile e-commerce delivery.\n\nProvides:\n- **Webhooks** for storefront orders, carrier shipments, courier tracking events, and customer message replies\n- **Proof-of-attempt validation** (GPS proximity + call duration) on CUSTOMER_UNAVAILABLE NDRs\n- **Customer NDR resolution** (reschedule, address change, self pickup, dispute, RTO)\n- **Seller challenge console** with external adjudication\n- **Carrier lane scorecards** and **seller dashboards** from streaming aggregation",
        license(name = "AGPL-3.0-or-later")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server"),
    ),
    paths(
        crate::routes::webhooks::register_order,
        crate::routes::webhooks::register_shipment,
        crate::routes::webhooks::ingest_courier_event,
        crate::routes::webhooks::customer_reply,
        crate::routes::ndr::resolve_ndr,
        crate::routes::seller::challenge_ndr,
        crate::routes::seller::adjudicate_challenge,
        crate::routes::seller::seller_dashboard,
        crate::routes::analytics::carrier_scorecard,
    ),
    components(schemas(
        crate::routes::AddressPayload,
        crate::routes::webhooks::OrderWebhook,
        crate::routes::webhooks::OrderResponse,
        crate::routes::webhooks::ShipmentWebhook,
        crate::routes::webhooks::ShipmentResponse,
        crate::routes::webhooks::CourierEventWebhook,
        crate::routes::webhooks::CourierEventResponse,
        crate::routes::webhooks::CustomerReplyWebhook,
        crate::routes::webhooks::CustomerReplyResponse,
        crate::routes::ndr::NdrResolutionRequest,
        crate::routes::ndr::NdrResolutionResponse,
        crate::routes::seller::ChallengeNdrRequest,
        crate::routes::seller::ChallengeResponse,
        crate::routes::seller::AdjudicationRequest,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "webhooks", description = "Inbound storefront, carrier, and messaging webhooks"),
        (name = "ndr", description = "Customer NDR resolution"),
        (name = "seller", description = "Seller challenge console and dashboards"),
        (name = "analytics", description = "Cross-brand carrier analytics"),
    )
)]
pub struct ApiDoc;

/// Router serving the generated spec.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
