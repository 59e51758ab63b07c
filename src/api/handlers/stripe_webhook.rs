use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    api::state::AppState,
    errors::ApiError,
    logging::audit_webhook_event,
    services::{
        verify_signature,
        webhook_signature::{SignatureError, STRIPE_SIGNATURE_HEADER},
    },
};

pub const WEBHOOK_PATH: &str = "/api/webhooks/stripe";

/// Event types the storefront acts on; everything else is acknowledged and ignored
const HANDLED_EVENTS: [&str; 4] = [
    "checkout.session.completed",
    "payment_intent.succeeded",
    "payment_intent.payment_failed",
    "charge.refunded",
];

#[derive(Debug, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookAck {
    pub received: bool,
}

/// Handler for Stripe webhook deliveries
///
/// # Endpoint: POST /api/webhooks/stripe
///
/// # Arguments
/// * `state` - Application state holding the signing secret
/// * `headers` - Request headers carrying `Stripe-Signature`
/// * `body` - Raw request bytes; the signature covers them exactly as sent
///
/// # Returns
/// * `Json<WebhookAck>` - `{"received": true}` once the event is verified
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<WebhookAck>, ApiError> {
    let limit = state.config.body_limit_bytes;
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge { limit }
        } else {
            ApiError::InvalidBody(rejection.body_text())
        }
    })?;

    let secret = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or(ApiError::WebhookSecretMissing)?;
    let signature = headers
        .get(STRIPE_SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(SignatureError::MissingHeader)?;

    verify_signature(
        &body,
        signature,
        secret,
        Utc::now().timestamp(),
        state.config.webhook_tolerance_secs,
    )?;

    let event: StripeEvent = serde_json::from_slice(&body)?;
    audit_webhook_event(&event.id, &event.event_type, event.livemode, &event.data);

    if HANDLED_EVENTS.contains(&event.event_type.as_str()) {
        info!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            "Received Stripe webhook event"
        );
    } else {
        debug!(event_id = %event.id, event_type = %event.event_type, "Ignoring unhandled Stripe event");
    }

    Ok(Json(WebhookAck { received: true }))
}
