//! Inbound webhooks from the courier and the payment gateway.
//!
//! Both senders retry on non-2xx, so events this service does not care about
//! are answered with 200 and `{"message": "Evento ignorado"}`.

use axum::{Json, body::Bytes, extract::State};
use serde_json::{Value as JsonValue, json};
use tracing::warn;

use crate::error::AppError;
use crate::mercadopago::PaymentNotification;
use crate::middleware::SpokeWebhookAuth;
use crate::services::{DeliveryOutcome, DeliveryService, PaymentOutcome, PaymentService};
use crate::state::AppState;

fn ignored() -> Json<JsonValue> {
    Json(json!({ "message": "Evento ignorado" }))
}

/// Spoke stop events.
pub async fn spoke(
    State(state): State<AppState>,
    _auth: SpokeWebhookAuth,
    body: Bytes,
) -> Result<Json<JsonValue>, AppError> {
    let outcome = DeliveryService::new(state.orders())
        .handle_event(&body)
        .await?;

    Ok(match outcome {
        DeliveryOutcome::Ignored(_) => ignored(),
        DeliveryOutcome::Applied { order_id, updated } => Json(json!({
            "success": true,
            "order_id": order_id,
            "updated": updated,
        })),
    })
}

/// Mercado Pago payment notifications.
pub async fn mercadopago(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<JsonValue>, AppError> {
    let gateway = state
        .payments()
        .ok_or(AppError::NotConfigured("Mercado Pago não configurado"))?;

    let Ok(notification) = serde_json::from_slice::<PaymentNotification>(&body) else {
        warn!("Malformed payment notification ignored");
        return Ok(ignored());
    };

    let outcome = PaymentService::new(state.orders(), gateway)
        .handle_notification(&notification)
        .await?;

    Ok(match outcome {
        PaymentOutcome::Ignored(_) => ignored(),
        PaymentOutcome::Confirmed { order_id, updated } => Json(json!({
            "success": true,
            "order_id": order_id,
            "updated": updated,
        })),
    })
}
