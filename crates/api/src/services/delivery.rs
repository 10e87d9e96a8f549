//! Courier (Spoke) event handling.
//!
//! Spoke posts stop lifecycle events for every route it runs, including stops
//! that belong to other systems. Events are matched to orders through
//! `data.external_id` (`ORDER-<id>`); anything that does not match is
//! accepted and dropped without touching the database.

use serde::Deserialize;
use tracing::{info, instrument, warn};

use tabacaria_core::{DeliveryStatus, OrderId, OrderStatus};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::DeliveryUpdate;

/// Prefix Spoke stops carry in `external_id` when created for an order.
pub const EXTERNAL_ID_PREFIX: &str = "ORDER-";

pub const MSG_ALLOCATED: &str = "Motorista designado para a entrega.";
pub const MSG_OUT_FOR_DELIVERY: &str = "Pedido saiu para entrega.";
pub const MSG_COMPLETED: &str = "Pedido entregue com sucesso.";
pub const MSG_ATTEMPTED: &str = "Tentativa de entrega sem sucesso.";
pub const MSG_OTHER: &str = "Atualização recebida do entregador.";

/// A courier webhook payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpokeEvent {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub data: SpokeEventData,
}

/// The stop a courier event refers to.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpokeEventData {
    pub external_id: Option<String>,
    pub status: Option<String>,
    pub last_update_message: Option<String>,
}

/// Why an event was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Body was not a JSON event object.
    MalformedBody,
    /// No `data.external_id`.
    MissingExternalId,
    /// `external_id` is not `ORDER-<positive integer>`.
    ForeignExternalId,
}

impl IgnoreReason {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedBody => "malformed body",
            Self::MissingExternalId => "missing external_id",
            Self::ForeignExternalId => "external_id is not an order reference",
        }
    }
}

/// Result of handling one courier event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Nothing was written.
    Ignored(IgnoreReason),
    /// The update was applied; `updated` is false if the order does not exist.
    Applied { order_id: OrderId, updated: bool },
}

/// Parse `ORDER-<positive integer>` into an order id.
#[must_use]
pub fn parse_external_id(external_id: &str) -> Option<OrderId> {
    let digits = external_id.strip_prefix(EXTERNAL_ID_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id: i64 = digits.parse().ok()?;
    (id > 0).then_some(OrderId::new(id))
}

/// Map a courier event to the order fields it sets.
///
/// A completed stop closes the order; no other event changes the order status.
#[must_use]
pub fn map_event(event_type: &str, data: &SpokeEventData) -> DeliveryUpdate {
    let message_or = |fallback: &str| {
        data.last_update_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    };

    if event_type == "stop.completed" || data.status.as_deref() == Some("completed") {
        return DeliveryUpdate {
            delivery_status: DeliveryStatus::Delivered,
            delivery_info: MSG_COMPLETED.to_string(),
            order_status: Some(OrderStatus::Finished),
        };
    }

    let (delivery_status, delivery_info) = match event_type {
        "stop.allocated" => (DeliveryStatus::AwaitingPickup, MSG_ALLOCATED.to_string()),
        "stop.out_for_delivery" => (DeliveryStatus::Dispatched, MSG_OUT_FOR_DELIVERY.to_string()),
        "stop.attempted_delivery" => (DeliveryStatus::Attempted, message_or(MSG_ATTEMPTED)),
        _ => (DeliveryStatus::Pending, message_or(MSG_OTHER)),
    };

    DeliveryUpdate {
        delivery_status,
        delivery_info,
        order_status: None,
    }
}

/// Courier event service.
pub struct DeliveryService<'a> {
    orders: &'a dyn OrderRepository,
}

impl<'a> DeliveryService<'a> {
    /// Create a new delivery service.
    #[must_use]
    pub const fn new(orders: &'a dyn OrderRepository) -> Self {
        Self { orders }
    }

    /// Handle a raw webhook body.
    ///
    /// Applying the same event twice leaves the order in the same state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the order update fails.
    #[instrument(skip_all)]
    pub async fn handle_event(&self, body: &[u8]) -> Result<DeliveryOutcome, RepositoryError> {
        let Ok(event) = serde_json::from_slice::<SpokeEvent>(body) else {
            return Ok(ignore(IgnoreReason::MalformedBody, None));
        };

        let Some(external_id) = event.data.external_id.as_deref() else {
            return Ok(ignore(IgnoreReason::MissingExternalId, Some(event.event_type.as_str())));
        };

        let Some(order_id) = parse_external_id(external_id) else {
            return Ok(ignore(IgnoreReason::ForeignExternalId, Some(event.event_type.as_str())));
        };

        let update = map_event(&event.event_type, &event.data);
        let updated = self.orders.apply_delivery_update(order_id, &update).await?;

        if updated {
            info!(
                order_id = %order_id,
                event_type = %event.event_type,
                delivery_status = %update.delivery_status,
                "Delivery status updated"
            );
        } else {
            warn!(order_id = %order_id, event_type = %event.event_type, "Courier event for unknown order");
        }

        Ok(DeliveryOutcome::Applied { order_id, updated })
    }
}

fn ignore(reason: IgnoreReason, event_type: Option<&str>) -> DeliveryOutcome {
    warn!(reason = reason.as_str(), event_type, "Courier event ignored");
    DeliveryOutcome::Ignored(reason)
}
