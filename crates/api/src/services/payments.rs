//! Payment confirmation from Mercado Pago notifications.
//!
//! Notifications carry only a payment id, so the payment is fetched from the
//! gateway before anything is written. Only an approved payment whose
//! `external_reference` names an order awaiting payment moves that order to
//! paid; repeated notifications for the same payment are no-ops.

use tracing::{debug, info, instrument, warn};

use tabacaria_core::OrderId;

use crate::db::OrderRepository;
use crate::error::AppError;
use crate::mercadopago::{PaymentLookup, PaymentNotification, PaymentStatus};

/// Result of handling a payment notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// Nothing was written.
    Ignored(&'static str),
    /// The payment is approved; `updated` is false if the order was not
    /// awaiting payment.
    Confirmed { order_id: OrderId, updated: bool },
}

/// Parse an `external_reference` into an order id.
fn parse_reference(reference: &str) -> Option<OrderId> {
    let id: i64 = reference.trim().parse().ok()?;
    (id > 0).then_some(OrderId::new(id))
}

/// Payment confirmation service.
pub struct PaymentService<'a> {
    orders: &'a dyn OrderRepository,
    gateway: &'a dyn PaymentLookup,
}

impl<'a> PaymentService<'a> {
    /// Create a new payment service.
    #[must_use]
    pub const fn new(orders: &'a dyn OrderRepository, gateway: &'a dyn PaymentLookup) -> Self {
        Self { orders, gateway }
    }

    /// Handle one webhook notification.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Upstream` if the gateway lookup fails, or
    /// `AppError::Database` if the order update fails.
    #[instrument(skip_all, fields(action = ?notification.action))]
    pub async fn handle_notification(
        &self,
        notification: &PaymentNotification,
    ) -> Result<PaymentOutcome, AppError> {
        if !notification.is_payment() {
            return Ok(ignored("not a payment notification"));
        }
        let Some(payment_id) = notification.payment_id() else {
            return Ok(ignored("missing payment id"));
        };

        let payment = self.gateway.payment(&payment_id).await?;
        if payment.status != PaymentStatus::Approved {
            debug!(payment_id = %payment_id, status = ?payment.status, "Payment not approved yet");
            return Ok(PaymentOutcome::Ignored("payment not approved"));
        }

        let Some(order_id) = payment.external_reference.as_deref().and_then(parse_reference)
        else {
            return Ok(ignored("external_reference is not an order id"));
        };

        // Conditional write: an order cancelled concurrently stays cancelled.
        let updated = self.orders.mark_paid(order_id).await?;
        if !updated {
            match self.orders.get(order_id).await? {
                Some(order) => {
                    debug!(order_id = %order_id, status = %order.status, "Order not awaiting payment");
                }
                None => warn!(order_id = %order_id, "Approved payment for unknown order"),
            }
        }

        if updated {
            info!(
                order_id = %order_id,
                payment_id = %payment_id,
                amount = payment.transaction_amount,
                "Order paid"
            );
        }

        Ok(PaymentOutcome::Confirmed { order_id, updated })
    }
}

fn ignored(reason: &'static str) -> PaymentOutcome {
    warn!(reason, "Payment notification ignored");
    PaymentOutcome::Ignored(reason)
}
