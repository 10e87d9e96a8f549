//! Mercado Pago wire types.
//!
//! Only the fields the payment webhook reads are modelled.
//!
//! See: <https://www.mercadopago.com.br/developers/en/docs/your-integrations/notifications/webhooks>

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Body of a webhook notification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentNotification {
    /// Topic, `payment` for payment events.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Event name, e.g. `payment.updated`.
    pub action: Option<String>,
    pub data: Option<NotificationData>,
}

/// Resource reference inside a notification.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationData {
    /// Sent as a string by the webhook and as a number by older IPN payloads.
    pub id: Option<JsonValue>,
}

impl PaymentNotification {
    /// Whether this notification is about a payment.
    #[must_use]
    pub fn is_payment(&self) -> bool {
        self.kind.as_deref() == Some("payment")
    }

    /// The payment id, if present and non-empty.
    #[must_use]
    pub fn payment_id(&self) -> Option<String> {
        match self.data.as_ref()?.id.as_ref()? {
            JsonValue::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
            JsonValue::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }
}

/// Payment status as reported by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Approved,
    Authorized,
    InProcess,
    InMediation,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    #[serde(other)]
    Unknown,
}

/// A payment resource (`GET /v1/payments/{id}`).
#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub id: i64,
    pub status: PaymentStatus,
    /// Set by checkout to the order id.
    pub external_reference: Option<String>,
    pub transaction_amount: Option<f64>,
}
