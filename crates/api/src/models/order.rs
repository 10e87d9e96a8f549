//! Order model and the partial updates applied to it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tabacaria_core::{DeliveryStatus, OrderId, OrderStatus, UserId};

/// An order as stored in `public.orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub delivery_status: DeliveryStatus,
    /// Free-text message from the courier or the automation flow.
    pub delivery_info: Option<String>,
    pub tracking_code: Option<String>,
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Projection of a courier event onto an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryUpdate {
    pub delivery_status: DeliveryStatus,
    pub delivery_info: String,
    /// Set only when the event also closes the order.
    pub order_status: Option<OrderStatus>,
}

/// Field-level order update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFieldsUpdate {
    pub status: Option<OrderStatus>,
    pub delivery_status: Option<DeliveryStatus>,
    pub tracking_code: Option<String>,
    pub delivery_info: Option<String>,
}

impl OrderFieldsUpdate {
    /// Update that only moves the order to `status`.
    #[must_use]
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether applying this update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.delivery_status.is_none()
            && self.tracking_code.is_none()
            && self.delivery_info.is_none()
    }

    /// Apply the present fields to an order in place.
    pub fn apply_to(&self, order: &mut Order) {
        if let Some(status) = self.status {
            order.status = status;
        }
        if let Some(delivery_status) = self.delivery_status {
            order.delivery_status = delivery_status;
        }
        if let Some(tracking_code) = &self.tracking_code {
            order.tracking_code = Some(tracking_code.clone());
        }
        if let Some(delivery_info) = &self.delivery_info {
            order.delivery_info = Some(delivery_info.clone());
        }
    }
}

impl From<&DeliveryUpdate> for OrderFieldsUpdate {
    fn from(update: &DeliveryUpdate) -> Self {
        Self {
            status: update.order_status,
            delivery_status: Some(update.delivery_status),
            tracking_code: None,
            delivery_info: Some(update.delivery_info.clone()),
        }
    }
}
