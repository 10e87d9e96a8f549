//! Checkout coordination.
//!
//! A user may hold at most one order awaiting payment. Checkout never creates
//! a second one on its own: it hands the existing order back and waits for an
//! explicit replacement request, which cancels the old order and creates the
//! new one in a single transaction.

use serde_json::Value as JsonValue;
use tracing::{info, instrument, warn};

use tabacaria_core::{OrderId, UserId};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::Order;

/// Result of a checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// A new order was created.
    Created(Order),
    /// The user already has this order awaiting payment; nothing was created.
    PendingOrderExists(Order),
}

/// Checkout service.
pub struct CheckoutService<'a> {
    orders: &'a dyn OrderRepository,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub const fn new(orders: &'a dyn OrderRepository) -> Self {
        Self { orders }
    }

    /// Create an order from `cart` unless the user already has one pending.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the lookup or the checkout procedure fails.
    #[instrument(skip(self, cart), fields(user_id = %user_id))]
    pub async fn initiate_checkout(
        &self,
        user_id: UserId,
        cart: &JsonValue,
    ) -> Result<CheckoutOutcome, RepositoryError> {
        if let Some(pending) = self.orders.find_awaiting_payment(user_id).await? {
            warn!(order_id = %pending.id, "User already has an order awaiting payment");
            return Ok(CheckoutOutcome::PendingOrderExists(pending));
        }

        let order = self.orders.create_from_cart(user_id, cart).await?;
        info!(order_id = %order.id, "Order created");
        Ok(CheckoutOutcome::Created(order))
    }

    /// Cancel `prior` and create a new order from `cart`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if `prior` is no longer awaiting
    /// payment for this user, or any other `RepositoryError` from the write.
    #[instrument(skip(self, cart), fields(user_id = %user_id, prior = %prior))]
    pub async fn confirm_replacement(
        &self,
        user_id: UserId,
        prior: OrderId,
        cart: &JsonValue,
    ) -> Result<Order, RepositoryError> {
        let order = self.orders.replace_pending(user_id, prior, cart).await?;
        info!(order_id = %order.id, "Pending order replaced");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;
    use rust_decimal::Decimal;
    use serde_json::json;
    use tabacaria_core::{OrderStatus, ProductId};
    use uuid::Uuid;

    fn store() -> InMemoryStore {
        InMemoryStore::new().with_product(ProductId::new(7), "Seda King Size", Decimal::new(890, 2), 50)
    }

    fn cart() -> JsonValue {
        json!({"items": [{"product_id": 7, "quantity": 2}]})
    }

    #[tokio::test]
    async fn test_creates_exactly_one_order_when_none_pending() {
        let store = store();
        let user = UserId::new(Uuid::new_v4());

        let outcome = CheckoutService::new(&store)
            .initiate_checkout(user, &cart())
            .await
            .unwrap();

        let CheckoutOutcome::Created(order) = outcome else {
            panic!("expected a created order");
        };
        assert_eq!(order.status, OrderStatus::AwaitingPayment);
        assert_eq!(store.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_never_creates_second_pending_order() {
        let store = store();
        let user = UserId::new(Uuid::new_v4());
        let service = CheckoutService::new(&store);

        service.initiate_checkout(user, &cart()).await.unwrap();
        let outcome = service.initiate_checkout(user, &cart()).await.unwrap();

        assert!(matches!(outcome, CheckoutOutcome::PendingOrderExists(_)));
        assert_eq!(store.orders().len(), 1);
        assert_eq!(store.stock_of(ProductId::new(7)), Some(48));
    }

    #[tokio::test]
    async fn test_pending_orders_are_per_user() {
        let store = store();
        let service = CheckoutService::new(&store);

        service
            .initiate_checkout(UserId::new(Uuid::new_v4()), &cart())
            .await
            .unwrap();
        let outcome = service
            .initiate_checkout(UserId::new(Uuid::new_v4()), &cart())
            .await
            .unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Created(_)));
    }

    #[tokio::test]
    async fn test_confirm_replacement_cancels_prior() {
        let store = store();
        let user = UserId::new(Uuid::new_v4());
        let service = CheckoutService::new(&store);

        let CheckoutOutcome::Created(prior) = service.initiate_checkout(user, &cart()).await.unwrap()
        else {
            panic!("expected a created order");
        };
        let replacement = service
            .confirm_replacement(user, prior.id, &cart())
            .await
            .unwrap();

        assert_ne!(replacement.id, prior.id);
        assert_eq!(store.order(prior.id).unwrap().status, OrderStatus::Cancelled);
        assert_eq!(
            store.order(replacement.id).unwrap().status,
            OrderStatus::AwaitingPayment
        );
    }

    #[tokio::test]
    async fn test_confirm_replacement_conflicts_when_prior_not_pending() {
        let store = store();
        let user = UserId::new(Uuid::new_v4());
        let other = UserId::new(Uuid::new_v4());
        let service = CheckoutService::new(&store);

        let CheckoutOutcome::Created(prior) = service.initiate_checkout(user, &cart()).await.unwrap()
        else {
            panic!("expected a created order");
        };

        let err = service
            .confirm_replacement(other, prior.id, &cart())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        assert_eq!(store.orders().len(), 1);
    }
}
