//! Order repository for `PostgreSQL`.
//!
//! Checkout goes through the `create_pending_order_from_local_cart` stored
//! procedure, which resolves the buyer from the `request.jwt.claim.sub`
//! setting (the one Supabase's `auth.uid()` reads). Every procedure call runs
//! in a transaction that first sets it with `set_config(..., true)`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::{Postgres, Transaction};
use tracing::{debug, instrument};
use uuid::Uuid;

use tabacaria_core::{OrderId, OrderStatus, UserId};

use super::{OrderRepository, PgStore, RepositoryError};
use crate::models::{DeliveryUpdate, Order, OrderFieldsUpdate};

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: Uuid,
    status: String,
    delivery_status: String,
    delivery_info: Option<String>,
    tracking_code: Option<String>,
    total_price: Decimal,
    created_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;
        let delivery_status = row
            .delivery_status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("order {}: {e}", row.id)))?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            status,
            delivery_status,
            delivery_info: row.delivery_info,
            tracking_code: row.tracking_code,
            total_price: row.total_price,
            created_at: row.created_at,
        })
    }
}

/// Make the request user `user_id` for the rest of the transaction.
async fn set_request_user(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
) -> Result<(), RepositoryError> {
    let claims = serde_json::json!({ "sub": user_id, "role": "authenticated" }).to_string();
    sqlx::query(
        r"
        SELECT set_config('request.jwt.claim.sub', $1, true),
               set_config('request.jwt.claims', $2, true)
        ",
    )
    .bind(user_id.to_string())
    .bind(claims)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Whether a SQLSTATE raised by the checkout procedure blames the cart.
///
/// `RAISE EXCEPTION` in plpgsql surfaces as `P0001` with a message meant for
/// the buyer (empty cart, insufficient stock). Class `22` (data exception)
/// comes from cart values that do not fit a cast, such as a fractional or
/// out-of-range quantity.
fn is_cart_rejection(sqlstate: &str) -> bool {
    sqlstate == "P0001" || sqlstate.starts_with("22")
}

/// Map errors raised by the checkout procedure.
fn procedure_error(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.code().is_some_and(|code| is_cart_rejection(&code)) => {
            RepositoryError::InvalidInput(db.message().to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

/// Call the checkout procedure inside `tx`.
async fn create_in_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: UserId,
    cart: &JsonValue,
) -> Result<Order, RepositoryError> {
    set_request_user(tx, user_id).await?;

    let row = sqlx::query_as::<_, OrderRow>(
        r"
        SELECT id, user_id, status, delivery_status, delivery_info, tracking_code,
               total_price, created_at
        FROM public.create_pending_order_from_local_cart($1)
        ",
    )
    .bind(cart)
    .fetch_one(&mut **tx)
    .await
    .map_err(procedure_error)?;

    row.try_into()
}

// =============================================================================
// Repository
// =============================================================================

#[async_trait]
impl OrderRepository for PgStore {
    #[instrument(skip(self))]
    async fn find_awaiting_payment(
        &self,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, status, delivery_status, delivery_info, tracking_code,
                   total_price, created_at
            FROM public.orders
            WHERE user_id = $1 AND status = $2
            ORDER BY created_at DESC
            LIMIT 1
            ",
        )
        .bind(user_id)
        .bind(OrderStatus::AwaitingPayment)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self, cart))]
    async fn create_from_cart(
        &self,
        user_id: UserId,
        cart: &JsonValue,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool().begin().await?;
        let order = create_in_tx(&mut tx, user_id, cart).await?;
        tx.commit().await?;

        debug!(order_id = %order.id, "Order created by checkout procedure");
        Ok(order)
    }

    #[instrument(skip(self, cart))]
    async fn replace_pending(
        &self,
        user_id: UserId,
        prior: OrderId,
        cart: &JsonValue,
    ) -> Result<Order, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let cancelled = sqlx::query(
            r"
            UPDATE public.orders
            SET status = $1
            WHERE id = $2 AND user_id = $3 AND status = $4
            ",
        )
        .bind(OrderStatus::Cancelled)
        .bind(prior)
        .bind(user_id)
        .bind(OrderStatus::AwaitingPayment)
        .execute(&mut *tx)
        .await?;

        // Dropping `tx` without commit rolls back.
        if cancelled.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "order {prior} is not awaiting payment for this user"
            )));
        }

        let order = create_in_tx(&mut tx, user_id, cart).await?;
        tx.commit().await?;

        debug!(prior = %prior, order_id = %order.id, "Pending order replaced");
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, status, delivery_status, delivery_info, tracking_code,
                   total_price, created_at
            FROM public.orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self))]
    async fn apply_delivery_update(
        &self,
        id: OrderId,
        update: &DeliveryUpdate,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE public.orders
            SET delivery_status = $1,
                delivery_info = $2,
                status = COALESCE($3, status)
            WHERE id = $4
            ",
        )
        .bind(update.delivery_status)
        .bind(&update.delivery_info)
        .bind(update.order_status)
        .bind(id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn mark_paid(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE public.orders
            SET status = $1
            WHERE id = $2 AND status = $3
            ",
        )
        .bind(OrderStatus::Paid)
        .bind(id)
        .bind(OrderStatus::AwaitingPayment)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn update_fields(
        &self,
        id: OrderId,
        update: &OrderFieldsUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE public.orders
            SET status = COALESCE($1, status),
                delivery_status = COALESCE($2, delivery_status),
                tracking_code = COALESCE($3, tracking_code),
                delivery_info = COALESCE($4, delivery_info)
            WHERE id = $5
            RETURNING id, user_id, status, delivery_status, delivery_info, tracking_code,
                      total_price, created_at
            ",
        )
        .bind(update.status)
        .bind(update.delivery_status)
        .bind(update.tracking_code.as_deref())
        .bind(update.delivery_info.as_deref())
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    #[instrument(skip(self), fields(count = ids.len()))]
    async fn delete_many(&self, ids: &[OrderId]) -> Result<u64, RepositoryError> {
        let ids: Vec<i64> = ids.iter().map(OrderId::as_i64).collect();
        let mut tx = self.pool().begin().await?;

        sqlx::query("DELETE FROM public.order_items WHERE order_id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM public.orders WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_rejections_are_client_errors() {
        assert!(is_cart_rejection("P0001"));
        // invalid_text_representation: "abc"::BIGINT, "2.5"::INT
        assert!(is_cart_rejection("22P02"));
        // numeric_value_out_of_range: quantity beyond INT
        assert!(is_cart_rejection("22003"));
    }

    #[test]
    fn test_server_failures_stay_database_errors() {
        assert!(!is_cart_rejection("40001"));
        assert!(!is_cart_rejection("23505"));
        assert!(!is_cart_rejection("57014"));
    }
}
