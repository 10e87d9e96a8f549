//! Database access for the order backend.
//!
//! # Database: hosted `PostgreSQL` (Supabase project)
//!
//! ## Tables
//!
//! - `orders` - Orders with payment and delivery status
//! - `order_items` - Immutable line items with a product name snapshot
//! - `products` / `product_variants` - Catalog and stock
//! - `profiles` - One row per auth user, carries the `role` column
//!
//! ## Stored procedures
//!
//! - `create_pending_order_from_local_cart(jsonb)` - Creates an order, its
//!   line items and decrements stock atomically
//! - `get_cross_sell_pairs()` / `get_churn_risk_customers()` - Precomputed
//!   insight aggregations
//!
//! # Repositories
//!
//! Handlers talk to the database through the [`OrderRepository`],
//! [`InsightsRepository`] and [`ProfileRepository`] traits. [`PgStore`]
//! implements them over a `PgPool`; [`memory::InMemoryStore`] implements them
//! over in-process maps for tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p tabacaria-cli -- migrate
//! ```

pub mod insights;
pub mod memory;
pub mod orders;
pub mod profiles;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tabacaria_core::{OrderId, ProductId, UserId, UserRole};

use crate::models::{
    ChurnRiskCustomer, CrossSellPair, DeliveryUpdate, Order, OrderFieldsUpdate, ProductStock,
    SoldLine,
};

pub use memory::InMemoryStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// The row is not in the state the operation requires.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Input rejected by the database (e.g., a cart the checkout procedure
    /// refuses).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Non-database storage failure (e.g., poisoned in-memory lock).
    #[error("storage error: {0}")]
    Storage(String),
}

/// Order reads and writes.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Most recent order of `user_id` still awaiting payment.
    async fn find_awaiting_payment(&self, user_id: UserId)
    -> Result<Option<Order>, RepositoryError>;

    /// Create an order from a cart payload through the checkout procedure.
    async fn create_from_cart(
        &self,
        user_id: UserId,
        cart: &JsonValue,
    ) -> Result<Order, RepositoryError>;

    /// Cancel `prior` and create a new order from `cart` as one unit.
    ///
    /// Fails with [`RepositoryError::Conflict`] when `prior` is not an order of
    /// `user_id` awaiting payment; nothing is written in that case.
    async fn replace_pending(
        &self,
        user_id: UserId,
        prior: OrderId,
        cart: &JsonValue,
    ) -> Result<Order, RepositoryError>;

    /// Fetch an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Write a courier event projection. Returns `false` if no such order.
    async fn apply_delivery_update(
        &self,
        id: OrderId,
        update: &DeliveryUpdate,
    ) -> Result<bool, RepositoryError>;

    /// Move an order awaiting payment to paid in one conditional write.
    ///
    /// Returns `false` if the order does not exist or is in any other status.
    async fn mark_paid(&self, id: OrderId) -> Result<bool, RepositoryError>;

    /// Write the present fields of `update`. Returns `None` if no such order.
    async fn update_fields(
        &self,
        id: OrderId,
        update: &OrderFieldsUpdate,
    ) -> Result<Option<Order>, RepositoryError>;

    /// Physically delete orders and their line items. Returns orders deleted.
    async fn delete_many(&self, ids: &[OrderId]) -> Result<u64, RepositoryError>;
}

/// Read-only aggregations for the insights handler.
#[async_trait]
pub trait InsightsRepository: Send + Sync {
    async fn cross_sell_pairs(&self) -> Result<Vec<CrossSellPair>, RepositoryError>;

    async fn churn_risk_customers(&self) -> Result<Vec<ChurnRiskCustomer>, RepositoryError>;

    /// Line items of orders created at or after `since`.
    async fn units_sold_since(&self, since: DateTime<Utc>)
    -> Result<Vec<SoldLine>, RepositoryError>;

    /// Current stock of the given products.
    async fn product_stock(&self, ids: &[ProductId]) -> Result<Vec<ProductStock>, RepositoryError>;
}

/// Profile lookups used for authorization.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Role of a user, or `None` if the user has no profile row.
    async fn role_of(&self, user_id: UserId) -> Result<Option<UserRole>, RepositoryError>;
}

/// Everything the HTTP layer needs from storage.
#[async_trait]
pub trait Store: OrderRepository + InsightsRepository + ProfileRepository {
    /// Check that storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
