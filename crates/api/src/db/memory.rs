//! In-memory store for tests and local development.
//!
//! Mirrors the behavior of the `PostgreSQL` store closely enough for handler
//! tests: the checkout procedure is emulated (line items, stock decrement,
//! total), replacement is atomic under a single write lock, and every write
//! call is counted so tests can assert that ignored input touched nothing.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use tabacaria_core::{DeliveryStatus, OrderId, OrderStatus, ProductId, UserId, UserRole};

use super::{InsightsRepository, OrderRepository, ProfileRepository, RepositoryError, Store};
use crate::models::{
    ChurnRiskCustomer, CrossSellPair, DeliveryUpdate, Order, OrderFieldsUpdate, ProductStock,
    SoldLine,
};

/// Cart payload accepted by the checkout procedure.
#[derive(Debug, Deserialize)]
struct Cart {
    items: Vec<CartItem>,
}

#[derive(Debug, Deserialize)]
struct CartItem {
    product_id: ProductId,
    quantity: i64,
}

#[derive(Debug, Clone)]
struct StoredProduct {
    name: String,
    price: Decimal,
    stock_quantity: i64,
}

#[derive(Debug, Clone)]
struct StoredLineItem {
    order_id: Option<OrderId>,
    product_id: ProductId,
    quantity: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    orders: BTreeMap<OrderId, Order>,
    line_items: Vec<StoredLineItem>,
    products: BTreeMap<ProductId, StoredProduct>,
    profiles: HashMap<UserId, UserRole>,
    cross_sell: Vec<CrossSellPair>,
    churn_risk: Vec<ChurnRiskCustomer>,
    last_order_id: i64,
    writes: u64,
}

impl State {
    /// Emulates `create_pending_order_from_local_cart`.
    fn create_from_cart(
        &mut self,
        user_id: UserId,
        cart: &JsonValue,
    ) -> Result<Order, RepositoryError> {
        let cart = Cart::deserialize(cart)
            .map_err(|e| RepositoryError::InvalidInput(format!("carrinho inválido: {e}")))?;
        if cart.items.is_empty() {
            return Err(RepositoryError::InvalidInput("carrinho vazio".to_string()));
        }

        // Lines for the same product draw on the same stock.
        let mut requested: BTreeMap<ProductId, i64> = BTreeMap::new();
        let mut total = Decimal::ZERO;
        for item in &cart.items {
            let product = self.products.get(&item.product_id).ok_or_else(|| {
                RepositoryError::InvalidInput(format!("produto {} não encontrado", item.product_id))
            })?;
            if item.quantity <= 0 {
                return Err(RepositoryError::InvalidInput("quantidade inválida".to_string()));
            }

            let wanted = requested.entry(item.product_id).or_default();
            *wanted += item.quantity;
            if product.stock_quantity < *wanted {
                return Err(RepositoryError::InvalidInput(format!(
                    "estoque insuficiente para {}",
                    product.name
                )));
            }
            total += product.price * Decimal::from(item.quantity);
        }

        self.last_order_id += 1;
        let now = Utc::now();
        let order = Order {
            id: OrderId::new(self.last_order_id),
            user_id,
            status: OrderStatus::AwaitingPayment,
            delivery_status: DeliveryStatus::Pending,
            delivery_info: None,
            tracking_code: None,
            total_price: total,
            created_at: now,
        };

        for item in cart.items {
            if let Some(product) = self.products.get_mut(&item.product_id) {
                product.stock_quantity -= item.quantity;
            }
            self.line_items.push(StoredLineItem {
                order_id: Some(order.id),
                product_id: item.product_id,
                quantity: item.quantity,
                created_at: now,
            });
        }

        self.orders.insert(order.id, order.clone());
        Ok(order)
    }
}

/// In-memory implementation of [`Store`].
///
/// Clone-friendly via `Arc`; clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, RepositoryError> {
        self.state
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, RepositoryError> {
        self.state
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".into()))
    }

    /// Seed state without counting it as a write.
    fn seed(&self, f: impl FnOnce(&mut State)) {
        let mut state = match self.state.write() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut state);
    }

    /// Add a product to the catalog.
    #[must_use]
    pub fn with_product(
        self,
        id: ProductId,
        name: impl Into<String>,
        price: Decimal,
        stock_quantity: i64,
    ) -> Self {
        let name = name.into();
        self.seed(|state| {
            state.products.insert(
                id,
                StoredProduct {
                    name,
                    price,
                    stock_quantity,
                },
            );
        });
        self
    }

    /// Add a profile row.
    #[must_use]
    pub fn with_profile(self, user_id: UserId, role: UserRole) -> Self {
        self.seed(|state| {
            state.profiles.insert(user_id, role);
        });
        self
    }

    /// Record units sold at `created_at` without an order row.
    #[must_use]
    pub fn with_sale(self, product_id: ProductId, quantity: i64, created_at: DateTime<Utc>) -> Self {
        self.seed(|state| {
            state.line_items.push(StoredLineItem {
                order_id: None,
                product_id,
                quantity,
                created_at,
            });
        });
        self
    }

    /// Rows returned by the cross-sell aggregation.
    #[must_use]
    pub fn with_cross_sell(self, pairs: Vec<CrossSellPair>) -> Self {
        self.seed(|state| state.cross_sell = pairs);
        self
    }

    /// Rows returned by the churn-risk aggregation.
    #[must_use]
    pub fn with_churn_risk(self, customers: Vec<ChurnRiskCustomer>) -> Self {
        self.seed(|state| state.churn_risk = customers);
        self
    }

    /// Insert an order as-is. Later checkouts get ids above the highest seeded id.
    pub fn insert_order(&self, order: Order) {
        self.seed(|state| {
            state.last_order_id = state.last_order_id.max(order.id.as_i64());
            state.orders.insert(order.id, order);
        });
    }

    /// Snapshot of an order.
    #[must_use]
    pub fn order(&self, id: OrderId) -> Option<Order> {
        self.read().ok()?.orders.get(&id).cloned()
    }

    /// All orders, ordered by id.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.read()
            .map(|state| state.orders.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Current stock of a product.
    #[must_use]
    pub fn stock_of(&self, id: ProductId) -> Option<i64> {
        self.read()
            .ok()?
            .products
            .get(&id)
            .map(|product| product.stock_quantity)
    }

    /// Number of write calls received so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        self.read().map(|state| state.writes).unwrap_or_default()
    }
}

#[async_trait]
impl OrderRepository for InMemoryStore {
    async fn find_awaiting_payment(
        &self,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let state = self.read()?;
        Ok(state
            .orders
            .values()
            .filter(|o| o.user_id == user_id && o.status == OrderStatus::AwaitingPayment)
            .max_by_key(|o| o.created_at)
            .cloned())
    }

    async fn create_from_cart(
        &self,
        user_id: UserId,
        cart: &JsonValue,
    ) -> Result<Order, RepositoryError> {
        let mut state = self.write()?;
        state.writes += 1;
        state.create_from_cart(user_id, cart)
    }

    async fn replace_pending(
        &self,
        user_id: UserId,
        prior: OrderId,
        cart: &JsonValue,
    ) -> Result<Order, RepositoryError> {
        let mut state = self.write()?;
        state.writes += 1;

        match state.orders.get(&prior) {
            Some(o) if o.user_id == user_id && o.status == OrderStatus::AwaitingPayment => {}
            _ => {
                return Err(RepositoryError::Conflict(format!(
                    "order {prior} is not awaiting payment for this user"
                )));
            }
        }

        // Create first so a rejected cart leaves the prior order untouched.
        let order = state.create_from_cart(user_id, cart)?;
        if let Some(prior) = state.orders.get_mut(&prior) {
            prior.status = OrderStatus::Cancelled;
        }
        Ok(order)
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.read()?.orders.get(&id).cloned())
    }

    async fn apply_delivery_update(
        &self,
        id: OrderId,
        update: &DeliveryUpdate,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.write()?;
        state.writes += 1;
        match state.orders.get_mut(&id) {
            Some(order) => {
                OrderFieldsUpdate::from(update).apply_to(order);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_paid(&self, id: OrderId) -> Result<bool, RepositoryError> {
        let mut state = self.write()?;
        state.writes += 1;
        match state.orders.get_mut(&id) {
            Some(order) if order.status == OrderStatus::AwaitingPayment => {
                order.status = OrderStatus::Paid;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_fields(
        &self,
        id: OrderId,
        update: &OrderFieldsUpdate,
    ) -> Result<Option<Order>, RepositoryError> {
        let mut state = self.write()?;
        state.writes += 1;
        Ok(state.orders.get_mut(&id).map(|order| {
            update.apply_to(order);
            order.clone()
        }))
    }

    async fn delete_many(&self, ids: &[OrderId]) -> Result<u64, RepositoryError> {
        let mut state = self.write()?;
        state.writes += 1;
        state
            .line_items
            .retain(|item| item.order_id.is_none_or(|id| !ids.contains(&id)));
        let mut deleted = 0;
        for id in ids {
            if state.orders.remove(id).is_some() {
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}

#[async_trait]
impl InsightsRepository for InMemoryStore {
    async fn cross_sell_pairs(&self) -> Result<Vec<CrossSellPair>, RepositoryError> {
        Ok(self.read()?.cross_sell.clone())
    }

    async fn churn_risk_customers(&self) -> Result<Vec<ChurnRiskCustomer>, RepositoryError> {
        Ok(self.read()?.churn_risk.clone())
    }

    async fn units_sold_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<SoldLine>, RepositoryError> {
        Ok(self
            .read()?
            .line_items
            .iter()
            .filter(|item| item.created_at >= since)
            .map(|item| SoldLine {
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect())
    }

    async fn product_stock(&self, ids: &[ProductId]) -> Result<Vec<ProductStock>, RepositoryError> {
        let state = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| {
                state.products.get(id).map(|product| ProductStock {
                    id: *id,
                    name: product.name.clone(),
                    stock_quantity: product.stock_quantity,
                })
            })
            .collect())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn role_of(&self, user_id: UserId) -> Result<Option<UserRole>, RepositoryError> {
        Ok(self.read()?.profiles.get(&user_id).copied())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.read().map(|_| ())
    }
}
