//! Read-only projections served by the insights handler.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use tabacaria_core::{ProductId, UserId};

/// Two products frequently bought in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossSellPair {
    pub product_a: String,
    pub product_b: String,
    pub times_bought_together: i64,
}

/// A customer whose purchase cadence has lapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChurnRiskCustomer {
    pub user_id: UserId,
    pub full_name: Option<String>,
    pub last_order_at: DateTime<Utc>,
    pub days_since_last_order: i32,
    pub total_spent: Decimal,
}

/// Units of a product sold on one order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoldLine {
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Current stock of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductStock {
    pub id: ProductId,
    pub name: String,
    pub stock_quantity: i64,
}

/// A product projected to run out of stock soon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockRunout {
    pub product_id: ProductId,
    pub name: String,
    pub stock_quantity: i64,
    pub sold_in_window: i64,
    pub daily_rate: f64,
    pub days_remaining: i64,
}

/// Everything `GET /insights` returns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub cross_sell: Vec<CrossSellPair>,
    pub churn_risk: Vec<ChurnRiskCustomer>,
    pub stock_runout: Vec<StockRunout>,
}
