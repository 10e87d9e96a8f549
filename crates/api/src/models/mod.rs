//! Domain models for the order backend.
//!
//! Database row types live next to their queries in [`crate::db`]; the types
//! here are what services and handlers pass around and serialize.

pub mod insights;
pub mod order;

pub use insights::{
    ChurnRiskCustomer, CrossSellPair, InsightsReport, ProductStock, SoldLine, StockRunout,
};
pub use order::{DeliveryUpdate, Order, OrderFieldsUpdate};
