//! Mercado Pago integration for payment confirmation.
//!
//! This module provides:
//! - [`MercadoPagoClient`] for fetching payment resources
//! - [`PaymentLookup`], the seam the payment webhook depends on
//! - Notification and payment wire types
//!
//! # Flow
//!
//! 1. Mercado Pago posts a notification carrying only the payment id
//! 2. The webhook fetches the payment with the seller's access token
//! 3. An approved payment moves the order named by `external_reference` to paid

mod client;
mod error;
mod types;

pub use client::{MercadoPagoClient, PaymentLookup};
pub use error::MercadoPagoError;
pub use types::{NotificationData, Payment, PaymentNotification, PaymentStatus};
