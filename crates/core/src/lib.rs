//! Tabacaria Core - Shared domain types.
//!
//! This crate provides the types shared by every Tabacaria component:
//! - `api` - HTTP handlers for checkout, courier/payment webhooks, insights
//! - `cli` - Command-line tools for migrations and reports
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. Database encoding is available behind the `postgres`
//! feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, order/delivery statuses and roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
