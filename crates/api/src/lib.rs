//! Tabacaria order backend library.
//!
//! This crate provides the HTTP API as a library, allowing the router to be
//! driven from tests with in-memory repositories.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod mercadopago;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
