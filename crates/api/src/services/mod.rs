//! Business logic services for the API.
//!
//! # Services
//!
//! - `auth` - Bearer token resolution and admin role checks
//! - `checkout` - Pending-order coordination around the checkout procedure
//! - `delivery` - Courier (Spoke) event mapping and application
//! - `insights` - Dashboard aggregations and the stock runout projection
//! - `payments` - Mercado Pago payment confirmation

pub mod auth;
pub mod checkout;
pub mod delivery;
pub mod insights;
pub mod payments;

pub use auth::{AuthError, AuthProvider, StaticAuth, SupabaseAuth};
pub use checkout::{CheckoutOutcome, CheckoutService};
pub use delivery::{DeliveryOutcome, DeliveryService};
pub use insights::{InsightsService, project_stock_runout};
pub use payments::{PaymentOutcome, PaymentService};
