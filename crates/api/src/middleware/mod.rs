//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first, see [`crate::routes::router`])
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span with `request_id` field)
//! 3. Request ID (read or generate `x-request-id`)
//! 4. CORS (any origin, answers preflight)
//!
//! Authentication is per handler, through the extractors in [`auth`].

pub mod auth;
pub mod request_id;

pub use auth::{RequireAdmin, RequireAutomationToken, RequireUser, SpokeWebhookAuth};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
