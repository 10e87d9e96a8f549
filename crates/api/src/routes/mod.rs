//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness
//! GET  /health/ready                 - Readiness (storage reachable)
//!
//! # Checkout (Supabase user token)
//! POST /checkout                     - Create order from cart, or 409 with the pending one
//! POST /checkout/replace             - Cancel the pending order and create a new one
//!
//! # Webhooks
//! POST /webhooks/spoke               - Courier stop events
//! POST /webhooks/mercadopago         - Payment notifications
//!
//! # Automation (static bearer token)
//! POST /automation/orders/status     - Update order status fields
//!
//! # Admin (profiles.role = 'adm')
//! GET  /insights                     - Dashboard insights
//! POST /admin/orders/bulk-delete     - Delete orders
//! ```

pub mod automation;
pub mod checkout;
pub mod insights;
pub mod orders;
pub mod webhooks;

use std::time::Duration;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(checkout::initiate))
        .route("/replace", post(checkout::replace))
}

/// Create the webhook routes router.
pub fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/spoke", post(webhooks::spoke))
        .route("/mercadopago", post(webhooks::mercadopago))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/orders/bulk-delete", post(orders::bulk_delete))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/checkout", checkout_routes())
        .nest("/webhooks", webhook_routes())
        .route(
            "/automation/orders/status",
            post(automation::update_order_status),
        )
        .route("/insights", get(insights::report))
        .nest("/admin", admin_routes())
}

/// Build the full application: routes, state and middleware stack.
pub fn router(state: AppState) -> Router {
    routes()
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if storage is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
