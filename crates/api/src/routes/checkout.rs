//! Checkout route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};

use tabacaria_core::OrderId;

use crate::error::AppError;
use crate::middleware::RequireUser;
use crate::services::{CheckoutOutcome, CheckoutService};
use crate::state::AppState;

/// Body of `POST /checkout/replace`.
#[derive(Debug, Deserialize)]
pub struct ReplaceRequest {
    pub prior_order_id: OrderId,
    pub cart: JsonValue,
}

fn require_cart_object(cart: &JsonValue) -> Result<(), AppError> {
    if cart.is_object() {
        Ok(())
    } else {
        Err(AppError::BadRequest(
            "o carrinho deve ser um objeto JSON".to_string(),
        ))
    }
}

/// Start checkout for the local cart.
///
/// 201 with the new order, or 409 with the order already awaiting payment.
#[tracing::instrument(skip_all, fields(user_id = %user_id))]
pub async fn initiate(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(cart) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    require_cart_object(&cart)?;

    let outcome = CheckoutService::new(state.orders())
        .initiate_checkout(user_id, &cart)
        .await?;

    Ok(match outcome {
        CheckoutOutcome::Created(order) => (StatusCode::CREATED, Json(order)).into_response(),
        CheckoutOutcome::PendingOrderExists(order) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Você já possui um pedido aguardando pagamento",
                "order": order,
            })),
        )
            .into_response(),
    })
}

/// Replace the order awaiting payment with a new one from the cart.
#[tracing::instrument(skip_all, fields(user_id = %user_id))]
pub async fn replace(
    State(state): State<AppState>,
    RequireUser(user_id): RequireUser,
    body: Result<Json<ReplaceRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    require_cart_object(&request.cart)?;

    let order = CheckoutService::new(state.orders())
        .confirm_replacement(user_id, request.prior_order_id, &request.cart)
        .await?;

    Ok((StatusCode::CREATED, Json(order)).into_response())
}
