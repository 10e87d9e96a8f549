//! Administrative order route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use tracing::info;

use tabacaria_core::OrderId;

use crate::error::AppError;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Body of `POST /admin/orders/bulk-delete`.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    pub ids: Vec<OrderId>,
}

/// Delete orders and their line items.
#[tracing::instrument(skip_all, fields(admin = %admin))]
pub async fn bulk_delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    body: Result<Json<BulkDeleteRequest>, JsonRejection>,
) -> Result<Json<JsonValue>, AppError> {
    let Json(mut request) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    if request.ids.is_empty() {
        return Err(AppError::BadRequest(
            "informe ao menos um pedido".to_string(),
        ));
    }
    request.ids.sort_unstable();
    request.ids.dedup();

    let deleted = state.orders().delete_many(&request.ids).await?;
    info!(requested = request.ids.len(), deleted, "Orders deleted");

    Ok(Json(json!({ "deleted": deleted })))
}
