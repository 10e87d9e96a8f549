//! Order status updates from workflow automation (N8N).

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::{Map, Value as JsonValue, json};
use tracing::info;

use tabacaria_core::{DeliveryStatus, OrderId, OrderStatus};

use crate::error::AppError;
use crate::middleware::RequireAutomationToken;
use crate::models::OrderFieldsUpdate;
use crate::state::AppState;

/// Read `order_id` as a positive integer, given as a number or a digit string.
fn order_id(body: &Map<String, JsonValue>) -> Result<OrderId, AppError> {
    let id = match body.get("order_id") {
        Some(JsonValue::Number(n)) => n.as_i64(),
        Some(JsonValue::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    id.filter(|id| *id > 0)
        .map(OrderId::new)
        .ok_or_else(|| AppError::BadRequest("order_id é obrigatório".to_string()))
}

/// Read an optional string field; `null` counts as absent.
fn optional_text(body: &Map<String, JsonValue>, key: &str) -> Result<Option<String>, AppError> {
    match body.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(AppError::BadRequest(format!("{key} deve ser texto"))),
    }
}

/// Parse the update fields of the request body.
fn parse_update(body: &Map<String, JsonValue>) -> Result<OrderFieldsUpdate, AppError> {
    let status = optional_text(body, "status")?
        .map(|label| label.parse::<OrderStatus>())
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("status inválido: {e}")))?;
    let delivery_status = optional_text(body, "delivery_status")?
        .map(|label| label.parse::<DeliveryStatus>())
        .transpose()
        .map_err(|e| AppError::BadRequest(format!("delivery_status inválido: {e}")))?;

    Ok(OrderFieldsUpdate {
        status,
        delivery_status,
        tracking_code: optional_text(body, "tracking_code")?,
        delivery_info: optional_text(body, "delivery_info")?,
    })
}

/// Update status, delivery status, tracking code or delivery info of an order.
#[tracing::instrument(skip_all)]
pub async fn update_order_status(
    State(state): State<AppState>,
    _auth: RequireAutomationToken,
    body: Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<JsonValue>, AppError> {
    let Json(body) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let body = body
        .as_object()
        .ok_or_else(|| AppError::BadRequest("corpo deve ser um objeto JSON".to_string()))?;

    let order_id = order_id(body)?;
    let update = parse_update(body)?;
    if update.is_empty() {
        return Err(AppError::BadRequest(
            "nenhum campo para atualizar".to_string(),
        ));
    }

    let order = state
        .orders()
        .update_fields(order_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pedido {order_id}")))?;

    info!(
        order_id = %order_id,
        status = %order.status,
        delivery_status = %order.delivery_status,
        "Order updated by automation"
    );

    Ok(Json(json!({ "success": true, "order": order })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn object(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_order_id_forms() {
        assert_eq!(
            order_id(&object(json!({"order_id": 42}))).unwrap(),
            OrderId::new(42)
        );
        assert_eq!(
            order_id(&object(json!({"order_id": "42"}))).unwrap(),
            OrderId::new(42)
        );
        assert!(order_id(&object(json!({}))).is_err());
        assert!(order_id(&object(json!({"order_id": 4.5}))).is_err());
        assert!(order_id(&object(json!({"order_id": "abc"}))).is_err());
        assert!(order_id(&object(json!({"order_id": 0}))).is_err());
    }

    #[test]
    fn test_parse_update_labels() {
        let update = parse_update(&object(json!({
            "order_id": 1,
            "status": "Pago",
            "delivery_status": "Em Rota",
            "tracking_code": null
        })))
        .unwrap();

        assert_eq!(update.status, Some(OrderStatus::Paid));
        assert_eq!(update.delivery_status, Some(DeliveryStatus::Dispatched));
        assert_eq!(update.tracking_code, None);
    }

    #[test]
    fn test_parse_update_rejects_unknown_label() {
        let err = parse_update(&object(json!({"status": "Shipped"}))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_only_order_id_is_empty_update() {
        assert!(parse_update(&object(json!({"order_id": 1}))).unwrap().is_empty());
    }
}
