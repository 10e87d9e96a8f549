//! Courier and payment webhooks.

use serde_json::json;

use tabacaria_api::db::InMemoryStore;
use tabacaria_api::mercadopago::{Payment, PaymentStatus};
use tabacaria_core::{DeliveryStatus, OrderId, OrderStatus};
use tabacaria_integration_tests::{FixedGateway, SPOKE_TOKEN, TestApp, customer, order};

fn store_with_order(id: i64, status: OrderStatus) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert_order(order(id, customer(), status));
    store
}

// =============================================================================
// Spoke
// =============================================================================

#[tokio::test]
async fn test_stop_allocated_moves_order_to_awaiting_pickup() {
    let app = TestApp::new(store_with_order(42, OrderStatus::Paid));

    let response = app
        .post_json(
            "/webhooks/spoke",
            None,
            &json!({
                "event_type": "stop.allocated",
                "data": {"external_id": "ORDER-42", "status": "allocated"}
            }),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json["success"], true);
    assert_eq!(response.json["order_id"], 42);

    let order = app.store.order(OrderId::new(42)).unwrap_or_else(|| panic!("order 42"));
    assert_eq!(order.delivery_status, DeliveryStatus::AwaitingPickup);
    assert_eq!(
        order.delivery_info.as_deref(),
        Some("Motorista designado para a entrega.")
    );
    assert_eq!(order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn test_stop_completed_finishes_order() {
    let app = TestApp::new(store_with_order(42, OrderStatus::Paid));

    let response = app
        .post_json(
            "/webhooks/spoke",
            None,
            &json!({
                "event_type": "stop.completed",
                "data": {"external_id": "ORDER-42"}
            }),
        )
        .await;

    assert_eq!(response.status, 200);
    let order = app.store.order(OrderId::new(42)).unwrap_or_else(|| panic!("order 42"));
    assert_eq!(order.delivery_status, DeliveryStatus::Delivered);
    assert_eq!(order.status, OrderStatus::Finished);
}

#[tokio::test]
async fn test_foreign_external_ids_are_ignored_without_writes() {
    let app = TestApp::new(store_with_order(42, OrderStatus::Paid));

    for external_id in ["ORDER-abc", "ORDER-", "ORDER-0", "ORDER-4 2", "PEDIDO-42", "42"] {
        let response = app
            .post_json(
                "/webhooks/spoke",
                None,
                &json!({
                    "event_type": "stop.allocated",
                    "data": {"external_id": external_id}
                }),
            )
            .await;

        assert_eq!(response.status, 200, "{external_id}");
        assert_eq!(response.json["message"], "Evento ignorado");
    }

    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn test_malformed_courier_body_is_ignored() {
    let app = TestApp::new(store_with_order(42, OrderStatus::Paid));

    let response = app.post_raw("/webhooks/spoke", None, "not json").await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json["message"], "Evento ignorado");
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn test_replayed_event_is_idempotent() {
    let app = TestApp::new(store_with_order(42, OrderStatus::Paid));
    let event = json!({
        "event_type": "stop.out_for_delivery",
        "data": {"external_id": "ORDER-42"}
    });

    app.post_json("/webhooks/spoke", None, &event).await;
    let first = app.store.order(OrderId::new(42));
    let response = app.post_json("/webhooks/spoke", None, &event).await;

    assert_eq!(response.status, 200);
    assert_eq!(app.store.order(OrderId::new(42)), first);
    assert_eq!(
        first.map(|o| o.delivery_status),
        Some(DeliveryStatus::Dispatched)
    );
}

#[tokio::test]
async fn test_unknown_order_reports_not_updated() {
    let app = TestApp::new(InMemoryStore::new());

    let response = app
        .post_json(
            "/webhooks/spoke",
            None,
            &json!({"event_type": "stop.allocated", "data": {"external_id": "ORDER-999"}}),
        )
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json["updated"], false);
}

#[tokio::test]
async fn test_courier_token_enforced_when_configured() {
    let app = TestApp::builder(store_with_order(42, OrderStatus::Paid))
        .with_spoke_token()
        .build();
    let event = json!({"event_type": "stop.allocated", "data": {"external_id": "ORDER-42"}});

    let missing = app.post_json("/webhooks/spoke", None, &event).await;
    let wrong = app.post_json("/webhooks/spoke", Some("nope"), &event).await;
    assert_eq!(missing.status, 401);
    assert_eq!(wrong.status, 401);
    assert_eq!(app.store.write_count(), 0);

    let ok = app.post_json("/webhooks/spoke", Some(SPOKE_TOKEN), &event).await;
    assert_eq!(ok.status, 200);
    assert_eq!(ok.json["success"], true);
}

// =============================================================================
// Mercado Pago
// =============================================================================

fn approved(id: i64, reference: &str) -> Payment {
    Payment {
        id,
        status: PaymentStatus::Approved,
        external_reference: Some(reference.to_string()),
        transaction_amount: Some(50.0),
    }
}

fn notification(payment_id: i64) -> serde_json::Value {
    json!({"type": "payment", "action": "payment.updated", "data": {"id": payment_id.to_string()}})
}

#[tokio::test]
async fn test_approved_payment_marks_order_paid() {
    let app = TestApp::builder(store_with_order(42, OrderStatus::AwaitingPayment))
        .with_gateway(FixedGateway::default().with_payment(approved(900, "42")))
        .build();

    let response = app
        .post_json("/webhooks/mercadopago", None, &notification(900))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json["updated"], true);
    assert_eq!(
        app.store.order(OrderId::new(42)).map(|o| o.status),
        Some(OrderStatus::Paid)
    );
}

#[tokio::test]
async fn test_approved_payment_does_not_reopen_cancelled_order() {
    let app = TestApp::builder(store_with_order(42, OrderStatus::Cancelled))
        .with_gateway(FixedGateway::default().with_payment(approved(900, "42")))
        .build();

    let response = app
        .post_json("/webhooks/mercadopago", None, &notification(900))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json["updated"], false);
    assert_eq!(
        app.store.order(OrderId::new(42)).map(|o| o.status),
        Some(OrderStatus::Cancelled)
    );
}

#[tokio::test]
async fn test_pending_payment_is_ignored() {
    let mut payment = approved(901, "42");
    payment.status = PaymentStatus::Pending;
    let app = TestApp::builder(store_with_order(42, OrderStatus::AwaitingPayment))
        .with_gateway(FixedGateway::default().with_payment(payment))
        .build();

    let response = app
        .post_json("/webhooks/mercadopago", None, &notification(901))
        .await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json["message"], "Evento ignorado");
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn test_unknown_payment_is_bad_gateway() {
    let app = TestApp::builder(InMemoryStore::new())
        .with_gateway(FixedGateway::default())
        .build();

    let response = app
        .post_json("/webhooks/mercadopago", None, &notification(404))
        .await;

    assert_eq!(response.status, 502);
}

#[tokio::test]
async fn test_payment_webhook_without_configuration() {
    let app = TestApp::new(InMemoryStore::new());

    let response = app
        .post_json("/webhooks/mercadopago", None, &notification(900))
        .await;

    assert_eq!(response.status, 500);
    assert_eq!(response.json["error"], "Mercado Pago não configurado");
}
