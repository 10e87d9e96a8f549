//! Checkout flow through the HTTP surface.

use rust_decimal::Decimal;
use serde_json::json;

use tabacaria_api::db::InMemoryStore;
use tabacaria_core::{OrderId, OrderStatus, ProductId};
use tabacaria_integration_tests::{
    CUSTOMER_TOKEN, OTHER_CUSTOMER_TOKEN, TestApp, customer, order,
};

fn catalog() -> InMemoryStore {
    InMemoryStore::new()
        .with_product(ProductId::new(1), "Essência Menta", Decimal::new(1250, 2), 10)
        .with_product(ProductId::new(2), "Carvão de Coco", Decimal::new(3000, 2), 1)
}

fn cart() -> serde_json::Value {
    json!({"items": [{"product_id": 1, "quantity": 2}]})
}

// =============================================================================
// Initiate
// =============================================================================

#[tokio::test]
async fn test_checkout_creates_order() {
    let app = TestApp::new(catalog());

    let response = app.post_json("/checkout", Some(CUSTOMER_TOKEN), &cart()).await;

    assert_eq!(response.status, 201);
    assert_eq!(response.json["status"], "Aguardando Pagamento");
    assert_eq!(response.json["delivery_status"], "Pendente");
    assert_eq!(response.json["user_id"], customer().to_string());

    let orders = app.store.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders.first().map(|o| o.total_price), Some(Decimal::new(2500, 2)));
    assert_eq!(app.store.stock_of(ProductId::new(1)), Some(8));
}

#[tokio::test]
async fn test_checkout_with_pending_order_returns_conflict() {
    let store = catalog();
    store.insert_order(order(7, customer(), OrderStatus::AwaitingPayment));
    let app = TestApp::new(store);

    let response = app.post_json("/checkout", Some(CUSTOMER_TOKEN), &cart()).await;

    assert_eq!(response.status, 409);
    assert_eq!(
        response.json["error"],
        "Você já possui um pedido aguardando pagamento"
    );
    assert_eq!(response.json["order"]["id"], 7);
    assert_eq!(app.store.orders().len(), 1);
    assert_eq!(app.store.stock_of(ProductId::new(1)), Some(10));
}

#[tokio::test]
async fn test_pending_order_of_another_user_does_not_block() {
    let store = catalog();
    store.insert_order(order(7, customer(), OrderStatus::AwaitingPayment));
    let app = TestApp::new(store);

    let response = app
        .post_json("/checkout", Some(OTHER_CUSTOMER_TOKEN), &cart())
        .await;

    assert_eq!(response.status, 201);
    assert_eq!(response.json["id"], 8);
}

#[tokio::test]
async fn test_paid_order_does_not_block_checkout() {
    let store = catalog();
    store.insert_order(order(3, customer(), OrderStatus::Paid));
    let app = TestApp::new(store);

    let response = app.post_json("/checkout", Some(CUSTOMER_TOKEN), &cart()).await;

    assert_eq!(response.status, 201);
}

#[tokio::test]
async fn test_checkout_requires_token() {
    let app = TestApp::new(catalog());

    let missing = app.post_json("/checkout", None, &cart()).await;
    let unknown = app.post_json("/checkout", Some("forged"), &cart()).await;

    assert_eq!(missing.status, 401);
    assert_eq!(unknown.status, 401);
    assert!(unknown.text.contains("token inválido ou expirado"));
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn test_checkout_rejects_non_object_cart() {
    let app = TestApp::new(catalog());

    let response = app
        .post_json("/checkout", Some(CUSTOMER_TOKEN), &json!([1, 2]))
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(app.store.write_count(), 0);
}

#[tokio::test]
async fn test_checkout_insufficient_stock_is_bad_request() {
    let app = TestApp::new(catalog());

    let response = app
        .post_json(
            "/checkout",
            Some(CUSTOMER_TOKEN),
            &json!({"items": [{"product_id": 2, "quantity": 5}]}),
        )
        .await;

    assert_eq!(response.status, 400);
    assert!(app.store.orders().is_empty());
    assert_eq!(app.store.stock_of(ProductId::new(2)), Some(1));
}

// =============================================================================
// Replace
// =============================================================================

#[tokio::test]
async fn test_replace_cancels_prior_and_creates_new() {
    let store = catalog();
    store.insert_order(order(7, customer(), OrderStatus::AwaitingPayment));
    let app = TestApp::new(store);

    let response = app
        .post_json(
            "/checkout/replace",
            Some(CUSTOMER_TOKEN),
            &json!({"prior_order_id": 7, "cart": cart()}),
        )
        .await;

    assert_eq!(response.status, 201);
    assert_eq!(response.json["id"], 8);
    assert_eq!(
        app.store.order(OrderId::new(7)).map(|o| o.status),
        Some(OrderStatus::Cancelled)
    );
    assert_eq!(
        app.store.order(OrderId::new(8)).map(|o| o.status),
        Some(OrderStatus::AwaitingPayment)
    );
}

#[tokio::test]
async fn test_replace_other_users_order_conflicts() {
    let store = catalog();
    store.insert_order(order(7, customer(), OrderStatus::AwaitingPayment));
    let app = TestApp::new(store);

    let response = app
        .post_json(
            "/checkout/replace",
            Some(OTHER_CUSTOMER_TOKEN),
            &json!({"prior_order_id": 7, "cart": cart()}),
        )
        .await;

    assert_eq!(response.status, 409);
    assert_eq!(
        app.store.order(OrderId::new(7)).map(|o| o.status),
        Some(OrderStatus::AwaitingPayment)
    );
    assert_eq!(app.store.orders().len(), 1);
}

#[tokio::test]
async fn test_replace_with_bad_cart_keeps_prior_pending() {
    let store = catalog();
    store.insert_order(order(7, customer(), OrderStatus::AwaitingPayment));
    let app = TestApp::new(store);

    let response = app
        .post_json(
            "/checkout/replace",
            Some(CUSTOMER_TOKEN),
            &json!({"prior_order_id": 7, "cart": {"items": []}}),
        )
        .await;

    assert_eq!(response.status, 400);
    assert_eq!(
        app.store.order(OrderId::new(7)).map(|o| o.status),
        Some(OrderStatus::AwaitingPayment)
    );
}
