//! Integration tests for Tabacaria.
//!
//! Tests drive the full router (extractors, middleware, handlers) with an
//! in-memory store, a static token table in place of Supabase Auth and a
//! fixed payment gateway in place of Mercado Pago.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tabacaria-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use chrono::Utc;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use url::Url;
use uuid::Uuid;

use tabacaria_api::config::{ApiConfig, SupabaseConfig};
use tabacaria_api::db::InMemoryStore;
use tabacaria_api::mercadopago::{MercadoPagoError, Payment, PaymentLookup};
use tabacaria_api::models::Order;
use tabacaria_api::routes;
use tabacaria_api::services::StaticAuth;
use tabacaria_api::state::AppState;
use tabacaria_core::{DeliveryStatus, OrderId, OrderStatus, UserId, UserRole};

pub const CUSTOMER_TOKEN: &str = "customer-token";
pub const OTHER_CUSTOMER_TOKEN: &str = "other-customer-token";
pub const ADMIN_TOKEN: &str = "admin-token";
pub const AUTOMATION_TOKEN: &str = "automation-Zq81!token";
pub const SPOKE_TOKEN: &str = "spoke-Hv27#token";

/// The user behind [`CUSTOMER_TOKEN`].
#[must_use]
pub const fn customer() -> UserId {
    UserId::new(Uuid::from_u128(0x1111))
}

/// The user behind [`OTHER_CUSTOMER_TOKEN`].
#[must_use]
pub const fn other_customer() -> UserId {
    UserId::new(Uuid::from_u128(0x2222))
}

/// The administrator behind [`ADMIN_TOKEN`].
#[must_use]
pub const fn admin() -> UserId {
    UserId::new(Uuid::from_u128(0xadad))
}

/// A fresh order as checkout would leave it, in `status`.
#[must_use]
pub fn order(id: i64, user_id: UserId, status: OrderStatus) -> Order {
    Order {
        id: OrderId::new(id),
        user_id,
        status,
        delivery_status: DeliveryStatus::Pending,
        delivery_info: None,
        tracking_code: None,
        total_price: Decimal::new(5000, 2),
        created_at: Utc::now(),
    }
}

/// Configuration with test tokens and no outside services.
///
/// # Panics
///
/// Never in practice; the Supabase URL is a constant.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn test_config(spoke_token: Option<&str>) -> ApiConfig {
    ApiConfig {
        database_url: SecretString::from("postgres://localhost/tabacaria_test"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        supabase: SupabaseConfig {
            url: Url::parse("http://localhost:54321").unwrap(),
            anon_key: SecretString::from("anon"),
        },
        automation_token: SecretString::from(AUTOMATION_TOKEN),
        spoke_webhook_token: spoke_token.map(SecretString::from),
        mercadopago: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
        tls: None,
    }
}

/// Payment gateway answering from a fixed table.
#[derive(Debug, Default, Clone)]
pub struct FixedGateway {
    payments: HashMap<String, Payment>,
}

impl FixedGateway {
    #[must_use]
    pub fn with_payment(mut self, payment: Payment) -> Self {
        self.payments.insert(payment.id.to_string(), payment);
        self
    }
}

#[async_trait]
impl PaymentLookup for FixedGateway {
    async fn payment(&self, payment_id: &str) -> Result<Payment, MercadoPagoError> {
        self.payments
            .get(payment_id)
            .cloned()
            .ok_or_else(|| MercadoPagoError::Api {
                status: 404,
                message: "Payment not found".to_string(),
            })
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
    /// Parsed body, `Null` when the body is not JSON.
    pub json: JsonValue,
}

/// Builder for [`TestApp`].
#[derive(Debug)]
pub struct TestAppBuilder {
    store: InMemoryStore,
    spoke_token: Option<&'static str>,
    gateway: Option<FixedGateway>,
}

impl TestAppBuilder {
    /// Require [`SPOKE_TOKEN`] on the courier webhook.
    #[must_use]
    pub fn with_spoke_token(mut self) -> Self {
        self.spoke_token = Some(SPOKE_TOKEN);
        self
    }

    /// Enable the payment webhook with a fixed gateway.
    #[must_use]
    pub fn with_gateway(mut self, gateway: FixedGateway) -> Self {
        self.gateway = Some(gateway);
        self
    }

    #[must_use]
    pub fn build(self) -> TestApp {
        let store = self.store.with_profile(admin(), UserRole::Admin);
        let auth = StaticAuth::new()
            .with_token(CUSTOMER_TOKEN, customer())
            .with_token(OTHER_CUSTOMER_TOKEN, other_customer())
            .with_token(ADMIN_TOKEN, admin());
        let payments = self
            .gateway
            .map(|gateway| Arc::new(gateway) as Arc<dyn PaymentLookup>);

        let state = AppState::new(
            test_config(self.spoke_token),
            Arc::new(store.clone()),
            Arc::new(auth),
            payments,
        );

        TestApp {
            store,
            router: routes::router(state),
        }
    }
}

/// The router plus a handle on its store.
pub struct TestApp {
    pub store: InMemoryStore,
    router: Router,
}

impl TestApp {
    #[must_use]
    pub fn builder(store: InMemoryStore) -> TestAppBuilder {
        TestAppBuilder {
            store,
            spoke_token: None,
            gateway: None,
        }
    }

    #[must_use]
    pub fn new(store: InMemoryStore) -> Self {
        Self::builder(store).build()
    }

    /// Send a request through the router and buffer the response.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    #[allow(clippy::unwrap_used)]
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let json = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);

        TestResponse {
            status,
            headers,
            text,
            json,
        }
    }

    /// POST a raw body with an optional bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[allow(clippy::unwrap_used)]
    pub async fn post_raw(&self, uri: &str, token: Option<&str>, body: impl Into<Body>) -> TestResponse {
        let mut request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(body.into()).unwrap()).await
    }

    /// POST a JSON body with an optional bearer token.
    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: &JsonValue) -> TestResponse {
        self.post_raw(uri, token, body.to_string()).await
    }

    /// GET with an optional bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    #[allow(clippy::unwrap_used)]
    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        let mut request = Request::builder().method(Method::GET).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(request.body(Body::empty()).unwrap()).await
    }
}
