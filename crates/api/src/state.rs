//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::db::{InsightsRepository, OrderRepository, ProfileRepository, Store};
use crate::mercadopago::PaymentLookup;
use crate::services::auth::AuthProvider;

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    store: Arc<dyn Store>,
    orders: Arc<dyn OrderRepository>,
    insights: Arc<dyn InsightsRepository>,
    profiles: Arc<dyn ProfileRepository>,
    auth: Arc<dyn AuthProvider>,
    payments: Option<Arc<dyn PaymentLookup>>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// `payments` is `None` when Mercado Pago is not configured.
    #[must_use]
    pub fn new<S>(
        config: ApiConfig,
        store: Arc<S>,
        auth: Arc<dyn AuthProvider>,
        payments: Option<Arc<dyn PaymentLookup>>,
    ) -> Self
    where
        S: Store + 'static,
    {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                orders: store.clone(),
                insights: store.clone(),
                profiles: store.clone(),
                store,
                auth,
                payments,
            }),
        }
    }

    /// Get the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get the storage backend, for health checks.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get the order repository.
    #[must_use]
    pub fn orders(&self) -> &dyn OrderRepository {
        self.inner.orders.as_ref()
    }

    /// Get the insights repository.
    #[must_use]
    pub fn insights(&self) -> &dyn InsightsRepository {
        self.inner.insights.as_ref()
    }

    /// Get the profile repository.
    #[must_use]
    pub fn profiles(&self) -> &dyn ProfileRepository {
        self.inner.profiles.as_ref()
    }

    /// Get the user authentication provider.
    #[must_use]
    pub fn auth(&self) -> &dyn AuthProvider {
        self.inner.auth.as_ref()
    }

    /// Get the payment gateway, if configured.
    #[must_use]
    pub fn payments(&self) -> Option<&dyn PaymentLookup> {
        self.inner.payments.as_deref()
    }
}
