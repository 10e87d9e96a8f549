//! Mercado Pago REST client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument};
use url::Url;

use super::error::MercadoPagoError;
use super::types::Payment;
use crate::config::MercadoPagoConfig;

/// Looks up payments by id.
#[async_trait]
pub trait PaymentLookup: Send + Sync {
    /// Fetch a payment resource.
    async fn payment(&self, payment_id: &str) -> Result<Payment, MercadoPagoError>;
}

/// Mercado Pago API client.
#[derive(Clone)]
pub struct MercadoPagoClient {
    /// HTTP client.
    client: Client,
    /// API base URL.
    api_url: Url,
    /// Access token of the seller account.
    access_token: SecretString,
}

impl std::fmt::Debug for MercadoPagoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoPagoClient")
            .field("api_url", &self.api_url.as_str())
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl MercadoPagoClient {
    /// Create a new client.
    #[must_use]
    pub fn new(client: Client, config: &MercadoPagoConfig) -> Self {
        Self {
            client,
            api_url: config.api_url.clone(),
            access_token: config.access_token.clone(),
        }
    }

    fn payment_url(&self, payment_id: &str) -> Result<Url, MercadoPagoError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|()| MercadoPagoError::Request("API URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["v1", "payments", payment_id]);
        Ok(url)
    }
}

#[async_trait]
impl PaymentLookup for MercadoPagoClient {
    #[instrument(skip(self))]
    async fn payment(&self, payment_id: &str) -> Result<Payment, MercadoPagoError> {
        let response = self
            .client
            .get(self.payment_url(payment_id)?)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .map_err(|e| MercadoPagoError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            error!(%status, "Mercado Pago API error fetching payment");
            return Err(MercadoPagoError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let payment: Payment = response
            .json()
            .await
            .map_err(|e| MercadoPagoError::Response(e.to_string()))?;

        debug!(
            payment_id = payment.id,
            status = ?payment.status,
            "Payment fetched from Mercado Pago"
        );

        Ok(payment)
    }
}
