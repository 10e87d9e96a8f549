//! Mercado Pago errors.

use thiserror::Error;

/// Errors that can occur when talking to Mercado Pago.
#[derive(Debug, Error)]
pub enum MercadoPagoError {
    /// HTTP request failed.
    #[error("Mercado Pago request failed: {0}")]
    Request(String),

    /// Failed to parse response.
    #[error("Mercado Pago response error: {0}")]
    Response(String),

    /// The API answered with a non-success status.
    #[error("Mercado Pago API error ({status}): {message}")]
    Api { status: u16, message: String },
}
