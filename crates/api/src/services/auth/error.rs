//! Authentication error types.

use thiserror::Error;

/// Errors that can occur while resolving a bearer token to a user.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `Authorization: Bearer` header on the request.
    #[error("token ausente")]
    MissingToken,

    /// The auth service does not recognize the token.
    #[error("token inválido ou expirado")]
    InvalidToken,

    /// The auth service could not be reached or answered unexpectedly.
    #[error("auth service error: {0}")]
    Upstream(String),
}
