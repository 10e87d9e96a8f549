//! Unified error handling for the API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::mercadopago::MercadoPagoError;
use crate::services::auth::AuthError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// No (valid) credentials were presented.
    #[error("Autenticação necessária: {0}")]
    AuthenticationRequired(String),

    /// Authenticated, but not allowed to call this handler.
    #[error("Acesso negado: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Não encontrado: {0}")]
    NotFound(String),

    /// The resource is not in the state the request requires.
    #[error("{0}")]
    Conflict(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// A third-party API failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// An optional integration the request needs is not configured.
    #[error("{0}")]
    NotConfigured(&'static str),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::AuthenticationRequired(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::NotConfigured(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("registro".to_string()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::InvalidInput(msg) => Self::BadRequest(msg),
            other => Self::Database(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken | AuthError::InvalidToken => {
                Self::AuthenticationRequired(err.to_string())
            }
            AuthError::Upstream(_) => Self::Upstream(err.to_string()),
        }
    }
}

impl From<MercadoPagoError> for AppError {
    fn from(err: MercadoPagoError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "API request error"
            );
        }

        // Internal errors carry no detail worth exposing
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Set the Sentry user context from an authenticated user ID.
pub fn set_sentry_user(user_id: tabacaria_core::UserId) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    async fn body_of(err: AppError) -> serde_json::Value {
        let bytes = axum::body::to_bytes(err.into_response().into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::AuthenticationRequired("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Upstream("test".to_string())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            get_status(AppError::NotConfigured("test")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_error_mapping() {
        assert!(matches!(
            AppError::from(RepositoryError::Conflict("x".to_string())),
            AppError::Conflict(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::InvalidInput("x".to_string())),
            AppError::BadRequest(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Storage("x".to_string())),
            AppError::Database(_)
        ));
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let body = body_of(AppError::BadRequest("order_id é obrigatório".to_string())).await;
        assert_eq!(body["error"], "order_id é obrigatório");
    }

    #[tokio::test]
    async fn test_database_error_keeps_detail() {
        let body = body_of(AppError::Database(RepositoryError::Storage(
            "lock poisoned".to_string(),
        )))
        .await;
        assert_eq!(body["error"], "Database error: storage error: lock poisoned");
    }

    #[tokio::test]
    async fn test_internal_error_hides_detail() {
        let body = body_of(AppError::Internal("secret detail".to_string())).await;
        assert_eq!(body["error"], "Internal server error");
    }
}
