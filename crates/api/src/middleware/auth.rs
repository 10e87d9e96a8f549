//! Authentication extractors.
//!
//! Two kinds of callers reach the API:
//! - users (storefront customers, dashboard admins) presenting a Supabase
//!   access token, checked by [`RequireUser`] and [`RequireAdmin`];
//! - machines (workflow automation, the courier) presenting a static shared
//!   secret, checked by [`RequireAutomationToken`] and [`SpokeWebhookAuth`].
//!
//! # Example
//!
//! ```rust,ignore
//! async fn insights(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
//!     format!("Olá, {admin}!")
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use tabacaria_core::UserId;

use crate::config::token_matches;
use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, is_admin};
use crate::state::AppState;

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Extractor that requires an authenticated user.
pub struct RequireUser(pub UserId);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        let user_id = state.auth().resolve_user(token).await?;

        set_sentry_user(user_id);
        Ok(Self(user_id))
    }
}

/// Extractor that requires an authenticated administrator (`profiles.role = 'adm'`).
///
/// Unauthenticated requests get 401; authenticated non-admins get 403.
pub struct RequireAdmin(pub UserId);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let RequireUser(user_id) = RequireUser::from_request_parts(parts, state).await?;

        if !is_admin(state.profiles(), user_id).await? {
            warn!(user_id = %user_id, path = %parts.uri.path(), "Non-admin denied");
            return Err(AppError::Forbidden(
                "apenas administradores podem acessar este recurso".to_string(),
            ));
        }

        Ok(Self(user_id))
    }
}

/// Extractor that requires the workflow automation token.
pub struct RequireAutomationToken;

impl FromRequestParts<AppState> for RequireAutomationToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;

        if !token_matches(&state.config().automation_token, token) {
            debug!("Automation token rejected");
            return Err(AuthError::InvalidToken.into());
        }

        Ok(Self)
    }
}

/// Extractor that checks the courier webhook secret, when one is configured.
///
/// With no `SPOKE_WEBHOOK_TOKEN` configured every request passes.
pub struct SpokeWebhookAuth;

impl FromRequestParts<AppState> for SpokeWebhookAuth {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(expected) = &state.config().spoke_webhook_token else {
            return Ok(Self);
        };

        let token = bearer_token(parts).ok_or(AuthError::MissingToken)?;
        if !token_matches(expected, token) {
            warn!("Courier webhook token rejected");
            return Err(AuthError::InvalidToken.into());
        }

        Ok(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(authorization: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc"))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("bearer abc "))), Some("abc"));
        assert_eq!(bearer_token(&parts(Some("Basic abc"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(Some("abc"))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
