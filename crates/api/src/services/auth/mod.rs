//! User authentication against the hosted auth service.
//!
//! Storefront and dashboard clients send the access token they got from
//! Supabase Auth. The token is resolved to a user id by asking the auth
//! service itself (`GET /auth/v1/user`), so no signing key is held here.
//! Roles are not part of the token: admin checks read `profiles.role`.

mod error;

pub use error::AuthError;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;
use uuid::Uuid;

use tabacaria_core::{UserId, UserRole};

use crate::config::SupabaseConfig;
use crate::db::{ProfileRepository, RepositoryError};

/// Resolves access tokens to users.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Resolve a bearer token to the user it was issued to.
    async fn resolve_user(&self, access_token: &str) -> Result<UserId, AuthError>;
}

#[derive(Debug, Deserialize)]
struct AuthUserResponse {
    id: Uuid,
}

/// Supabase Auth client.
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    user_endpoint: Url,
    anon_key: SecretString,
}

impl std::fmt::Debug for SupabaseAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseAuth")
            .field("user_endpoint", &self.user_endpoint.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl SupabaseAuth {
    /// Create a client for the project at `config.url`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Upstream` if the endpoint URL cannot be built.
    pub fn new(client: Client, config: &SupabaseConfig) -> Result<Self, AuthError> {
        let mut user_endpoint = config.url.clone();
        user_endpoint
            .path_segments_mut()
            .map_err(|()| AuthError::Upstream("SUPABASE_URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["auth", "v1", "user"]);

        Ok(Self {
            client,
            user_endpoint,
            anon_key: config.anon_key.clone(),
        })
    }
}

#[async_trait]
impl AuthProvider for SupabaseAuth {
    #[instrument(skip_all)]
    async fn resolve_user(&self, access_token: &str) -> Result<UserId, AuthError> {
        let response = self
            .client
            .get(self.user_endpoint.clone())
            .header("apikey", self.anon_key.expose_secret())
            .bearer_auth(access_token)
            .timeout(Duration::from_secs(15))
            .send()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Access token rejected by auth service");
                return Err(AuthError::InvalidToken);
            }
            status => {
                warn!(%status, "Unexpected auth service response");
                return Err(AuthError::Upstream(format!("status {status}")));
            }
        }

        let user: AuthUserResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Upstream(e.to_string()))?;

        Ok(UserId::new(user.id))
    }
}

/// Fixed token table, for tests and local development.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    tokens: HashMap<String, UserId>,
}

impl StaticAuth {
    /// Create an empty token table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as belonging to `user_id`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, user_id: UserId) -> Self {
        self.tokens.insert(token.into(), user_id);
        self
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn resolve_user(&self, access_token: &str) -> Result<UserId, AuthError> {
        self.tokens
            .get(access_token)
            .copied()
            .ok_or(AuthError::InvalidToken)
    }
}

/// Whether `user_id` has the administrator role.
///
/// A user without a profile row is not an administrator.
///
/// # Errors
///
/// Returns `RepositoryError` if the profile lookup fails.
pub async fn is_admin(
    profiles: &dyn ProfileRepository,
    user_id: UserId,
) -> Result<bool, RepositoryError> {
    Ok(profiles
        .role_of(user_id)
        .await?
        .is_some_and(|role| role == UserRole::Admin))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;

    #[tokio::test]
    async fn test_static_auth_resolves_known_tokens() {
        let user = UserId::new(Uuid::new_v4());
        let auth = StaticAuth::new().with_token("tok-1", user);

        assert_eq!(auth.resolve_user("tok-1").await.unwrap(), user);
        assert!(matches!(
            auth.resolve_user("tok-2").await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_is_admin_reads_profile_role() {
        let admin = UserId::new(Uuid::new_v4());
        let customer = UserId::new(Uuid::new_v4());
        let stranger = UserId::new(Uuid::new_v4());
        let store = InMemoryStore::new()
            .with_profile(admin, UserRole::Admin)
            .with_profile(customer, UserRole::Customer);

        assert!(is_admin(&store, admin).await.unwrap());
        assert!(!is_admin(&store, customer).await.unwrap());
        assert!(!is_admin(&store, stranger).await.unwrap());
    }

    #[test]
    fn test_supabase_auth_endpoint() {
        let config = SupabaseConfig {
            url: Url::parse("https://abc.supabase.co").unwrap(),
            anon_key: SecretString::from("anon"),
        };
        let auth = SupabaseAuth::new(Client::new(), &config).unwrap();

        assert_eq!(
            auth.user_endpoint.as_str(),
            "https://abc.supabase.co/auth/v1/user"
        );
        assert!(format!("{auth:?}").contains("[REDACTED]"));
    }

    #[test]
    fn test_supabase_auth_endpoint_keeps_base_path() {
        for base in [
            "https://gateway.example/supabase",
            "https://gateway.example/supabase/",
        ] {
            let config = SupabaseConfig {
                url: Url::parse(base).unwrap(),
                anon_key: SecretString::from("anon"),
            };
            let auth = SupabaseAuth::new(Client::new(), &config).unwrap();

            assert_eq!(
                auth.user_endpoint.as_str(),
                "https://gateway.example/supabase/auth/v1/user"
            );
        }
    }

    #[test]
    fn test_supabase_auth_rejects_cannot_be_base_url() {
        let config = SupabaseConfig {
            url: Url::parse("mailto:ops@tabacaria.example").unwrap(),
            anon_key: SecretString::from("anon"),
        };

        assert!(matches!(
            SupabaseAuth::new(Client::new(), &config),
            Err(AuthError::Upstream(_))
        ));
    }
}
