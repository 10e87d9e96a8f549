//! Profile lookups for `PostgreSQL`.

use async_trait::async_trait;
use tracing::instrument;

use tabacaria_core::{UserId, UserRole};

use super::{PgStore, ProfileRepository, RepositoryError};

#[async_trait]
impl ProfileRepository for PgStore {
    #[instrument(skip(self))]
    async fn role_of(&self, user_id: UserId) -> Result<Option<UserRole>, RepositoryError> {
        let role: Option<Option<String>> =
            sqlx::query_scalar("SELECT role FROM public.profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self.pool())
                .await?;

        // A profile row with a NULL role is a customer.
        Ok(role.map(|label| UserRole::from_label(label.as_deref().unwrap_or_default())))
    }
}
