use chrono::{DateTime, Utc};
use social_shared::types::{NewUser, User, UserId, UserUpdate};

use crate::errors::RepositoryError;

/// Persistence of user accounts and their bearer tokens.
#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new user.
    ///
    /// # Returns
    ///
    /// * `Ok(User)` - The stored user with its assigned id
    /// * `Err(RepositoryError::Conflict)` - The username is already taken
    async fn insert_user(
        &self,
        user: &NewUser,
        created_at: DateTime<Utc>,
    ) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Resolves a set of usernames. Unknown names are skipped; matching is exact.
    async fn get_users_by_usernames(
        &self,
        usernames: &[String],
    ) -> Result<Vec<User>, RepositoryError>;

    /// Applies a partial update, returning `None` when the user does not exist.
    async fn update_user(
        &self,
        id: UserId,
        update: &UserUpdate,
    ) -> Result<Option<User>, RepositoryError>;

    /// Lists users ordered by id.
    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>, RepositoryError>;

    async fn count_users(&self) -> Result<i64, RepositoryError>;

    async fn insert_token(
        &self,
        token: &str,
        user_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;

    async fn resolve_token(&self, token: &str) -> Result<Option<UserId>, RepositoryError>;

    /// Revokes every token of a user, returning how many were removed.
    async fn delete_tokens_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError>;
}
