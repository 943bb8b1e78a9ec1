use chrono::{DateTime, Utc};
use social_shared::types::{NewNotification, NotificationMatch, User, UserId};

use crate::errors::RepositoryError;

/// Persistence of the directed follow graph.
///
/// Edges are unique per (follower, followee) pair and irreflexive. Uniqueness
/// is enforced by the store, not by callers.
#[async_trait::async_trait]
pub trait FollowRepository: Send + Sync {
    /// Inserts a follow edge and, in the same transaction, its notification.
    ///
    /// # Arguments
    ///
    /// * `follower_id` - The user who follows
    /// * `followee_id` - The user being followed
    /// * `created_at` - Edge creation time
    /// * `notification` - Written only if the edge is created
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The edge (and notification) were created
    /// * `Ok(false)` - The edge already existed; nothing was written
    /// * `Err(RepositoryError)` - Database failure; nothing was written
    async fn insert_follow(
        &self,
        follower_id: UserId,
        followee_id: UserId,
        created_at: DateTime<Utc>,
        notification: Option<&NewNotification>,
    ) -> Result<bool, RepositoryError>;

    /// Removes a follow edge together with the notifications matching `reversal`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(n))` - The edge was removed along with `n` notifications
    /// * `Ok(None)` - No edge existed; nothing was removed
    async fn delete_follow(
        &self,
        follower_id: UserId,
        followee_id: UserId,
        reversal: &NotificationMatch,
    ) -> Result<Option<u64>, RepositoryError>;

    async fn is_following(
        &self,
        follower_id: UserId,
        followee_id: UserId,
    ) -> Result<bool, RepositoryError>;

    /// Number of users `user_id` follows.
    async fn count_following(&self, user_id: UserId) -> Result<i64, RepositoryError>;

    /// Number of users following `user_id`.
    async fn count_followers(&self, user_id: UserId) -> Result<i64, RepositoryError>;

    /// Users `user_id` follows, ordered by edge creation then user id.
    async fn list_following(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, RepositoryError>;

    /// Users following `user_id`, ordered by edge creation then user id.
    async fn list_followers(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, RepositoryError>;
}
