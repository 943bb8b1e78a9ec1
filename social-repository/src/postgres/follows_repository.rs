use async_trait::async_trait;
use chrono::{DateTime, Utc};
use social_shared::types::{NewNotification, NotificationMatch, User, UserId};

use super::notifications_repository::{delete_matching, insert_notifications};
use super::{PostgresSocialRepository, UserRow};
use crate::errors::RepositoryError;
use crate::interfaces::FollowRepository;

#[async_trait]
impl FollowRepository for PostgresSocialRepository {
    /// Inserts the edge with `ON CONFLICT DO NOTHING`, so of two racing
    /// requests for the same pair exactly one observes `true` and writes the
    /// notification.
    async fn insert_follow(
        &self,
        follower_id: UserId,
        followee_id: UserId,
        created_at: DateTime<Utc>,
        notification: Option<&NewNotification>,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_id, followee_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (follower_id, followee_id) DO NOTHING
            "#,
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(created_at)
        .execute(&mut *tx)
        .await?;

        let created = result.rows_affected() == 1;
        if let (true, Some(notification)) = (created, notification) {
            insert_notifications(&mut tx, std::slice::from_ref(notification)).await?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn delete_follow(
        &self,
        follower_id: UserId,
        followee_id: UserId,
        reversal: &NotificationMatch,
    ) -> Result<Option<u64>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2")
            .bind(follower_id)
            .bind(followee_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let removed = delete_matching(&mut tx, reversal).await?;
        tx.commit().await?;
        Ok(Some(removed))
    }

    async fn is_following(
        &self,
        follower_id: UserId,
        followee_id: UserId,
    ) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn count_following(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_followers(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE followee_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_following(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.username, u.display_name, u.bio, u.created_at
            FROM follows f
            JOIN users u ON u.id = f.followee_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at, u.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn list_followers(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.username, u.display_name, u.bio, u.created_at
            FROM follows f
            JOIN users u ON u.id = f.follower_id
            WHERE f.followee_id = $1
            ORDER BY f.created_at, u.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}
