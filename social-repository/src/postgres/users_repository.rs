use async_trait::async_trait;
use chrono::{DateTime, Utc};
use social_shared::types::{NewUser, User, UserId, UserUpdate};

use super::{PostgresSocialRepository, UserRow};
use crate::errors::RepositoryError;
use crate::interfaces::UserRepository;

#[async_trait]
impl UserRepository for PostgresSocialRepository {
    async fn insert_user(
        &self,
        user: &NewUser,
        created_at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, display_name, bio, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, display_name, bio, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.bio)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, display_name, bio, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn get_users_by_usernames(
        &self,
        usernames: &[String],
    ) -> Result<Vec<User>, RepositoryError> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, display_name, bio, created_at
            FROM users
            WHERE username = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(usernames)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update_user(
        &self,
        id: UserId,
        update: &UserUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET display_name = COALESCE($2, display_name),
                bio = COALESCE($3, bio)
            WHERE id = $1
            RETURNING id, username, display_name, bio, created_at
            "#,
        )
        .bind(id)
        .bind(update.display_name.as_deref())
        .bind(update.bio.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, display_name, bio, created_at
            FROM users
            ORDER BY id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn insert_token(
        &self,
        token: &str,
        user_id: UserId,
        created_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO auth_tokens (token, user_id, created_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id)
            .bind(created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn resolve_token(&self, token: &str) -> Result<Option<UserId>, RepositoryError> {
        let user_id: Option<i64> =
            sqlx::query_scalar("SELECT user_id FROM auth_tokens WHERE token = $1")
                .bind(token)
                .fetch_optional(&self.pool)
                .await?;
        Ok(user_id)
    }

    async fn delete_tokens_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM auth_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
