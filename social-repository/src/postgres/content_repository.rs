use async_trait::async_trait;
use chrono::{DateTime, Utc};
use social_shared::types::{
    AuthorFilter, Comment, CommentId, CommentView, LikeView, NewComment, NewNotification, NewPost,
    NotificationMatch, PendingNotification, Post, PostId, PostOrdering, PostQuery, PostUpdate,
    PostView, Target, UserId, UserSummary,
};
use sqlx::{Postgres, QueryBuilder};

use super::notifications_repository::{delete_matching, insert_notifications};
use super::{like_pattern, CommentRow, PostRow, PostViewRow, PostgresSocialRepository};
use crate::errors::RepositoryError;
use crate::interfaces::ContentRepository;

#[derive(sqlx::FromRow)]
struct CommentViewRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    author_username: String,
}

#[derive(sqlx::FromRow)]
struct LikeViewRow {
    user_id: i64,
    post_id: i64,
    created_at: DateTime<Utc>,
    username: String,
}

/// Pushes the `PostView` projection. Counts are derived by cardinality.
fn push_post_view_select(builder: &mut QueryBuilder<'_, Postgres>, viewer: Option<UserId>) {
    builder.push(
        r#"
        SELECT p.id, p.author_id, p.title, p.body, p.created_at, p.updated_at,
               u.username AS author_username,
               (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count,
               (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments_count,
               EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = "#,
    );
    builder.push_bind(viewer);
    builder.push(") AS is_liked FROM posts p JOIN users u ON u.id = p.author_id");
}

fn push_post_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    builder.push(" WHERE TRUE");

    match query.authors {
        AuthorFilter::Any => {}
        AuthorFilter::Author(author_id) => {
            builder.push(" AND p.author_id = ").push_bind(author_id);
        }
        AuthorFilter::FollowedBy(viewer_id) => {
            builder
                .push(" AND p.author_id IN (SELECT followee_id FROM follows WHERE follower_id = ")
                .push_bind(viewer_id)
                .push(")");
        }
    }

    if let Some(term) = query.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (p.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.body ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR u.username ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Titles sort with `COLLATE "C"` so the order is bytewise whatever the
/// database locale.
fn order_clause(ordering: PostOrdering) -> &'static str {
    match ordering {
        PostOrdering::CreatedAtAsc => " ORDER BY p.created_at ASC, p.id ASC",
        PostOrdering::CreatedAtDesc => " ORDER BY p.created_at DESC, p.id DESC",
        PostOrdering::UpdatedAtAsc => " ORDER BY p.updated_at ASC, p.id ASC",
        PostOrdering::UpdatedAtDesc => " ORDER BY p.updated_at DESC, p.id DESC",
        PostOrdering::TitleAsc => r#" ORDER BY p.title COLLATE "C" ASC, p.id DESC"#,
        PostOrdering::TitleDesc => r#" ORDER BY p.title COLLATE "C" DESC, p.id DESC"#,
    }
}

#[async_trait]
impl ContentRepository for PostgresSocialRepository {
    async fn insert_post(
        &self,
        post: &NewPost,
        notifications: &[PendingNotification],
    ) -> Result<Post, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (author_id, title, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, author_id, title, body, created_at, updated_at
            "#,
        )
        .bind(post.author_id)
        .bind(&post.title)
        .bind(&post.body)
        .bind(post.created_at)
        .fetch_one(&mut *tx)
        .await?;
        let post = Post::from(row);

        let target = Target::post(post.id);
        let pending: Vec<NewNotification> = notifications
            .iter()
            .map(|n| n.into_new(post.author_id, target, post.created_at))
            .collect();
        insert_notifications(&mut tx, &pending).await?;

        tx.commit().await?;
        Ok(post)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, author_id, title, body, created_at, updated_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    async fn get_post_view(
        &self,
        id: PostId,
        viewer: Option<UserId>,
    ) -> Result<Option<PostView>, RepositoryError> {
        let mut builder = QueryBuilder::new("");
        push_post_view_select(&mut builder, viewer);
        builder.push(" WHERE p.id = ").push_bind(id);

        let row = builder
            .build_query_as::<PostViewRow>()
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(PostView::from))
    }

    async fn update_post(
        &self,
        id: PostId,
        update: &PostUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET title = COALESCE($2, title),
                body = COALESCE($3, body),
                updated_at = $4
            WHERE id = $1
            RETURNING id, author_id, title, body, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(update.title.as_deref())
        .bind(update.body.as_deref())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Post::from))
    }

    /// Notifications carry a tagged target rather than a foreign key, so they
    /// are removed explicitly before the post row. Comments and likes follow
    /// through `ON DELETE CASCADE`.
    async fn delete_post(&self, id: PostId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM notifications
            WHERE (target_kind = 'post' AND target_id = $1)
               OR (target_kind = 'comment'
                   AND target_id IN (SELECT id FROM comments WHERE post_id = $1))
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected() == 1)
    }

    async fn query_posts(
        &self,
        query: &PostQuery,
    ) -> Result<(Vec<PostView>, i64), RepositoryError> {
        let mut count_builder =
            QueryBuilder::new("SELECT COUNT(*) FROM posts p JOIN users u ON u.id = p.author_id");
        push_post_filters(&mut count_builder, query);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        if total == 0 {
            return Ok((Vec::new(), 0));
        }

        let mut builder = QueryBuilder::new("");
        push_post_view_select(&mut builder, query.viewer);
        push_post_filters(&mut builder, query);
        builder.push(order_clause(query.ordering));
        builder
            .push(" LIMIT ")
            .push_bind(query.limit)
            .push(" OFFSET ")
            .push_bind(query.offset);

        let rows = builder
            .build_query_as::<PostViewRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok((rows.into_iter().map(PostView::from).collect(), total))
    }

    async fn insert_comment(
        &self,
        comment: &NewComment,
        notifications: &[PendingNotification],
    ) -> Result<Comment, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (post_id, author_id, body, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING id, post_id, author_id, body, created_at, updated_at
            "#,
        )
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(&comment.body)
        .bind(comment.created_at)
        .fetch_one(&mut *tx)
        .await?;
        let comment = Comment::from(row);

        let target = Target::comment(comment.id);
        let pending: Vec<NewNotification> = notifications
            .iter()
            .map(|n| n.into_new(comment.author_id, target, comment.created_at))
            .collect();
        insert_notifications(&mut tx, &pending).await?;

        tx.commit().await?;
        Ok(comment)
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, post_id, author_id, body, created_at, updated_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Comment::from))
    }

    async fn update_comment(
        &self,
        id: CommentId,
        body: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            UPDATE comments
            SET body = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, post_id, author_id, body, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(body)
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Comment::from))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<Option<u64>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let removed =
            sqlx::query("DELETE FROM notifications WHERE target_kind = 'comment' AND target_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        tx.commit().await?;
        Ok(Some(removed))
    }

    async fn list_comments(
        &self,
        post_id: PostId,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<CommentView>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, CommentViewRow>(
            r#"
            SELECT c.id, c.post_id, c.author_id, c.body, c.created_at, c.updated_at,
                   u.username AS author_username
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at, c.id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let comments = rows
            .into_iter()
            .map(|row| {
                let comment = Comment::from(row.comment);
                CommentView {
                    author: UserSummary {
                        id: comment.author_id,
                        username: row.author_username,
                    },
                    comment,
                }
            })
            .collect();

        Ok((comments, total))
    }

    /// Like uniqueness is enforced by `likes_user_post_key`; only the request
    /// that inserts the row writes the notification.
    async fn insert_like(
        &self,
        user_id: UserId,
        post_id: PostId,
        created_at: DateTime<Utc>,
        notification: Option<&NewNotification>,
    ) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO likes (user_id, post_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, post_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(post_id)
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

    async fn delete_like(
        &self,
        user_id: UserId,
        post_id: PostId,
        reversal: &NotificationMatch,
    ) -> Result<Option<u64>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let removed = delete_matching(&mut tx, reversal).await?;
        tx.commit().await?;
        Ok(Some(removed))
    }

    async fn count_likes(&self, post_id: PostId) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM likes WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list_likes(
        &self,
        post_id: PostId,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<LikeView>, i64), RepositoryError> {
        let total = self.count_likes(post_id).await?;

        let rows = sqlx::query_as::<_, LikeViewRow>(
            r#"
            SELECT l.user_id, l.post_id, l.created_at, u.username
            FROM likes l
            JOIN users u ON u.id = l.user_id
            WHERE l.post_id = $1
            ORDER BY l.created_at DESC, l.user_id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let likes = rows
            .into_iter()
            .map(|row| LikeView {
                user: UserSummary {
                    id: row.user_id,
                    username: row.username,
                },
                post_id: row.post_id,
                created_at: row.created_at,
            })
            .collect();

        Ok((likes, total))
    }
}
