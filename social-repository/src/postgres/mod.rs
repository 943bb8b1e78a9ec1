//! PostgreSQL implementation of the social repository.
//!
//! ## Key Features
//!
//! - Connection pooling with `sqlx::PgPool`
//! - Embedded migrations (`src/postgres/migrations`)
//! - Follow and like uniqueness enforced with `ON CONFLICT DO NOTHING`
//! - Post deletion cascades in a single transaction
//!
//! ## Database Tables
//!
//! - `users`, `auth_tokens`: accounts and bearer tokens
//! - `follows`: directed edges keyed by (follower_id, followee_id)
//! - `posts`, `comments`, `likes`: content store
//! - `notifications`: fan-out records with a tagged (kind, id) target
mod content_repository;
mod follows_repository;
mod notifications_repository;
mod users_repository;

use chrono::{DateTime, Utc};
use social_shared::types::{
    Comment, Notification, NotificationRecord, Post, PostView, Target, TargetKind, User,
    UserSummary, Verb,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::errors::RepositoryError;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("src/postgres/migrations");

/// PostgreSQL implementation of every social repository trait.
#[derive(Clone)]
pub struct PostgresSocialRepository {
    pool: sqlx::PgPool,
}

impl PostgresSocialRepository {
    /// Creates a new PostgreSQL repository instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Configured PostgreSQL connection pool with required schema
    ///
    /// # Returns
    ///
    /// * `Ok(PostgresSocialRepository)` - Ready-to-use repository instance
    /// * `Err(RepositoryError)` - Future validation errors (currently always succeeds)
    pub async fn new(pool: sqlx::PgPool) -> Result<Self, RepositoryError> {
        Ok(Self { pool })
    }

    /// Opens a pool against `url` and wraps it in a repository.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Self::new(pool).await
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        MIGRATOR.run(&self.pool).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    display_name: String,
    bio: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            bio: row.bio,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    author_id: i64,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostViewRow {
    id: i64,
    author_id: i64,
    title: String,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_username: String,
    likes_count: i64,
    comments_count: i64,
    is_liked: bool,
}

impl From<PostViewRow> for PostView {
    fn from(row: PostViewRow) -> Self {
        PostView {
            author: UserSummary {
                id: row.author_id,
                username: row.author_username,
            },
            post: Post {
                id: row.id,
                author_id: row.author_id,
                title: row.title,
                body: row.body,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            likes_count: row.likes_count,
            comments_count: row.comments_count,
            is_liked: row.is_liked,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    post_id: i64,
    author_id: i64,
    body: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            post_id: row.post_id,
            author_id: row.author_id,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: i64,
    recipient_id: i64,
    actor_id: i64,
    verb: String,
    target_kind: Option<String>,
    target_id: Option<i64>,
    is_read: bool,
    created_at: DateTime<Utc>,
    read_at: Option<DateTime<Utc>>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = RepositoryError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let verb: Verb = row
            .verb
            .parse()
            .map_err(|_| RepositoryError::InvalidVerb(row.verb.clone()))?;
        let target = match (row.target_kind, row.target_id) {
            (Some(kind), Some(id)) => {
                let kind: TargetKind = kind
                    .parse()
                    .map_err(|_| RepositoryError::InvalidTargetKind(kind.clone()))?;
                Some(Target { kind, id })
            }
            _ => None,
        };

        Ok(Notification {
            id: row.id,
            recipient_id: row.recipient_id,
            actor_id: row.actor_id,
            verb,
            target,
            is_read: row.is_read,
            created_at: row.created_at,
            read_at: row.read_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct NotificationRecordRow {
    #[sqlx(flatten)]
    notification: NotificationRow,
    actor_username: String,
}

impl TryFrom<NotificationRecordRow> for NotificationRecord {
    type Error = RepositoryError;

    fn try_from(row: NotificationRecordRow) -> Result<Self, Self::Error> {
        let notification = Notification::try_from(row.notification)?;
        Ok(NotificationRecord {
            actor: UserSummary {
                id: notification.actor_id,
                username: row.actor_username,
            },
            notification,
        })
    }
}

/// Splits an optional target into the nullable (kind, id) column pair.
fn target_columns(target: Option<Target>) -> (Option<&'static str>, Option<i64>) {
    match target {
        Some(target) => (Some(target.kind.as_str()), Some(target.id)),
        None => (None, None),
    }
}

/// Escapes `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}
