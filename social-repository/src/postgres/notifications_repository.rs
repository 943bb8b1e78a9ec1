use async_trait::async_trait;
use chrono::{DateTime, Utc};
use social_shared::types::{
    NewNotification, NotificationCounts, NotificationId, NotificationMatch, NotificationQuery,
    NotificationRecord, UserId,
};
use sqlx::{PgConnection, Postgres, QueryBuilder};

use super::{target_columns, NotificationRecordRow, PostgresSocialRepository};
use crate::errors::RepositoryError;
use crate::interfaces::NotificationRepository;

/// Writes `notifications` on the caller's transaction.
pub(super) async fn insert_notifications(
    conn: &mut PgConnection,
    notifications: &[NewNotification],
) -> Result<(), RepositoryError> {
    if notifications.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO notifications (recipient_id, actor_id, verb, target_kind, target_id, created_at) ",
    );
    builder.push_values(notifications, |mut row, notification| {
        let (target_kind, target_id) = target_columns(notification.target);
        row.push_bind(notification.recipient_id)
            .push_bind(notification.actor_id)
            .push_bind(notification.verb.as_str())
            .push_bind(target_kind)
            .push_bind(target_id)
            .push_bind(notification.created_at);
    });
    builder.build().execute(&mut *conn).await?;
    Ok(())
}

/// Deletes, on the caller's transaction, the notifications matching the exact
/// (recipient, actor, verb, target) tuple.
pub(super) async fn delete_matching(
    conn: &mut PgConnection,
    matcher: &NotificationMatch,
) -> Result<u64, RepositoryError> {
    let (target_kind, target_id) = target_columns(matcher.target);

    let result = sqlx::query(
        r#"
        DELETE FROM notifications
        WHERE recipient_id = $1
          AND actor_id = $2
          AND verb = $3
          AND target_kind IS NOT DISTINCT FROM $4
          AND target_id IS NOT DISTINCT FROM $5
        "#,
    )
    .bind(matcher.recipient_id)
    .bind(matcher.actor_id)
    .bind(matcher.verb.as_str())
    .bind(target_kind)
    .bind(target_id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

#[async_trait]
impl NotificationRepository for PostgresSocialRepository {
    async fn list_notifications(
        &self,
        query: &NotificationQuery,
    ) -> Result<(Vec<NotificationRecord>, i64), RepositoryError> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND (NOT $2 OR NOT is_read)",
        )
        .bind(query.recipient_id)
        .bind(query.unread_only)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, NotificationRecordRow>(
            r#"
            SELECT n.id, n.recipient_id, n.actor_id, n.verb, n.target_kind, n.target_id,
                   n.is_read, n.created_at, n.read_at, u.username AS actor_username
            FROM notifications n
            JOIN users u ON u.id = n.actor_id
            WHERE n.recipient_id = $1 AND (NOT $2 OR NOT n.is_read)
            ORDER BY n.created_at DESC, n.id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(query.recipient_id)
        .bind(query.unread_only)
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(&self.pool)
        .await?;

        let records = rows
            .into_iter()
            .map(NotificationRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((records, total))
    }

    async fn count_notifications(
        &self,
        recipient_id: UserId,
    ) -> Result<NotificationCounts, RepositoryError> {
        let (total, unread): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE NOT is_read)
            FROM notifications
            WHERE recipient_id = $1
            "#,
        )
        .bind(recipient_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(NotificationCounts { total, unread })
    }

    async fn set_read_state(
        &self,
        recipient_id: UserId,
        ids: &[NotificationId],
        read: bool,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET read_at = CASE
                    WHEN is_read = $3 THEN read_at
                    WHEN $3 THEN $4
                    ELSE NULL
                END,
                is_read = $3
            WHERE recipient_id = $1 AND id = ANY($2)
            "#,
        )
        .bind(recipient_id)
        .bind(ids)
        .bind(read)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn mark_all_read(
        &self,
        recipient_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = $2 WHERE recipient_id = $1 AND NOT is_read",
        )
        .bind(recipient_id)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn toggle_read(
        &self,
        recipient_id: UserId,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<Option<bool>, RepositoryError> {
        let is_read: Option<bool> = sqlx::query_scalar(
            r#"
            UPDATE notifications
            SET is_read = NOT is_read,
                read_at = CASE WHEN is_read THEN NULL ELSE $3 END
            WHERE id = $1 AND recipient_id = $2
            RETURNING is_read
            "#,
        )
        .bind(id)
        .bind(recipient_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(is_read)
    }
}
