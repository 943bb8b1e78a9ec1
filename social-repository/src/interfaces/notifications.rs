use chrono::{DateTime, Utc};
use social_shared::types::{
    NotificationCounts, NotificationId, NotificationQuery, NotificationRecord, UserId,
};

use crate::errors::RepositoryError;

/// Reads and read-state updates of notifications.
///
/// Notifications are written and removed only together with the follow, like,
/// post or comment that produced them, through the other repository traits.
/// Every read-state mutation is scoped to a recipient: ids that belong to
/// someone else are filtered out of the update set rather than rejected.
#[async_trait::async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Lists a recipient's notifications, newest first, with the total count.
    async fn list_notifications(
        &self,
        query: &NotificationQuery,
    ) -> Result<(Vec<NotificationRecord>, i64), RepositoryError>;

    async fn count_notifications(
        &self,
        recipient_id: UserId,
    ) -> Result<NotificationCounts, RepositoryError>;

    /// Sets the read flag on the recipient's notifications among `ids`.
    ///
    /// `read_at` is set to `at` on a transition to read and cleared on a
    /// transition to unread; notifications already in the requested state keep
    /// their timestamp.
    ///
    /// # Returns
    ///
    /// The number of the recipient's notifications matched by `ids`.
    async fn set_read_state(
        &self,
        recipient_id: UserId,
        ids: &[NotificationId],
        read: bool,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Marks all unread notifications as read, returning how many changed.
    async fn mark_all_read(
        &self,
        recipient_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Flips the read flag of one notification.
    ///
    /// Returns the new state, or `None` when the id does not belong to the recipient.
    async fn toggle_read(
        &self,
        recipient_id: UserId,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<Option<bool>, RepositoryError>;
}
