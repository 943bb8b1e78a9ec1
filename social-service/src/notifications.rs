//! Notification fan-out and read-state management.
use social_shared::types::{
    NewNotification, NotificationCounts, NotificationId, NotificationQuery, NotificationView,
    PageRequest, Paginated, Target, UserId, Verb,
};
use tracing::{debug, info};

use crate::errors::SocialError;
use crate::service::{now, SocialService};

/// Builds the notification for `recipient_id` about an action by `actor_id`.
///
/// A user is never notified about their own action: when `recipient_id`
/// equals `actor_id` nothing is built and `None` is returned.
///
/// # Arguments
///
/// * `recipient_id` - User the notification is addressed to
/// * `actor_id` - User whose action triggered it
/// * `verb` - What happened
/// * `target` - Optional post or comment the action refers to
pub(crate) fn notification_for(
    recipient_id: UserId,
    actor_id: UserId,
    verb: Verb,
    target: Option<Target>,
) -> Option<NewNotification> {
    if recipient_id == actor_id {
        debug!(user_id = %actor_id, verb = %verb, "Skipping self notification");
        return None;
    }
    Some(NewNotification {
        recipient_id,
        actor_id,
        verb,
        target,
        created_at: now(),
    })
}

impl SocialService {
    /// Lists the viewer's notifications, newest first.
    pub async fn list_notifications(
        &self,
        viewer_id: UserId,
        unread_only: bool,
        page: PageRequest,
    ) -> Result<Paginated<NotificationView>, SocialError> {
        let (records, total) = self
            .repo
            .list_notifications(&NotificationQuery {
                recipient_id: viewer_id,
                unread_only,
                offset: page.offset(),
                limit: page.limit(),
            })
            .await?;

        Ok(Paginated::new(
            page,
            total,
            records.into_iter().map(NotificationView::from).collect(),
        ))
    }

    pub async fn notification_counts(
        &self,
        viewer_id: UserId,
    ) -> Result<NotificationCounts, SocialError> {
        Ok(self.repo.count_notifications(viewer_id).await?)
    }

    /// Sets the read flag on the given notifications.
    ///
    /// Ids that belong to other users are filtered out rather than rejected.
    ///
    /// # Returns
    ///
    /// Number of the viewer's notifications matched by `ids`.
    pub async fn mark_read(
        &self,
        viewer_id: UserId,
        ids: &[NotificationId],
        read: bool,
    ) -> Result<u64, SocialError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let updated = self
            .repo
            .set_read_state(viewer_id, ids, read, now())
            .await?;
        info!(user_id = %viewer_id, updated, read, "Notifications read state updated");
        Ok(updated)
    }

    pub async fn mark_unread(
        &self,
        viewer_id: UserId,
        ids: &[NotificationId],
    ) -> Result<u64, SocialError> {
        self.mark_read(viewer_id, ids, false).await
    }

    /// Marks every unread notification of the viewer as read and returns how
    /// many changed.
    pub async fn mark_all_read(&self, viewer_id: UserId) -> Result<u64, SocialError> {
        let updated = self.repo.mark_all_read(viewer_id, now()).await?;
        info!(user_id = %viewer_id, updated, "All notifications marked as read");
        Ok(updated)
    }

    /// Flips the read flag of one notification and returns the new state.
    ///
    /// Someone else's notification is reported as not found.
    pub async fn toggle_read(
        &self,
        viewer_id: UserId,
        id: NotificationId,
    ) -> Result<bool, SocialError> {
        self.repo
            .toggle_read(viewer_id, id, now())
            .await?
            .ok_or(SocialError::NotificationNotFound(id))
    }
}
