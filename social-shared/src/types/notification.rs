use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{NotificationId, UserId, UserSummary};

/// The closed set of events that produce a notification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Verb {
    Follow,
    Like,
    Comment,
    Mention,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown notification verb: {0}")]
pub struct ParseVerbError(pub String);

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Follow => "follow",
            Verb::Like => "like",
            Verb::Comment => "comment",
            Verb::Mention => "mention",
        }
    }

    /// Human readable message shown to the recipient.
    pub fn message(&self, actor_username: &str) -> String {
        match self {
            Verb::Follow => format!("{actor_username} started following you"),
            Verb::Like => format!("{actor_username} liked your post"),
            Verb::Comment => format!("{actor_username} commented on your post"),
            Verb::Mention => format!("{actor_username} mentioned you"),
        }
    }
}

impl FromStr for Verb {
    type Err = ParseVerbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "follow" => Ok(Verb::Follow),
            "like" => Ok(Verb::Like),
            "comment" => Ok(Verb::Comment),
            "mention" => Ok(Verb::Mention),
            other => Err(ParseVerbError(other.to_string())),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of object a notification points at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Comment,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown notification target kind: {0}")]
pub struct ParseTargetKindError(pub String);

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Post => "post",
            TargetKind::Comment => "comment",
        }
    }
}

impl FromStr for TargetKind {
    type Err = ParseTargetKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "post" => Ok(TargetKind::Post),
            "comment" => Ok(TargetKind::Comment),
            other => Err(ParseTargetKindError(other.to_string())),
        }
    }
}

/// Tagged reference to the post or comment a notification is about.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Target {
    pub kind: TargetKind,
    pub id: i64,
}

impl Target {
    pub fn post(id: i64) -> Self {
        Self {
            kind: TargetKind::Post,
            id,
        }
    }

    pub fn comment(id: i64) -> Self {
        Self {
            kind: TargetKind::Comment,
            id,
        }
    }
}

/// A stored notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient_id: UserId,
    pub actor_id: UserId,
    pub verb: Verb,
    pub target: Option<Target>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Data required to insert a notification. New notifications are always unread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient_id: UserId,
    pub actor_id: UserId,
    pub verb: Verb,
    pub target: Option<Target>,
    pub created_at: DateTime<Utc>,
}

/// A notification produced by a new post or comment and written together with
/// it. The actor, target and timestamp are taken from the created row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingNotification {
    pub recipient_id: UserId,
    pub verb: Verb,
}

impl PendingNotification {
    pub fn into_new(
        self,
        actor_id: UserId,
        target: Target,
        created_at: DateTime<Utc>,
    ) -> NewNotification {
        NewNotification {
            recipient_id: self.recipient_id,
            actor_id,
            verb: self.verb,
            target: Some(target),
            created_at,
        }
    }
}

/// Exact (recipient, actor, verb, target) tuple used to delete the notification
/// of a reversed event. A `None` target matches only notifications without a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationMatch {
    pub recipient_id: UserId,
    pub actor_id: UserId,
    pub verb: Verb,
    pub target: Option<Target>,
}

impl NotificationMatch {
    pub fn matches(&self, notification: &Notification) -> bool {
        notification.recipient_id == self.recipient_id
            && notification.actor_id == self.actor_id
            && notification.verb == self.verb
            && notification.target == self.target
    }
}

/// Listing request for one recipient's notifications.
#[derive(Debug, Clone, Copy)]
pub struct NotificationQuery {
    pub recipient_id: UserId,
    pub unread_only: bool,
    pub offset: i64,
    pub limit: i64,
}

/// A notification joined with its actor, as returned by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub notification: Notification,
    pub actor: UserSummary,
}

/// A notification as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationView {
    pub id: NotificationId,
    pub actor: UserSummary,
    pub recipient_id: UserId,
    pub verb: Verb,
    pub message: String,
    pub target: Option<Target>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl From<NotificationRecord> for NotificationView {
    fn from(record: NotificationRecord) -> Self {
        let NotificationRecord {
            notification,
            actor,
        } = record;
        Self {
            id: notification.id,
            message: notification.verb.message(&actor.username),
            actor,
            recipient_id: notification.recipient_id,
            verb: notification.verb,
            target: notification.target,
            is_read: notification.is_read,
            created_at: notification.created_at,
            read_at: notification.read_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationCounts {
    pub total: i64,
    pub unread: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verb_wire_names() {
        assert_eq!(serde_json::to_string(&Verb::Mention).unwrap(), "\"mention\"");
        assert_eq!("follow".parse::<Verb>(), Ok(Verb::Follow));
        assert!("poke".parse::<Verb>().is_err());
    }

    #[test]
    fn test_verb_messages() {
        assert_eq!(Verb::Follow.message("alice"), "alice started following you");
        assert_eq!(Verb::Like.message("bob"), "bob liked your post");
        assert_eq!(Verb::Comment.message("carol"), "carol commented on your post");
        assert_eq!(Verb::Mention.message("dave"), "dave mentioned you");
    }

    #[test]
    fn test_target_serializes_as_tagged_reference() {
        let json = serde_json::to_value(Target::comment(7)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "comment", "id": 7}));
    }

    #[test]
    fn test_view_from_record_builds_message() {
        let record = NotificationRecord {
            notification: Notification {
                id: 1,
                recipient_id: 2,
                actor_id: 3,
                verb: Verb::Like,
                target: Some(Target::post(9)),
                is_read: false,
                created_at: Utc::now(),
                read_at: None,
            },
            actor: UserSummary {
                id: 3,
                username: "erin".to_string(),
            },
        };

        let view = NotificationView::from(record);
        assert_eq!(view.message, "erin liked your post");
        assert_eq!(view.actor.id, 3);
        assert_eq!(view.target, Some(Target::post(9)));
    }
}
