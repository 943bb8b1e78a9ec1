use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{PostId, UserId, UserSummary};

/// A like record. Its existence is the "liked" state; there is no counter column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Like {
    pub user_id: UserId,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

/// A like with its author resolved, as listed under a post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeView {
    pub user: UserSummary,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

/// End state of a like, unlike or toggle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LikeStatus {
    Liked,
    Unliked,
}

/// Response of every like mutation: the resulting state and the post's like count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeOutcome {
    pub status: LikeStatus,
    pub likes_count: i64,
}
