use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// A directed follow edge (`follower_id` → `followee_id`).
///
/// Edges are irreflexive and unique per pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowEdge {
    pub follower_id: UserId,
    pub followee_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Counts returned after a follow or unfollow.
///
/// `following_count` belongs to the actor, `followers_count` to the target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowCounts {
    pub following_count: i64,
    pub followers_count: i64,
}

/// Result of a follow or unfollow: a human readable message plus the actor's
/// following count and the target's followers count after the change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FollowOutcome {
    pub message: String,
    #[serde(flatten)]
    pub counts: FollowCounts,
}
