use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{PostId, UserId, UserSummary};

/// A post. Authorship is fixed at creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: UserId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// Partial post update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// A post as returned to clients: author resolved, counts derived by cardinality.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: UserSummary,
    pub likes_count: i64,
    pub comments_count: i64,
    /// Whether the viewer has liked the post. `false` for anonymous viewers.
    pub is_liked: bool,
}

/// Which authors a post listing is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorFilter {
    #[default]
    Any,
    /// Posts written by one user.
    Author(UserId),
    /// Posts written by anyone the given user follows (the feed).
    FollowedBy(UserId),
}

/// Sort order for post listings. Ties are always broken by post id in the
/// same direction as the primary key, except for title orderings which
/// break ties by id descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrdering {
    CreatedAtAsc,
    #[default]
    CreatedAtDesc,
    UpdatedAtAsc,
    UpdatedAtDesc,
    TitleAsc,
    TitleDesc,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown ordering: {0}")]
pub struct ParsePostOrderingError(pub String);

impl PostOrdering {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostOrdering::CreatedAtAsc => "created_at",
            PostOrdering::CreatedAtDesc => "-created_at",
            PostOrdering::UpdatedAtAsc => "updated_at",
            PostOrdering::UpdatedAtDesc => "-updated_at",
            PostOrdering::TitleAsc => "title",
            PostOrdering::TitleDesc => "-title",
        }
    }
}

impl FromStr for PostOrdering {
    type Err = ParsePostOrderingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "created_at" => Ok(PostOrdering::CreatedAtAsc),
            "-created_at" => Ok(PostOrdering::CreatedAtDesc),
            "updated_at" => Ok(PostOrdering::UpdatedAtAsc),
            "-updated_at" => Ok(PostOrdering::UpdatedAtDesc),
            "title" => Ok(PostOrdering::TitleAsc),
            "-title" => Ok(PostOrdering::TitleDesc),
            other => Err(ParsePostOrderingError(other.to_string())),
        }
    }
}

impl fmt::Display for PostOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-facing filter for post listings. Resolved into a [`PostQuery`] by
/// the service once pagination is known.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub author: Option<UserId>,
    pub search: Option<String>,
    pub ordering: PostOrdering,
}

/// A fully resolved post listing request, as handed to the repository.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    /// Used only to compute `is_liked`.
    pub viewer: Option<UserId>,
    pub authors: AuthorFilter,
    /// Case-insensitive substring match over title, body and author username.
    pub search: Option<String>,
    pub ordering: PostOrdering,
    pub offset: i64,
    pub limit: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_parses_all_variants() {
        for ordering in [
            PostOrdering::CreatedAtAsc,
            PostOrdering::CreatedAtDesc,
            PostOrdering::UpdatedAtAsc,
            PostOrdering::UpdatedAtDesc,
            PostOrdering::TitleAsc,
            PostOrdering::TitleDesc,
        ] {
            assert_eq!(ordering.as_str().parse::<PostOrdering>(), Ok(ordering));
        }
    }

    #[test]
    fn test_ordering_rejects_unknown_field() {
        let err = "-author".parse::<PostOrdering>().unwrap_err();
        assert_eq!(err, ParsePostOrderingError("-author".to_string()));
    }

    #[test]
    fn test_default_ordering_is_newest_first() {
        assert_eq!(PostOrdering::default(), PostOrdering::CreatedAtDesc);
    }
}
