//! Domain errors for the social service.
//!
//! Every variant is classified by [`ErrorKind`] so outer layers can map a
//! failure onto a response status without matching on individual variants.
use social_repository::RepositoryError;
use social_shared::types::{CommentId, NotificationId, PostId, UserId};
use thiserror::Error;

/// Coarse classification of a [`SocialError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown user, post, comment or notification id.
    NotFound,
    /// Domain rule violation such as a self-follow or a duplicate edge.
    Conflict,
    /// Missing credentials or acting on another user's resource.
    Auth,
    /// Malformed input.
    Validation,
    /// Unexpected storage failure.
    Internal,
}

#[derive(Debug, Error)]
pub enum SocialError {
    #[error("User {0} not found.")]
    UserNotFound(UserId),

    #[error("Post {0} not found.")]
    PostNotFound(PostId),

    #[error("Comment {0} not found.")]
    CommentNotFound(CommentId),

    #[error("Notification {0} not found.")]
    NotificationNotFound(NotificationId),

    #[error("You cannot follow yourself.")]
    SelfFollow,

    #[error("You are already following {0}.")]
    AlreadyFollowing(String),

    #[error("You are not following {0}.")]
    NotFollowing(String),

    #[error("You have already liked this post.")]
    AlreadyLiked,

    #[error("You have not liked this post.")]
    NotLiked,

    #[error("A user with username {0} already exists.")]
    UsernameTaken(String),

    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl SocialError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SocialError::UserNotFound(_)
            | SocialError::PostNotFound(_)
            | SocialError::CommentNotFound(_)
            | SocialError::NotificationNotFound(_) => ErrorKind::NotFound,
            SocialError::SelfFollow
            | SocialError::AlreadyFollowing(_)
            | SocialError::NotFollowing(_)
            | SocialError::AlreadyLiked
            | SocialError::NotLiked
            | SocialError::UsernameTaken(_) => ErrorKind::Conflict,
            SocialError::Unauthenticated | SocialError::Forbidden(_) => ErrorKind::Auth,
            SocialError::Validation(_) => ErrorKind::Validation,
            SocialError::Repository(_) => ErrorKind::Internal,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_follow_taxonomy() {
        assert_eq!(SocialError::PostNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(SocialError::SelfFollow.kind(), ErrorKind::Conflict);
        assert_eq!(SocialError::NotLiked.kind(), ErrorKind::Conflict);
        assert_eq!(SocialError::Unauthenticated.kind(), ErrorKind::Auth);
        assert_eq!(SocialError::forbidden("no").kind(), ErrorKind::Auth);
        assert_eq!(SocialError::validation("bad").kind(), ErrorKind::Validation);
        assert_eq!(
            SocialError::from(RepositoryError::Conflict("x".to_string())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_messages_name_the_target() {
        assert_eq!(
            SocialError::AlreadyFollowing("bob".to_string()).to_string(),
            "You are already following bob."
        );
        assert_eq!(SocialError::SelfFollow.to_string(), "You cannot follow yourself.");
    }
}
