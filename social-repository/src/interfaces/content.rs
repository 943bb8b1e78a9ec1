//! This module defines the `ContentRepository` trait covering posts, comments
//! and likes.
use chrono::{DateTime, Utc};
use social_shared::types::{
    Comment, CommentId, CommentView, LikeView, NewComment, NewNotification, NewPost,
    NotificationMatch, PendingNotification, Post, PostId, PostQuery, PostUpdate, PostView, UserId,
};

use crate::errors::RepositoryError;

/// A trait that defines the interface for the content store.
///
/// Like counts and comment counts are never stored; implementors derive them
/// by cardinality whenever a `PostView` is produced.
#[async_trait::async_trait]
pub trait ContentRepository: Send + Sync {
    /// Inserts a post and the notifications it produces in one transaction.
    /// Each notification targets the new post.
    async fn insert_post(
        &self,
        post: &NewPost,
        notifications: &[PendingNotification],
    ) -> Result<Post, RepositoryError>;

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, RepositoryError>;

    /// Fetches a single post with author, counts and the viewer's like state.
    async fn get_post_view(
        &self,
        id: PostId,
        viewer: Option<UserId>,
    ) -> Result<Option<PostView>, RepositoryError>;

    async fn update_post(
        &self,
        id: PostId,
        update: &PostUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, RepositoryError>;

    /// Deletes a post atomically together with its comments, its likes and every
    /// notification targeting the post or one of its comments.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The post existed and was removed
    /// * `Ok(false)` - No such post
    async fn delete_post(&self, id: PostId) -> Result<bool, RepositoryError>;

    /// Runs a filtered, ordered, paginated post listing.
    ///
    /// # Returns
    ///
    /// The requested page and the total number of matching posts.
    async fn query_posts(
        &self,
        query: &PostQuery,
    ) -> Result<(Vec<PostView>, i64), RepositoryError>;

    /// Inserts a comment and the notifications it produces in one transaction.
    /// Each notification targets the new comment.
    async fn insert_comment(
        &self,
        comment: &NewComment,
        notifications: &[PendingNotification],
    ) -> Result<Comment, RepositoryError>;

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError>;

    async fn update_comment(
        &self,
        id: CommentId,
        body: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, RepositoryError>;

    /// Deletes a comment atomically together with every notification targeting it.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(n))` - The comment was removed along with `n` notifications
    /// * `Ok(None)` - No such comment
    async fn delete_comment(&self, id: CommentId) -> Result<Option<u64>, RepositoryError>;

    /// Comments of a post, oldest first, with the total count.
    async fn list_comments(
        &self,
        post_id: PostId,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<CommentView>, i64), RepositoryError>;

    /// Inserts a like and, in the same transaction, its notification.
    ///
    /// Returns `false` if the (user, post) pair already existed, in which case
    /// the notification is not written either.
    async fn insert_like(
        &self,
        user_id: UserId,
        post_id: PostId,
        created_at: DateTime<Utc>,
        notification: Option<&NewNotification>,
    ) -> Result<bool, RepositoryError>;

    /// Removes a like together with the notifications matching `reversal`.
    ///
    /// Returns `None` if there was no like to remove, otherwise the number of
    /// notifications removed with it.
    async fn delete_like(
        &self,
        user_id: UserId,
        post_id: PostId,
        reversal: &NotificationMatch,
    ) -> Result<Option<u64>, RepositoryError>;

    async fn count_likes(&self, post_id: PostId) -> Result<i64, RepositoryError>;

    /// Likes of a post, newest first, with the total count.
    async fn list_likes(
        &self,
        post_id: PostId,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<LikeView>, i64), RepositoryError>;
}
