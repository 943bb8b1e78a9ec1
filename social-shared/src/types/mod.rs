mod comment;
mod follow;
mod like;
mod notification;
mod page;
mod post;
mod user;

pub use comment::{Comment, CommentUpdate, CommentView, NewComment};
pub use follow::{FollowCounts, FollowEdge, FollowOutcome};
pub use like::{Like, LikeOutcome, LikeStatus, LikeView};
pub use notification::{
    NewNotification, Notification, NotificationCounts, NotificationMatch, NotificationQuery,
    NotificationRecord, NotificationView, ParseTargetKindError, ParseVerbError,
    PendingNotification, Target, TargetKind, Verb,
};
pub use page::{FeedPage, PageRequest, Paginated};
pub use post::{
    AuthorFilter, NewPost, ParsePostOrderingError, Post, PostFilter, PostOrdering, PostQuery,
    PostUpdate, PostView,
};
pub use user::{NewUser, Registration, User, UserProfile, UserSummary, UserUpdate};

/// Identifier of a user account.
pub type UserId = i64;
/// Identifier of a post.
pub type PostId = i64;
/// Identifier of a comment.
pub type CommentId = i64;
/// Identifier of a notification.
pub type NotificationId = i64;
