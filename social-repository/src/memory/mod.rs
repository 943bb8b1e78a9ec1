//! In-memory implementation of the social repository.
//!
//! All state lives behind one `tokio::sync::Mutex`, so every check-and-insert
//! runs under a single lock and carries the same uniqueness guarantees as the
//! PostgreSQL constraints. Used by the test suites and by the `memory` storage
//! backend.
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use social_shared::types::{
    AuthorFilter, Comment, CommentId, CommentView, FollowEdge, Like, LikeView, NewComment,
    NewNotification, NewPost, NewUser, Notification, NotificationCounts, NotificationId,
    NotificationMatch, NotificationQuery, NotificationRecord, PendingNotification, Post, PostId,
    PostOrdering, PostQuery, PostUpdate, PostView, Target, TargetKind, User, UserId, UserSummary,
    UserUpdate,
};
use tokio::sync::Mutex;

use crate::errors::RepositoryError;
use crate::interfaces::{
    ContentRepository, FollowRepository, NotificationRepository, UserRepository,
};

#[derive(Default)]
struct State {
    next_user_id: i64,
    users: BTreeMap<UserId, User>,
    tokens: HashMap<String, UserId>,
    follows: Vec<FollowEdge>,
    next_post_id: i64,
    posts: BTreeMap<PostId, Post>,
    next_comment_id: i64,
    comments: BTreeMap<CommentId, Comment>,
    likes: Vec<Like>,
    next_notification_id: i64,
    notifications: BTreeMap<NotificationId, Notification>,
}

impl State {
    fn summary(&self, user_id: UserId) -> UserSummary {
        let username = self
            .users
            .get(&user_id)
            .map(|u| u.username.clone())
            .unwrap_or_default();
        UserSummary {
            id: user_id,
            username,
        }
    }

    fn post_view(&self, post: &Post, viewer: Option<UserId>) -> PostView {
        PostView {
            author: self.summary(post.author_id),
            likes_count: self.likes.iter().filter(|l| l.post_id == post.id).count() as i64,
            comments_count: self
                .comments
                .values()
                .filter(|c| c.post_id == post.id)
                .count() as i64,
            is_liked: viewer.is_some_and(|v| {
                self.likes
                    .iter()
                    .any(|l| l.post_id == post.id && l.user_id == v)
            }),
            post: post.clone(),
        }
    }

    fn follows(&self, follower_id: UserId, followee_id: UserId) -> bool {
        self.follows
            .iter()
            .any(|e| e.follower_id == follower_id && e.followee_id == followee_id)
    }

    fn matches_post(&self, post: &Post, query: &PostQuery, needle: Option<&str>) -> bool {
        let author_ok = match query.authors {
            AuthorFilter::Any => true,
            AuthorFilter::Author(author_id) => post.author_id == author_id,
            AuthorFilter::FollowedBy(viewer_id) => self.follows(viewer_id, post.author_id),
        };
        if !author_ok {
            return false;
        }

        match needle {
            None => true,
            Some(needle) => {
                let username = self
                    .users
                    .get(&post.author_id)
                    .map(|u| u.username.to_lowercase())
                    .unwrap_or_default();
                post.title.to_lowercase().contains(needle)
                    || post.body.to_lowercase().contains(needle)
                    || username.contains(needle)
            }
        }
    }

    fn notifications_for(&self, recipient_id: UserId) -> impl Iterator<Item = &Notification> {
        self.notifications
            .values()
            .filter(move |n| n.recipient_id == recipient_id)
    }

    fn push_notification(&mut self, notification: NewNotification) {
        self.next_notification_id += 1;
        let id = self.next_notification_id;
        self.notifications.insert(
            id,
            Notification {
                id,
                recipient_id: notification.recipient_id,
                actor_id: notification.actor_id,
                verb: notification.verb,
                target: notification.target,
                is_read: false,
                created_at: notification.created_at,
                read_at: None,
            },
        );
    }

    fn push_pending(
        &mut self,
        actor_id: UserId,
        target: Target,
        created_at: DateTime<Utc>,
        pending: &[PendingNotification],
    ) {
        for notification in pending {
            self.push_notification(notification.into_new(actor_id, target, created_at));
        }
    }

    /// Drops every notification for which `remove` holds and returns how many went.
    fn remove_notifications(&mut self, remove: impl Fn(&Notification) -> bool) -> u64 {
        let before = self.notifications.len();
        self.notifications.retain(|_, n| !remove(&*n));
        (before - self.notifications.len()) as u64
    }
}

/// Titles compare bytewise, like the `COLLATE "C"` ordering in PostgreSQL.
fn compare_posts(ordering: PostOrdering, a: &Post, b: &Post) -> Ordering {
    match ordering {
        PostOrdering::CreatedAtAsc => a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)),
        PostOrdering::CreatedAtDesc => b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)),
        PostOrdering::UpdatedAtAsc => a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)),
        PostOrdering::UpdatedAtDesc => b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)),
        PostOrdering::TitleAsc => a.title.cmp(&b.title).then(b.id.cmp(&a.id)),
        PostOrdering::TitleDesc => b.title.cmp(&a.title).then(b.id.cmp(&a.id)),
    }
}

fn page<T>(items: impl Iterator<Item = T>, offset: i64, limit: i64) -> Vec<T> {
    items
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

/// In-memory implementation of every social repository trait.
#[derive(Default)]
pub struct InMemorySocialRepository {
    state: Mutex<State>,
}

impl InMemorySocialRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemorySocialRepository {
    async fn insert_user(
        &self,
        user: &NewUser,
        created_at: DateTime<Utc>,
    ) -> Result<User, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::Conflict("users_username_key".to_string()));
        }

        state.next_user_id += 1;
        let stored = User {
            id: state.next_user_id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            bio: user.bio.clone(),
            created_at,
        };
        state.users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn get_users_by_usernames(
        &self,
        usernames: &[String],
    ) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .filter(|u| usernames.contains(&u.username))
            .cloned()
            .collect())
    }

    async fn update_user(
        &self,
        id: UserId,
        update: &UserUpdate,
    ) -> Result<Option<User>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(display_name) = &update.display_name {
            user.display_name = display_name.clone();
        }
        if let Some(bio) = &update.bio {
            user.bio = bio.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn list_users(&self, offset: i64, limit: i64) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(page(state.users.values().cloned(), offset, limit))
    }

    async fn count_users(&self) -> Result<i64, RepositoryError> {
        Ok(self.state.lock().await.users.len() as i64)
    }

    async fn insert_token(
        &self,
        token: &str,
        user_id: UserId,
        _created_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.tokens.contains_key(token) {
            return Err(RepositoryError::Conflict("auth_tokens_pkey".to_string()));
        }
        state.tokens.insert(token.to_string(), user_id);
        Ok(())
    }

    async fn resolve_token(&self, token: &str) -> Result<Option<UserId>, RepositoryError> {
        Ok(self.state.lock().await.tokens.get(token).copied())
    }

    async fn delete_tokens_for_user(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let before = state.tokens.len();
        state.tokens.retain(|_, owner| *owner != user_id);
        Ok((before - state.tokens.len()) as u64)
    }
}

#[async_trait]
impl FollowRepository for InMemorySocialRepository {
    async fn insert_follow(
        &self,
        follower_id: UserId,
        followee_id: UserId,
        created_at: DateTime<Utc>,
        notification: Option<&NewNotification>,
    ) -> Result<bool, RepositoryError> {
        if follower_id == followee_id {
            return Err(RepositoryError::CheckViolation(
                "follows_irreflexive".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        if state.follows(follower_id, followee_id) {
            return Ok(false);
        }
        state.follows.push(FollowEdge {
            follower_id,
            followee_id,
            created_at,
        });
        if let Some(notification) = notification {
            state.push_notification(notification.clone());
        }
        Ok(true)
    }

    async fn delete_follow(
        &self,
        follower_id: UserId,
        followee_id: UserId,
        reversal: &NotificationMatch,
    ) -> Result<Option<u64>, RepositoryError> {
        let mut state = self.state.lock().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|e| !(e.follower_id == follower_id && e.followee_id == followee_id));
        if state.follows.len() == before {
            return Ok(None);
        }
        Ok(Some(state.remove_notifications(|n| reversal.matches(n))))
    }

    async fn is_following(
        &self,
        follower_id: UserId,
        followee_id: UserId,
    ) -> Result<bool, RepositoryError> {
        Ok(self.state.lock().await.follows(follower_id, followee_id))
    }

    async fn count_following(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.follows.iter().filter(|e| e.follower_id == user_id).count() as i64)
    }

    async fn count_followers(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.follows.iter().filter(|e| e.followee_id == user_id).count() as i64)
    }

    async fn list_following(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.lock().await;
        let mut edges: Vec<&FollowEdge> = state
            .follows
            .iter()
            .filter(|e| e.follower_id == user_id)
            .collect();
        edges.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.followee_id.cmp(&b.followee_id))
        });
        let users = edges
            .into_iter()
            .filter_map(|e| state.users.get(&e.followee_id).cloned());
        Ok(page(users, offset, limit))
    }

    async fn list_followers(
        &self,
        user_id: UserId,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<User>, RepositoryError> {
        let state = self.state.lock().await;
        let mut edges: Vec<&FollowEdge> = state
            .follows
            .iter()
            .filter(|e| e.followee_id == user_id)
            .collect();
        edges.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.follower_id.cmp(&b.follower_id))
        });
        let users = edges
            .into_iter()
            .filter_map(|e| state.users.get(&e.follower_id).cloned());
        Ok(page(users, offset, limit))
    }
}

#[async_trait]
impl ContentRepository for InMemorySocialRepository {
    async fn insert_post(
        &self,
        post: &NewPost,
        notifications: &[PendingNotification],
    ) -> Result<Post, RepositoryError> {
        let mut state = self.state.lock().await;
        state.next_post_id += 1;
        let stored = Post {
            id: state.next_post_id,
            author_id: post.author_id,
            title: post.title.clone(),
            body: post.body.clone(),
            created_at: post.created_at,
            updated_at: post.created_at,
        };
        state.posts.insert(stored.id, stored.clone());
        state.push_pending(
            stored.author_id,
            Target::post(stored.id),
            stored.created_at,
            notifications,
        );
        Ok(stored)
    }

    async fn get_post(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        Ok(self.state.lock().await.posts.get(&id).cloned())
    }

    async fn get_post_view(
        &self,
        id: PostId,
        viewer: Option<UserId>,
    ) -> Result<Option<PostView>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.posts.get(&id).map(|p| state.post_view(p, viewer)))
    }

    async fn update_post(
        &self,
        id: PostId,
        update: &PostUpdate,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Post>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = &update.title {
            post.title = title.clone();
        }
        if let Some(body) = &update.body {
            post.body = body.clone();
        }
        post.updated_at = updated_at;
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: PostId) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.posts.remove(&id).is_none() {
            return Ok(false);
        }

        let comment_ids: Vec<CommentId> = state
            .comments
            .values()
            .filter(|c| c.post_id == id)
            .map(|c| c.id)
            .collect();
        state.comments.retain(|_, c| c.post_id != id);
        state.likes.retain(|l| l.post_id != id);
        state.remove_notifications(|n| match n.target {
            Some(Target {
                kind: TargetKind::Post,
                id: target_id,
            }) => target_id == id,
            Some(Target {
                kind: TargetKind::Comment,
                id: target_id,
            }) => comment_ids.contains(&target_id),
            None => false,
        });
        Ok(true)
    }

    async fn query_posts(
        &self,
        query: &PostQuery,
    ) -> Result<(Vec<PostView>, i64), RepositoryError> {
        let state = self.state.lock().await;
        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase);

        let mut matching: Vec<&Post> = state
            .posts
            .values()
            .filter(|p| state.matches_post(p, query, needle.as_deref()))
            .collect();
        matching.sort_by(|a, b| compare_posts(query.ordering, a, b));

        let total = matching.len() as i64;
        let views = page(
            matching.into_iter().map(|p| state.post_view(p, query.viewer)),
            query.offset,
            query.limit,
        );
        Ok((views, total))
    }

    async fn insert_comment(
        &self,
        comment: &NewComment,
        notifications: &[PendingNotification],
    ) -> Result<Comment, RepositoryError> {
        let mut state = self.state.lock().await;
        state.next_comment_id += 1;
        let stored = Comment {
            id: state.next_comment_id,
            post_id: comment.post_id,
            author_id: comment.author_id,
            body: comment.body.clone(),
            created_at: comment.created_at,
            updated_at: comment.created_at,
        };
        state.comments.insert(stored.id, stored.clone());
        state.push_pending(
            stored.author_id,
            Target::comment(stored.id),
            stored.created_at,
            notifications,
        );
        Ok(stored)
    }

    async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, RepositoryError> {
        Ok(self.state.lock().await.comments.get(&id).cloned())
    }

    async fn update_comment(
        &self,
        id: CommentId,
        body: &str,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<Comment>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(comment) = state.comments.get_mut(&id) else {
            return Ok(None);
        };
        comment.body = body.to_string();
        comment.updated_at = updated_at;
        Ok(Some(comment.clone()))
    }

    async fn delete_comment(&self, id: CommentId) -> Result<Option<u64>, RepositoryError> {
        let mut state = self.state.lock().await;
        if state.comments.remove(&id).is_none() {
            return Ok(None);
        }
        let target = Some(Target::comment(id));
        Ok(Some(state.remove_notifications(|n| n.target == target)))
    }

    async fn list_comments(
        &self,
        post_id: PostId,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<CommentView>, i64), RepositoryError> {
        let state = self.state.lock().await;
        let mut comments: Vec<&Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));

        let total = comments.len() as i64;
        let views = page(
            comments.into_iter().map(|c| CommentView {
                author: state.summary(c.author_id),
                comment: c.clone(),
            }),
            offset,
            limit,
        );
        Ok((views, total))
    }

    async fn insert_like(
        &self,
        user_id: UserId,
        post_id: PostId,
        created_at: DateTime<Utc>,
        notification: Option<&NewNotification>,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        if state
            .likes
            .iter()
            .any(|l| l.user_id == user_id && l.post_id == post_id)
        {
            return Ok(false);
        }
        state.likes.push(Like {
            user_id,
            post_id,
            created_at,
        });
        if let Some(notification) = notification {
            state.push_notification(notification.clone());
        }
        Ok(true)
    }

    async fn delete_like(
        &self,
        user_id: UserId,
        post_id: PostId,
        reversal: &NotificationMatch,
    ) -> Result<Option<u64>, RepositoryError> {
        let mut state = self.state.lock().await;
        let before = state.likes.len();
        state
            .likes
            .retain(|l| !(l.user_id == user_id && l.post_id == post_id));
        if state.likes.len() == before {
            return Ok(None);
        }
        Ok(Some(state.remove_notifications(|n| reversal.matches(n))))
    }

    async fn count_likes(&self, post_id: PostId) -> Result<i64, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.likes.iter().filter(|l| l.post_id == post_id).count() as i64)
    }

    async fn list_likes(
        &self,
        post_id: PostId,
        offset: i64,
        limit: i64,
    ) -> Result<(Vec<LikeView>, i64), RepositoryError> {
        let state = self.state.lock().await;
        let mut likes: Vec<&Like> = state.likes.iter().filter(|l| l.post_id == post_id).collect();
        likes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.user_id.cmp(&a.user_id)));

        let total = likes.len() as i64;
        let views = page(
            likes.into_iter().map(|l| LikeView {
                user: state.summary(l.user_id),
                post_id: l.post_id,
                created_at: l.created_at,
            }),
            offset,
            limit,
        );
        Ok((views, total))
    }
}

#[async_trait]
impl NotificationRepository for InMemorySocialRepository {
    async fn list_notifications(
        &self,
        query: &NotificationQuery,
    ) -> Result<(Vec<NotificationRecord>, i64), RepositoryError> {
        let state = self.state.lock().await;
        let mut matching: Vec<&Notification> = state
            .notifications_for(query.recipient_id)
            .filter(|n| !query.unread_only || !n.is_read)
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let records = page(
            matching.into_iter().map(|n| NotificationRecord {
                actor: state.summary(n.actor_id),
                notification: n.clone(),
            }),
            query.offset,
            query.limit,
        );
        Ok((records, total))
    }

    async fn count_notifications(
        &self,
        recipient_id: UserId,
    ) -> Result<NotificationCounts, RepositoryError> {
        let state = self.state.lock().await;
        let (total, unread) = state
            .notifications_for(recipient_id)
            .fold((0, 0), |(total, unread), n| {
                (total + 1, unread + i64::from(!n.is_read))
            });
        Ok(NotificationCounts { total, unread })
    }

    async fn set_read_state(
        &self,
        recipient_id: UserId,
        ids: &[NotificationId],
        read: bool,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let mut matched = 0;
        for notification in state.notifications.values_mut() {
            if notification.recipient_id != recipient_id || !ids.contains(&notification.id) {
                continue;
            }
            matched += 1;
            if notification.is_read != read {
                notification.is_read = read;
                notification.read_at = read.then_some(at);
            }
        }
        Ok(matched)
    }

    async fn mark_all_read(
        &self,
        recipient_id: UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().await;
        let mut changed = 0;
        for notification in state.notifications.values_mut() {
            if notification.recipient_id == recipient_id && !notification.is_read {
                notification.is_read = true;
                notification.read_at = Some(at);
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn toggle_read(
        &self,
        recipient_id: UserId,
        id: NotificationId,
        at: DateTime<Utc>,
    ) -> Result<Option<bool>, RepositoryError> {
        let mut state = self.state.lock().await;
        let Some(notification) = state
            .notifications
            .get_mut(&id)
            .filter(|n| n.recipient_id == recipient_id)
        else {
            return Ok(None);
        };
        notification.is_read = !notification.is_read;
        notification.read_at = notification.is_read.then_some(at);
        Ok(Some(notification.is_read))
    }
}
