//! Like, unlike and toggle-like.
use social_shared::types::{
    LikeOutcome, LikeStatus, LikeView, NotificationMatch, PageRequest, Paginated, Post, PostId,
    Target, UserId, Verb,
};
use tracing::info;

use crate::errors::SocialError;
use crate::notifications::notification_for;
use crate::service::{now, SocialService};

impl SocialService {
    /// Likes a post and notifies its author. The like and its notification
    /// are stored together or not at all.
    ///
    /// # Returns
    ///
    /// * `Ok(LikeOutcome)` - `liked` with the post's like count
    /// * `Err(SocialError::PostNotFound)` - Unknown post
    /// * `Err(SocialError::AlreadyLiked)` - Like already present
    pub async fn like(&self, user_id: UserId, post_id: PostId) -> Result<LikeOutcome, SocialError> {
        let post = self.require_post(post_id).await?;

        if !self.store_like(&post, user_id).await? {
            return Err(SocialError::AlreadyLiked);
        }
        info!(user_id = %user_id, post_id = %post_id, "Post liked");

        self.like_outcome(post_id, LikeStatus::Liked).await
    }

    /// Removes a like and the notification it produced.
    ///
    /// # Returns
    ///
    /// * `Ok(LikeOutcome)` - `unliked` with the post's like count
    /// * `Err(SocialError::PostNotFound)` - Unknown post
    /// * `Err(SocialError::NotLiked)` - No like to remove
    pub async fn unlike(
        &self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<LikeOutcome, SocialError> {
        let post = self.require_post(post_id).await?;

        if self.remove_like(&post, user_id).await?.is_none() {
            return Err(SocialError::NotLiked);
        }
        info!(user_id = %user_id, post_id = %post_id, "Post unliked");

        self.like_outcome(post_id, LikeStatus::Unliked).await
    }

    /// Alternates between liked and not liked. Never fails on state.
    ///
    /// An existing like is removed together with its notification; otherwise
    /// a like is created and the author is notified unless it is a self-like.
    pub async fn toggle_like(
        &self,
        user_id: UserId,
        post_id: PostId,
    ) -> Result<LikeOutcome, SocialError> {
        let post = self.require_post(post_id).await?;

        if self.remove_like(&post, user_id).await?.is_some() {
            info!(user_id = %user_id, post_id = %post_id, "Post like toggled off");
            return self.like_outcome(post_id, LikeStatus::Unliked).await;
        }

        // A concurrent toggle may have inserted the row first; its notification stands.
        self.store_like(&post, user_id).await?;
        info!(user_id = %user_id, post_id = %post_id, "Post like toggled on");
        self.like_outcome(post_id, LikeStatus::Liked).await
    }

    /// Lists who liked a post, most recent first.
    pub async fn list_likes(
        &self,
        post_id: PostId,
        page: PageRequest,
    ) -> Result<Paginated<LikeView>, SocialError> {
        self.require_post(post_id).await?;
        let (likes, total) = self
            .repo
            .list_likes(post_id, page.offset(), page.limit())
            .await?;
        Ok(Paginated::new(page, total, likes))
    }

    /// Inserts the like with the author's notification. Returns `false` when
    /// the like already existed.
    async fn store_like(&self, post: &Post, user_id: UserId) -> Result<bool, SocialError> {
        let notification =
            notification_for(post.author_id, user_id, Verb::Like, Some(Target::post(post.id)));
        Ok(self
            .repo
            .insert_like(user_id, post.id, now(), notification.as_ref())
            .await?)
    }

    /// Removes the like with its notification. Returns `None` when there was
    /// no like.
    async fn remove_like(
        &self,
        post: &Post,
        user_id: UserId,
    ) -> Result<Option<u64>, SocialError> {
        let reversal = NotificationMatch {
            recipient_id: post.author_id,
            actor_id: user_id,
            verb: Verb::Like,
            target: Some(Target::post(post.id)),
        };
        Ok(self.repo.delete_like(user_id, post.id, &reversal).await?)
    }

    async fn like_outcome(
        &self,
        post_id: PostId,
        status: LikeStatus,
    ) -> Result<LikeOutcome, SocialError> {
        Ok(LikeOutcome {
            status,
            likes_count: self.repo.count_likes(post_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use social_repository::{ContentRepository, NotificationRepository};
    use social_shared::types::NotificationQuery;

    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_support::{first_page, register, service};

    async fn like_notifications(
        repo: &social_repository::InMemorySocialRepository,
        recipient_id: UserId,
    ) -> usize {
        let (records, _) = repo
            .list_notifications(&NotificationQuery {
                recipient_id,
                unread_only: false,
                offset: 0,
                limit: 100,
            })
            .await
            .unwrap();
        records
            .iter()
            .filter(|r| r.notification.verb == Verb::Like)
            .count()
    }

    #[tokio::test]
    async fn test_like_then_unlike_removes_notification() {
        let (service, repo) = service();
        let u1 = register(&service, "u1").await;
        let u2 = register(&service, "u2").await;
        let post = service
            .create_post(u2.id, "P".to_string(), "body".to_string())
            .await
            .unwrap();

        let outcome = service.like(u1.id, post.post.id).await.unwrap();
        assert_eq!(outcome.status, LikeStatus::Liked);
        assert_eq!(outcome.likes_count, 1);

        let inbox = service
            .list_notifications(u2.id, false, first_page())
            .await
            .unwrap();
        assert_eq!(inbox.count, 1);
        assert_eq!(inbox.results[0].verb, Verb::Like);
        assert_eq!(inbox.results[0].actor.id, u1.id);
        assert_eq!(inbox.results[0].target, Some(Target::post(post.post.id)));

        let outcome = service.unlike(u1.id, post.post.id).await.unwrap();
        assert_eq!(outcome.status, LikeStatus::Unliked);
        assert_eq!(outcome.likes_count, 0);
        assert_eq!(like_notifications(&repo, u2.id).await, 0);
    }

    #[tokio::test]
    async fn test_like_state_transitions_fail_explicitly() {
        let (service, _) = service();
        let u1 = register(&service, "u1").await;
        let u2 = register(&service, "u2").await;
        let post = service
            .create_post(u2.id, "P".to_string(), "body".to_string())
            .await
            .unwrap();

        let err = service.unlike(u1.id, post.post.id).await.unwrap_err();
        assert!(matches!(err, SocialError::NotLiked));

        service.like(u1.id, post.post.id).await.unwrap();
        let err = service.like(u1.id, post.post.id).await.unwrap_err();
        assert!(matches!(err, SocialError::AlreadyLiked));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = service.like(u1.id, 404).await.unwrap_err();
        assert!(matches!(err, SocialError::PostNotFound(404)));
    }

    #[tokio::test]
    async fn test_toggle_twice_returns_to_baseline() {
        let (service, repo) = service();
        let u1 = register(&service, "u1").await;
        let u2 = register(&service, "u2").await;
        let u3 = register(&service, "u3").await;
        let post = service
            .create_post(u2.id, "P".to_string(), "body".to_string())
            .await
            .unwrap();
        service.like(u3.id, post.post.id).await.unwrap();

        let on = service.toggle_like(u1.id, post.post.id).await.unwrap();
        assert_eq!(on.status, LikeStatus::Liked);
        assert_eq!(on.likes_count, 2);
        assert_eq!(like_notifications(&repo, u2.id).await, 2);

        let off = service.toggle_like(u1.id, post.post.id).await.unwrap();
        assert_eq!(off.status, LikeStatus::Unliked);
        assert_eq!(off.likes_count, 1);
        assert_eq!(like_notifications(&repo, u2.id).await, 1);

        let view = service
            .get_post(Some(u1.id), post.post.id)
            .await
            .unwrap();
        assert!(!view.is_liked);
    }

    #[tokio::test]
    async fn test_concurrent_likes_store_one_row_and_one_notification() {
        let (service, repo) = service();
        let author = register(&service, "author").await;
        let fan = register(&service, "fan").await;
        let post = service
            .create_post(author.id, "P".to_string(), "body".to_string())
            .await
            .unwrap();
        let (fan_id, post_id) = (fan.id, post.post.id);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.like(fan_id, post_id).await })
            })
            .collect();

        let mut liked = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => liked += 1,
                Err(err) => assert!(matches!(err, SocialError::AlreadyLiked)),
            }
        }
        assert_eq!(liked, 1);
        assert_eq!(repo.count_likes(post.post.id).await.unwrap(), 1);
        assert_eq!(like_notifications(&repo, author.id).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_toggles_keep_like_and_notification_in_step() {
        let (service, repo) = service();
        let author = register(&service, "author").await;
        let fan = register(&service, "fan").await;
        let post = service
            .create_post(author.id, "P".to_string(), "body".to_string())
            .await
            .unwrap();
        let (fan_id, post_id) = (fan.id, post.post.id);

        for round in 1..=6 {
            let handles: Vec<_> = (0..round)
                .map(|_| {
                    let service = service.clone();
                    tokio::spawn(async move { service.toggle_like(fan_id, post_id).await })
                })
                .collect();
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            let likes = repo.count_likes(post.post.id).await.unwrap();
            assert!(likes <= 1);
            assert_eq!(like_notifications(&repo, author.id).await as i64, likes);
        }
    }

    #[tokio::test]
    async fn test_self_like_creates_no_notification() {
        let (service, repo) = service();
        let author = register(&service, "author").await;
        let post = service
            .create_post(author.id, "mine".to_string(), "body".to_string())
            .await
            .unwrap();

        let outcome = service.like(author.id, post.post.id).await.unwrap();
        assert_eq!(outcome.likes_count, 1);
        assert_eq!(repo.count_notifications(author.id).await.unwrap().total, 0);

        let outcome = service.toggle_like(author.id, post.post.id).await.unwrap();
        assert_eq!(outcome.status, LikeStatus::Unliked);
        let outcome = service.toggle_like(author.id, post.post.id).await.unwrap();
        assert_eq!(outcome.status, LikeStatus::Liked);
        assert_eq!(repo.count_notifications(author.id).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_list_likes_shows_users() {
        let (service, _) = service();
        let author = register(&service, "author").await;
        let fan = register(&service, "fan").await;
        let post = service
            .create_post(author.id, "t".to_string(), "body".to_string())
            .await
            .unwrap();
        service.like(fan.id, post.post.id).await.unwrap();

        let likes = service.list_likes(post.post.id, first_page()).await.unwrap();
        assert_eq!(likes.count, 1);
        assert_eq!(likes.results[0].user.username, "fan");
    }
}
