//! Follow graph operations.
use social_repository::RepositoryError;
use social_shared::types::{
    FollowCounts, FollowOutcome, NotificationMatch, PageRequest, Paginated, User, UserId, Verb,
};
use tracing::info;

use crate::errors::SocialError;
use crate::notifications::notification_for;
use crate::service::{now, SocialService};

impl SocialService {
    /// Makes `actor_id` follow `target_id` and notifies the target. The edge
    /// and the notification are stored together or not at all.
    ///
    /// # Arguments
    ///
    /// * `actor_id` - Authenticated user creating the edge
    /// * `target_id` - User to follow
    ///
    /// # Returns
    ///
    /// * `Ok(FollowOutcome)` - Actor's following count and target's followers count
    /// * `Err(SocialError::SelfFollow)` - `actor_id == target_id`; nothing is written
    /// * `Err(SocialError::UserNotFound)` - Unknown target
    /// * `Err(SocialError::AlreadyFollowing)` - Edge already present, including
    ///   the loser of two concurrent follows for the same pair
    pub async fn follow(
        &self,
        actor_id: UserId,
        target_id: UserId,
    ) -> Result<FollowOutcome, SocialError> {
        if actor_id == target_id {
            return Err(SocialError::SelfFollow);
        }
        let target = self.require_user(target_id).await?;

        let notification = notification_for(target_id, actor_id, Verb::Follow, None);
        let created = match self
            .repo
            .insert_follow(actor_id, target_id, now(), notification.as_ref())
            .await
        {
            Ok(created) => created,
            Err(RepositoryError::CheckViolation(_)) => return Err(SocialError::SelfFollow),
            Err(e) => return Err(e.into()),
        };
        if !created {
            return Err(SocialError::AlreadyFollowing(target.username));
        }
        info!(follower_id = %actor_id, followee_id = %target_id, "User followed");

        Ok(FollowOutcome {
            message: format!("You are now following {}.", target.username),
            counts: self.follow_counts(actor_id, target_id).await?,
        })
    }

    /// Removes the `actor_id` → `target_id` edge together with the pending
    /// follow notifications it produced.
    ///
    /// # Returns
    ///
    /// * `Ok(FollowOutcome)` - Counts after the removal
    /// * `Err(SocialError::UserNotFound)` - Unknown target
    /// * `Err(SocialError::NotFollowing)` - No such edge
    pub async fn unfollow(
        &self,
        actor_id: UserId,
        target_id: UserId,
    ) -> Result<FollowOutcome, SocialError> {
        let target = self.require_user(target_id).await?;

        let reversal = NotificationMatch {
            recipient_id: target_id,
            actor_id,
            verb: Verb::Follow,
            target: None,
        };
        let Some(removed) = self
            .repo
            .delete_follow(actor_id, target_id, &reversal)
            .await?
        else {
            return Err(SocialError::NotFollowing(target.username));
        };
        info!(
            follower_id = %actor_id,
            followee_id = %target_id,
            notifications_removed = removed,
            "User unfollowed"
        );

        Ok(FollowOutcome {
            message: format!("You have unfollowed {}.", target.username),
            counts: self.follow_counts(actor_id, target_id).await?,
        })
    }

    pub async fn list_followers(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Paginated<User>, SocialError> {
        self.require_user(user_id).await?;
        let total = self.repo.count_followers(user_id).await?;
        let users = self
            .repo
            .list_followers(user_id, page.offset(), page.limit())
            .await?;
        Ok(Paginated::new(page, total, users))
    }

    pub async fn list_following(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Paginated<User>, SocialError> {
        self.require_user(user_id).await?;
        let total = self.repo.count_following(user_id).await?;
        let users = self
            .repo
            .list_following(user_id, page.offset(), page.limit())
            .await?;
        Ok(Paginated::new(page, total, users))
    }

    async fn follow_counts(
        &self,
        actor_id: UserId,
        target_id: UserId,
    ) -> Result<FollowCounts, SocialError> {
        Ok(FollowCounts {
            following_count: self.repo.count_following(actor_id).await?,
            followers_count: self.repo.count_followers(target_id).await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::errors::ErrorKind;
    use crate::test_support::{first_page, register, service};
    use social_repository::{FollowRepository, NotificationRepository};

    #[tokio::test]
    async fn test_follow_returns_counts_and_notifies() {
        let (service, _) = service();
        let alice = register(&service, "alice").await;
        let bob = register(&service, "bob").await;

        let outcome = service.follow(alice.id, bob.id).await.unwrap();
        assert_eq!(outcome.message, "You are now following bob.");
        assert_eq!(
            outcome.counts,
            FollowCounts {
                following_count: 1,
                followers_count: 1
            }
        );

        let inbox = service
            .list_notifications(bob.id, false, first_page())
            .await
            .unwrap();
        assert_eq!(inbox.count, 1);
        assert_eq!(inbox.results[0].verb, Verb::Follow);
        assert_eq!(inbox.results[0].actor.id, alice.id);
        assert_eq!(inbox.results[0].target, None);
    }

    #[tokio::test]
    async fn test_self_follow_is_conflict_and_writes_nothing() {
        let (service, repo) = service();
        let alice = register(&service, "alice").await;

        let err = service.follow(alice.id, alice.id).await.unwrap_err();
        assert!(matches!(err, SocialError::SelfFollow));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(repo.count_following(alice.id).await.unwrap(), 0);
        assert_eq!(repo.count_notifications(alice.id).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_duplicate_follow_fails_without_second_notification() {
        let (service, repo) = service();
        let alice = register(&service, "alice").await;
        let bob = register(&service, "bob").await;

        service.follow(alice.id, bob.id).await.unwrap();
        let err = service.follow(alice.id, bob.id).await.unwrap_err();
        assert!(matches!(err, SocialError::AlreadyFollowing(ref name) if name == "bob"));
        assert_eq!(repo.count_followers(bob.id).await.unwrap(), 1);
        assert_eq!(repo.count_notifications(bob.id).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_follow_unknown_user_is_not_found() {
        let (service, _) = service();
        let alice = register(&service, "alice").await;

        let err = service.follow(alice.id, 999).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_follow_then_unfollow_restores_prior_state() {
        let (service, repo) = service();
        let alice = register(&service, "alice").await;
        let bob = register(&service, "bob").await;
        let carol = register(&service, "carol").await;
        service.follow(carol.id, bob.id).await.unwrap();

        let followers_before = repo.list_followers(bob.id, 0, 100).await.unwrap();
        let inbox_before = service
            .list_notifications(bob.id, false, first_page())
            .await
            .unwrap();

        service.follow(alice.id, bob.id).await.unwrap();
        let outcome = service.unfollow(alice.id, bob.id).await.unwrap();
        assert_eq!(outcome.counts.following_count, 0);
        assert_eq!(outcome.counts.followers_count, 1);

        assert_eq!(
            repo.list_followers(bob.id, 0, 100).await.unwrap(),
            followers_before
        );
        let inbox_after = service
            .list_notifications(bob.id, false, first_page())
            .await
            .unwrap();
        assert_eq!(inbox_after, inbox_before);
    }

    #[tokio::test]
    async fn test_unfollow_without_edge_is_conflict() {
        let (service, _) = service();
        let alice = register(&service, "alice").await;
        let bob = register(&service, "bob").await;

        let err = service.unfollow(alice.id, bob.id).await.unwrap_err();
        assert!(matches!(err, SocialError::NotFollowing(_)));
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_concurrent_follows_create_one_edge() {
        let (service, repo) = service();
        let service = Arc::new(service);
        let alice = register(&service, "alice").await;
        let bob = register(&service, "bob").await;
        let (alice_id, bob_id) = (alice.id, bob.id);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.follow(alice_id, bob_id).await.is_ok() })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 1);
        assert_eq!(repo.count_followers(bob.id).await.unwrap(), 1);
        assert_eq!(repo.count_notifications(bob.id).await.unwrap().total, 1);
    }

    #[tokio::test]
    async fn test_follower_and_following_lists_are_paginated() {
        let (service, _) = service();
        let target = register(&service, "target").await;
        for name in ["f1", "f2", "f3"] {
            let follower = register(&service, name).await;
            service.follow(follower.id, target.id).await.unwrap();
        }

        let page = service
            .list_followers(target.id, PageRequest::new(2, 2))
            .await
            .unwrap();
        assert_eq!(page.count, 3);
        assert_eq!(page.results.len(), 1);

        let following = service
            .list_following(target.id, first_page())
            .await
            .unwrap();
        assert_eq!(following.count, 0);
        assert!(following.results.is_empty());
    }
}
