//! Feed assembly.
use social_shared::types::{AuthorFilter, FeedPage, PageRequest, PostOrdering, PostQuery, UserId};
use tracing::debug;

use crate::errors::SocialError;
use crate::service::SocialService;

impl SocialService {
    /// Returns one page of posts authored by the users `viewer_id` follows,
    /// newest first with ties broken by descending post id.
    ///
    /// The viewer's own posts never appear since follow edges are irreflexive.
    /// A viewer who follows nobody gets an empty page, not an error. Totals are
    /// computed per request.
    pub async fn get_feed(
        &self,
        viewer_id: UserId,
        page: PageRequest,
    ) -> Result<FeedPage, SocialError> {
        let following_count = self.repo.count_following(viewer_id).await?;
        if following_count == 0 {
            return Ok(FeedPage {
                posts: Vec::new(),
                total: 0,
                following_count,
                page: page.page,
                page_size: page.page_size,
            });
        }

        let (posts, total) = self
            .repo
            .query_posts(&PostQuery {
                viewer: Some(viewer_id),
                authors: AuthorFilter::FollowedBy(viewer_id),
                search: None,
                ordering: PostOrdering::CreatedAtDesc,
                offset: page.offset(),
                limit: page.limit(),
            })
            .await?;

        debug!(
            user_id = %viewer_id,
            following_count,
            total,
            returned = posts.len(),
            "Feed assembled"
        );

        Ok(FeedPage {
            posts,
            total,
            following_count,
            page: page.page,
            page_size: page.page_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use social_repository::ContentRepository;
    use social_shared::types::{NewPost, Post, PostId};

    use super::*;
    use crate::test_support::{first_page, register, service};

    async fn post_at(
        repo: &social_repository::InMemorySocialRepository,
        author_id: UserId,
        title: &str,
        offset_secs: i64,
    ) -> Post {
        repo.insert_post(
            &NewPost {
                author_id,
                title: title.to_string(),
                body: "body".to_string(),
                created_at: Utc::now() + Duration::seconds(offset_secs),
            },
            &[],
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_feed_lists_followed_posts_newest_first() {
        let (service, repo) = service();
        let u1 = register(&service, "u1").await;
        let u2 = register(&service, "u2").await;
        service.follow(u1.id, u2.id).await.unwrap();

        let p = post_at(&repo, u2.id, "P", 0).await;
        let q = post_at(&repo, u2.id, "Q", 30).await;

        let feed = service.get_feed(u1.id, first_page()).await.unwrap();
        let ids: Vec<PostId> = feed.posts.iter().map(|v| v.post.id).collect();
        assert_eq!(ids, vec![q.id, p.id]);
        assert_eq!(feed.following_count, 1);
        assert_eq!(feed.total, 2);
    }

    #[tokio::test]
    async fn test_feed_is_sorted_union_of_followed_authors() {
        let (service, repo) = service();
        let viewer = register(&service, "viewer").await;
        let b = register(&service, "b").await;
        let c = register(&service, "c").await;
        let d = register(&service, "d").await;
        service.follow(viewer.id, b.id).await.unwrap();
        service.follow(viewer.id, c.id).await.unwrap();

        let mut expected = vec![
            post_at(&repo, b.id, "b1", 5).await,
            post_at(&repo, c.id, "c1", 5).await,
            post_at(&repo, b.id, "b2", 1).await,
            post_at(&repo, c.id, "c2", 9).await,
        ];
        post_at(&repo, d.id, "d1", 20).await;
        post_at(&repo, viewer.id, "own", 20).await;
        expected.sort_by(|x, y| y.created_at.cmp(&x.created_at).then(y.id.cmp(&x.id)));

        let feed = service.get_feed(viewer.id, first_page()).await.unwrap();
        let got: Vec<PostId> = feed.posts.iter().map(|v| v.post.id).collect();
        let want: Vec<PostId> = expected.iter().map(|p| p.id).collect();
        assert_eq!(got, want);
        assert_eq!(feed.total, 4);
        assert_eq!(feed.following_count, 2);
    }

    #[tokio::test]
    async fn test_feed_without_follows_is_empty() {
        let (service, repo) = service();
        let viewer = register(&service, "viewer").await;
        let other = register(&service, "other").await;
        post_at(&repo, other.id, "x", 0).await;

        let feed = service.get_feed(viewer.id, first_page()).await.unwrap();
        assert!(feed.posts.is_empty());
        assert_eq!(feed.total, 0);
        assert_eq!(feed.following_count, 0);
    }

    #[tokio::test]
    async fn test_feed_pages_do_not_overlap() {
        let (service, repo) = service();
        let viewer = register(&service, "viewer").await;
        let author = register(&service, "author").await;
        service.follow(viewer.id, author.id).await.unwrap();
        for i in 0..5 {
            post_at(&repo, author.id, &format!("p{i}"), 0).await;
        }

        let first = service
            .get_feed(viewer.id, PageRequest::new(1, 3))
            .await
            .unwrap();
        let second = service
            .get_feed(viewer.id, PageRequest::new(2, 3))
            .await
            .unwrap();
        assert_eq!(first.posts.len(), 3);
        assert_eq!(second.posts.len(), 2);
        assert_eq!(second.total, 5);
        assert!(first.posts.last().unwrap().post.id > second.posts[0].post.id);
    }
}
