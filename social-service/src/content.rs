//! Posts and comments.
use social_shared::types::{
    AuthorFilter, CommentId, CommentUpdate, CommentView, NewComment, NewPost, PageRequest,
    Paginated, PendingNotification, PostFilter, PostId, PostQuery, PostUpdate, PostView, UserId,
    UserSummary, Verb,
};
use tracing::info;

use crate::errors::SocialError;
use crate::service::{now, SocialService};

const MAX_TITLE_LEN: usize = 200;

fn validate_title(title: &str) -> Result<(), SocialError> {
    let len = title.trim().chars().count();
    if len == 0 {
        return Err(SocialError::validation("title may not be blank"));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(SocialError::validation(format!(
            "title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_body(field: &str, body: &str) -> Result<(), SocialError> {
    if body.trim().is_empty() {
        return Err(SocialError::validation(format!("{field} may not be blank")));
    }
    Ok(())
}

impl SocialService {
    /// Publishes a post and notifies any users mentioned in its title or body.
    /// The post and its mention notifications are stored in one transaction.
    ///
    /// # Arguments
    ///
    /// * `author_id` - Authenticated author
    /// * `title` - 1 to 200 characters, not blank
    /// * `body` - Not blank
    ///
    /// # Returns
    ///
    /// * `Ok(PostView)` - The stored post with zeroed counters
    /// * `Err(SocialError::Validation)` - Invalid title or body
    pub async fn create_post(
        &self,
        author_id: UserId,
        title: String,
        body: String,
    ) -> Result<PostView, SocialError> {
        validate_title(&title)?;
        validate_body("body", &body)?;
        self.require_user(author_id).await?;

        let mentions = self
            .mention_notifications(author_id, &format!("{title}\n{body}"))
            .await?;
        let post = self
            .repo
            .insert_post(
                &NewPost {
                    author_id,
                    title,
                    body,
                    created_at: now(),
                },
                &mentions,
            )
            .await?;
        info!(
            post_id = %post.id,
            author_id = %author_id,
            mentioned = mentions.len(),
            "Post created"
        );

        self.get_post(Some(author_id), post.id).await
    }

    pub async fn get_post(
        &self,
        viewer_id: Option<UserId>,
        post_id: PostId,
    ) -> Result<PostView, SocialError> {
        self.repo
            .get_post_view(post_id, viewer_id)
            .await?
            .ok_or(SocialError::PostNotFound(post_id))
    }

    /// Lists posts filtered by author and a case-insensitive search over
    /// title, body and author username, in the requested order.
    pub async fn list_posts(
        &self,
        viewer_id: Option<UserId>,
        filter: PostFilter,
        page: PageRequest,
    ) -> Result<Paginated<PostView>, SocialError> {
        let authors = match filter.author {
            Some(author_id) => AuthorFilter::Author(author_id),
            None => AuthorFilter::Any,
        };

        let (posts, total) = self
            .repo
            .query_posts(&PostQuery {
                viewer: viewer_id,
                authors,
                search: filter.search,
                ordering: filter.ordering,
                offset: page.offset(),
                limit: page.limit(),
            })
            .await?;
        Ok(Paginated::new(page, total, posts))
    }

    /// Edits a post. Only its author may do so; authorship never changes.
    pub async fn update_post(
        &self,
        actor_id: UserId,
        post_id: PostId,
        update: PostUpdate,
    ) -> Result<PostView, SocialError> {
        let post = self.require_post(post_id).await?;
        if post.author_id != actor_id {
            return Err(SocialError::forbidden(
                "You do not have permission to modify this post.",
            ));
        }
        if let Some(title) = &update.title {
            validate_title(title)?;
        }
        if let Some(body) = &update.body {
            validate_body("body", body)?;
        }

        self.repo
            .update_post(post_id, &update, now())
            .await?
            .ok_or(SocialError::PostNotFound(post_id))?;
        info!(post_id = %post_id, "Post updated");

        self.get_post(Some(actor_id), post_id).await
    }

    /// Deletes a post with its comments, likes and the notifications that
    /// point at them. Only the author may do so.
    pub async fn delete_post(&self, actor_id: UserId, post_id: PostId) -> Result<(), SocialError> {
        let post = self.require_post(post_id).await?;
        if post.author_id != actor_id {
            return Err(SocialError::forbidden(
                "You do not have permission to delete this post.",
            ));
        }

        if !self.repo.delete_post(post_id).await? {
            return Err(SocialError::PostNotFound(post_id));
        }
        info!(post_id = %post_id, "Post deleted");
        Ok(())
    }

    /// Comments on a post, notifying its author and any mentioned users. The
    /// comment and its notifications are stored in one transaction.
    pub async fn add_comment(
        &self,
        author_id: UserId,
        post_id: PostId,
        body: String,
    ) -> Result<CommentView, SocialError> {
        validate_body("body", &body)?;
        let post = self.require_post(post_id).await?;
        let author = self.require_user(author_id).await?;

        let mut notifications = Vec::new();
        if post.author_id != author_id {
            notifications.push(PendingNotification {
                recipient_id: post.author_id,
                verb: Verb::Comment,
            });
        }
        notifications.extend(self.mention_notifications(author_id, &body).await?);

        let comment = self
            .repo
            .insert_comment(
                &NewComment {
                    post_id,
                    author_id,
                    body,
                    created_at: now(),
                },
                &notifications,
            )
            .await?;
        info!(comment_id = %comment.id, post_id = %post_id, author_id = %author_id, "Comment created");

        Ok(CommentView {
            comment,
            author: UserSummary::from(&author),
        })
    }

    /// Edits a comment. Only its author may do so.
    pub async fn update_comment(
        &self,
        actor_id: UserId,
        comment_id: CommentId,
        update: CommentUpdate,
    ) -> Result<CommentView, SocialError> {
        let comment = self.require_comment(comment_id).await?;
        if comment.author_id != actor_id {
            return Err(SocialError::forbidden(
                "You do not have permission to modify this comment.",
            ));
        }
        validate_body("body", &update.body)?;

        let comment = self
            .repo
            .update_comment(comment_id, &update.body, now())
            .await?
            .ok_or(SocialError::CommentNotFound(comment_id))?;
        let author = self.require_user(actor_id).await?;
        info!(comment_id = %comment_id, "Comment updated");

        Ok(CommentView {
            comment,
            author: UserSummary::from(&author),
        })
    }

    /// Deletes a comment together with the notifications it produced: the
    /// comment notification sent to the post author and any mentions.
    pub async fn delete_comment(
        &self,
        actor_id: UserId,
        comment_id: CommentId,
    ) -> Result<(), SocialError> {
        let comment = self.require_comment(comment_id).await?;
        if comment.author_id != actor_id {
            return Err(SocialError::forbidden(
                "You do not have permission to delete this comment.",
            ));
        }

        let removed = self
            .repo
            .delete_comment(comment_id)
            .await?
            .ok_or(SocialError::CommentNotFound(comment_id))?;
        info!(comment_id = %comment_id, notifications_removed = removed, "Comment deleted");
        Ok(())
    }

    /// Lists a post's comments, oldest first.
    pub async fn list_comments(
        &self,
        post_id: PostId,
        page: PageRequest,
    ) -> Result<Paginated<CommentView>, SocialError> {
        self.require_post(post_id).await?;
        let (comments, total) = self
            .repo
            .list_comments(post_id, page.offset(), page.limit())
            .await?;
        Ok(Paginated::new(page, total, comments))
    }
}
