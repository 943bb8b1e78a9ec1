//! Social service implementation.
//!
//! [`SocialService`] is the high-level API used by the HTTP layer. Operations
//! are spread over several `impl` blocks grouped by concern (graph, feed,
//! likes, content, notifications, users); this module holds the struct and
//! the lookups they share.
use std::sync::Arc;

use chrono::{DateTime, Utc};
use social_repository::SocialRepository;
use social_shared::types::{Comment, CommentId, PageRequest, Post, PostId, User, UserId};

use crate::config::ServiceConfig;
use crate::errors::SocialError;

/// The main service for the social backend.
///
/// Holds a shared handle to any [`SocialRepository`] implementation, so the
/// same rules run over PostgreSQL in production and over the in-memory store
/// in tests. Cloning is cheap.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use social_repository::InMemorySocialRepository;
/// use social_service::SocialService;
///
/// # async fn example() -> Result<(), social_service::SocialError> {
/// let service = SocialService::new(Arc::new(InMemorySocialRepository::new()));
/// let page = service.page_request(None, None)?;
/// let feed = service.get_feed(1, page).await?;
/// assert!(feed.posts.is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SocialService {
    pub(crate) repo: Arc<dyn SocialRepository>,
    pub(crate) config: ServiceConfig,
}

impl SocialService {
    /// Create a new SocialService with default configuration.
    ///
    /// # Arguments
    ///
    /// * `repo` - Shared storage backend implementing every repository trait
    ///
    /// # Returns
    ///
    /// A new `SocialService` with default pagination limits.
    pub fn new(repo: Arc<dyn SocialRepository>) -> Self {
        Self {
            repo,
            config: ServiceConfig::default(),
        }
    }

    /// Create a new SocialService with custom configuration.
    pub fn with_config(repo: Arc<dyn SocialRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    /// Resolves optional pagination parameters with this service's limits.
    pub fn page_request(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<PageRequest, SocialError> {
        self.config.page_request(page, page_size)
    }

    pub(crate) async fn require_user(&self, id: UserId) -> Result<User, SocialError> {
        self.repo
            .get_user(id)
            .await?
            .ok_or(SocialError::UserNotFound(id))
    }

    pub(crate) async fn require_post(&self, id: PostId) -> Result<Post, SocialError> {
        self.repo
            .get_post(id)
            .await?
            .ok_or(SocialError::PostNotFound(id))
    }

    pub(crate) async fn require_comment(&self, id: CommentId) -> Result<Comment, SocialError> {
        self.repo
            .get_comment(id)
            .await?
            .ok_or(SocialError::CommentNotFound(id))
    }
}

pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}
