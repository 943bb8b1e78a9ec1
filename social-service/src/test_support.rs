use std::sync::Arc;

use social_repository::InMemorySocialRepository;
use social_shared::types::{NewUser, PageRequest, User};

use crate::SocialService;

/// Service over a fresh in-memory store, plus the store for direct assertions.
pub(crate) fn service() -> (SocialService, Arc<InMemorySocialRepository>) {
    let repo = Arc::new(InMemorySocialRepository::new());
    (SocialService::new(repo.clone()), repo)
}

pub(crate) async fn register(service: &SocialService, username: &str) -> User {
    service
        .register(NewUser {
            username: username.to_string(),
            display_name: String::new(),
            bio: String::new(),
        })
        .await
        .unwrap()
        .user
}

pub(crate) fn first_page() -> PageRequest {
    PageRequest::new(1, 50)
}
