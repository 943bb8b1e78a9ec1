//! This module defines and re-exports the storage interfaces of the social backend.
mod content;
mod follows;
mod notifications;
mod users;

pub use content::ContentRepository;
pub use follows::FollowRepository;
pub use notifications::NotificationRepository;
pub use users::UserRepository;

/// The full storage surface required by the social service.
///
/// Blanket-implemented for every type that implements the four concern traits,
/// so services can hold a single `Arc<dyn SocialRepository>`.
pub trait SocialRepository:
    UserRepository + FollowRepository + ContentRepository + NotificationRepository
{
}

impl<T> SocialRepository for T where
    T: UserRepository + FollowRepository + ContentRepository + NotificationRepository
{
}
