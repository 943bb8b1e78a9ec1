//! Accounts, profiles and bearer tokens.
use lazy_static::lazy_static;
use regex::Regex;
use social_shared::types::{
    NewUser, PageRequest, Paginated, Registration, User, UserId, UserProfile, UserUpdate,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::SocialError;
use crate::service::{now, SocialService};

lazy_static! {
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9@.+_-]{1,150}$").unwrap();
}

const MAX_DISPLAY_NAME_LEN: usize = 150;
const MAX_BIO_LEN: usize = 500;

fn validate_display_name(display_name: &str) -> Result<(), SocialError> {
    if display_name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(SocialError::validation(format!(
            "display_name must be at most {MAX_DISPLAY_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_bio(bio: &str) -> Result<(), SocialError> {
    if bio.chars().count() > MAX_BIO_LEN {
        return Err(SocialError::validation(format!(
            "bio must be at most {MAX_BIO_LEN} characters"
        )));
    }
    Ok(())
}

impl SocialService {
    /// Creates an account and issues its first bearer token.
    ///
    /// # Arguments
    ///
    /// * `new_user` - Username of 1 to 150 characters from `[A-Za-z0-9@.+_-]`,
    ///   optional display name and bio (at most 500 characters)
    ///
    /// # Returns
    ///
    /// * `Ok(Registration)` - The stored user and its token
    /// * `Err(SocialError::Validation)` - Malformed fields
    /// * `Err(SocialError::UsernameTaken)` - Username already registered
    pub async fn register(&self, new_user: NewUser) -> Result<Registration, SocialError> {
        if !USERNAME_REGEX.is_match(&new_user.username) {
            return Err(SocialError::validation(
                "username must be 1-150 characters of letters, digits and @/./+/-/_",
            ));
        }
        validate_display_name(&new_user.display_name)?;
        validate_bio(&new_user.bio)?;

        let user = match self.repo.insert_user(&new_user, now()).await {
            Ok(user) => user,
            Err(e) if e.is_conflict() => {
                return Err(SocialError::UsernameTaken(new_user.username));
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.issue_token(user.id).await?;
        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(Registration { token, user })
    }

    /// Resolves a bearer token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<UserId, SocialError> {
        if token.is_empty() {
            return Err(SocialError::Unauthenticated);
        }
        match self.repo.resolve_token(token).await? {
            Some(user_id) => Ok(user_id),
            None => {
                warn!("Rejected unknown bearer token");
                Err(SocialError::Unauthenticated)
            }
        }
    }

    /// Revokes every token of the user and returns how many were removed.
    pub async fn logout(&self, user_id: UserId) -> Result<u64, SocialError> {
        let revoked = self.repo.delete_tokens_for_user(user_id).await?;
        info!(user_id = %user_id, revoked, "User logged out");
        Ok(revoked)
    }

    /// Loads a user with follower counts and whether `viewer_id` follows them.
    pub async fn get_profile(
        &self,
        viewer_id: Option<UserId>,
        user_id: UserId,
    ) -> Result<UserProfile, SocialError> {
        let user = self.require_user(user_id).await?;
        self.profile_of(viewer_id, user).await
    }

    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: UserUpdate,
    ) -> Result<UserProfile, SocialError> {
        if let Some(display_name) = &update.display_name {
            validate_display_name(display_name)?;
        }
        if let Some(bio) = &update.bio {
            validate_bio(bio)?;
        }

        let user = self
            .repo
            .update_user(user_id, &update)
            .await?
            .ok_or(SocialError::UserNotFound(user_id))?;
        info!(user_id = %user_id, "Profile updated");
        self.profile_of(Some(user_id), user).await
    }

    pub async fn list_users(
        &self,
        viewer_id: Option<UserId>,
        page: PageRequest,
    ) -> Result<Paginated<UserProfile>, SocialError> {
        let total = self.repo.count_users().await?;
        let users = self.repo.list_users(page.offset(), page.limit()).await?;

        let mut profiles = Vec::with_capacity(users.len());
        for user in users {
            profiles.push(self.profile_of(viewer_id, user).await?);
        }
        Ok(Paginated::new(page, total, profiles))
    }

    async fn profile_of(
        &self,
        viewer_id: Option<UserId>,
        user: User,
    ) -> Result<UserProfile, SocialError> {
        let is_following = match viewer_id {
            Some(viewer_id) if viewer_id != user.id => {
                self.repo.is_following(viewer_id, user.id).await?
            }
            _ => false,
        };

        Ok(UserProfile {
            followers_count: self.repo.count_followers(user.id).await?,
            following_count: self.repo.count_following(user.id).await?,
            is_following,
            user,
        })
    }

    async fn issue_token(&self, user_id: UserId) -> Result<String, SocialError> {
        let token = Uuid::new_v4().simple().to_string();
        self.repo.insert_token(&token, user_id, now()).await?;
        Ok(token)
    }
}
