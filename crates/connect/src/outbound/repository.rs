use app_core::error::AppError;
use async_trait::async_trait;

use crate::domain::entity::profile::FacebookProfile;
use crate::domain::entity::relation::{FacebookFriend, FacebookLike};
use crate::domain::entity::user::{NewUser, User};

/// Persistence for local users and their Facebook data.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait ConnectRepository: Send + Sync {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// The user whose profile holds `facebook_id`.
    async fn find_user_by_facebook_id(&self, facebook_id: &str) -> Result<Option<User>, AppError>;

    async fn find_profile_by_user_id(&self, user_id: i64) -> Result<Option<FacebookProfile>, AppError>;

    /// Creates the user, its credential and an empty profile together.
    async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError>;

    async fn save_user(&self, user: &User) -> Result<(), AppError>;

    /// Inserts or replaces the profile of `profile.user_id`.
    async fn save_profile(&self, profile: &FacebookProfile) -> Result<(), AppError>;

    /// Removes `facebook_id` from every profile except the one of
    /// `except_user_id` and returns how many were cleared.
    async fn clear_facebook_id(&self, facebook_id: &str, except_user_id: i64) -> Result<u64, AppError>;

    /// Stores the likes and friends not yet recorded for the user inside a
    /// savepoint. A unique violation rolls the savepoint back and is reported
    /// as [`AppError::DuplicateEntry`].
    async fn store_relations(
        &self,
        user_id: i64,
        likes: &[FacebookLike],
        friends: &[FacebookFriend],
    ) -> Result<(), AppError>;
}
