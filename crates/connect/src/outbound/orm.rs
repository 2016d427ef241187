use std::collections::HashSet;
use std::sync::Arc;

use app_core::error::AppError;
use app_core::time::now_fixed;
use app_orm::prelude::{FacebookLikes, FacebookProfiles, FacebookUsers, UserCredentials, Users};
use app_orm::{facebook_likes, facebook_profiles, facebook_users, user_credentials, users};
use async_trait::async_trait;
use sea_orm::prelude::Expr;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
    SqlErr, TransactionTrait,
};

use super::repository::ConnectRepository;
use crate::domain::entity::profile::FacebookProfile;
use crate::domain::entity::relation::{FacebookFriend, FacebookLike};
use crate::domain::entity::user::{NewUser, User, UserStatus};

/// `ConnectORM` is the SeaORM implementation of [`ConnectRepository`].
///
/// It maps `users` and `facebook_profiles` rows to domain entities and keeps
/// the relationship tables (`facebook_likes`, `facebook_users`) in sync.
pub struct ConnectORM {
    db: Arc<DatabaseConnection>,
}

impl ConnectORM {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ===== Mappers from database models to domain entities =====

    fn to_user(&self, model: users::Model) -> User {
        User {
            id: model.id,
            email: model.email,
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            status: UserStatus::from_i16(model.status),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }

    fn to_profile(&self, model: facebook_profiles::Model) -> FacebookProfile {
        FacebookProfile {
            user_id: model.user_id,
            facebook_id: model.facebook_id,
            facebook_name: model.facebook_name,
            facebook_profile_url: model.facebook_profile_url,
            date_of_birth: model.date_of_birth,
            about_me: model.about_me,
            website_url: model.website_url,
            gender: model.gender,
            raw_data: model.raw_data,
            fb_update_required: model.fb_update_required,
        }
    }

    // ===== Helpers =====

    /// Inserts the likes and friends that are not stored for `user_id` yet.
    async fn insert_relations<C>(
        &self,
        db: &C,
        user_id: i64,
        likes: &[FacebookLike],
        friends: &[FacebookFriend],
    ) -> Result<(), DbErr>
    where
        C: ConnectionTrait + Send + Sync,
    {
        if !likes.is_empty() {
            let existing: HashSet<String> = FacebookLikes::find()
                .filter(facebook_likes::Column::UserId.eq(user_id))
                .filter(facebook_likes::Column::FacebookId.is_in(likes.iter().map(|l| l.facebook_id.clone())))
                .all(db)
                .await?
                .into_iter()
                .map(|model| model.facebook_id)
                .collect();

            let models: Vec<facebook_likes::ActiveModel> = likes
                .iter()
                .filter(|like| !existing.contains(&like.facebook_id))
                .map(|like| facebook_likes::ActiveModel {
                    user_id: ActiveValue::Set(user_id),
                    facebook_id: ActiveValue::Set(like.facebook_id.clone()),
                    name: ActiveValue::Set(like.name.clone()),
                    category: ActiveValue::Set(like.category.clone()),
                    created_time: ActiveValue::Set(like.created_time),
                    ..Default::default()
                })
                .collect();

            if !models.is_empty() {
                FacebookLikes::insert_many(models).exec_without_returning(db).await?;
            }
        }

        if !friends.is_empty() {
            let existing: HashSet<String> = FacebookUsers::find()
                .filter(facebook_users::Column::UserId.eq(user_id))
                .filter(facebook_users::Column::FacebookId.is_in(friends.iter().map(|f| f.facebook_id.clone())))
                .all(db)
                .await?
                .into_iter()
                .map(|model| model.facebook_id)
                .collect();

            let models: Vec<facebook_users::ActiveModel> = friends
                .iter()
                .filter(|friend| !existing.contains(&friend.facebook_id))
                .map(|friend| facebook_users::ActiveModel {
                    user_id: ActiveValue::Set(user_id),
                    facebook_id: ActiveValue::Set(friend.facebook_id.clone()),
                    name: ActiveValue::Set(friend.name.clone()),
                    ..Default::default()
                })
                .collect();

            if !models.is_empty() {
                FacebookUsers::insert_many(models).exec_without_returning(db).await?;
            }
        }

        Ok(())
    }
}

/// Reports unique violations as [`AppError::DuplicateEntry`].
fn map_db_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => AppError::DuplicateEntry(detail),
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl ConnectRepository for ConnectORM {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = Users::find()
            .filter(users::Column::Id.eq(id))
            .filter(users::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await?;

        Ok(user.map(|u| self.to_user(u)))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = Users::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await?;

        Ok(user.map(|u| self.to_user(u)))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = Users::find()
            .filter(users::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await?;

        Ok(user.map(|u| self.to_user(u)))
    }

    async fn find_user_by_facebook_id(&self, facebook_id: &str) -> Result<Option<User>, AppError> {
        let user = Users::find()
            .inner_join(FacebookProfiles)
            .filter(facebook_profiles::Column::FacebookId.eq(facebook_id))
            .filter(users::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await?;

        Ok(user.map(|u| self.to_user(u)))
    }

    async fn find_profile_by_user_id(&self, user_id: i64) -> Result<Option<FacebookProfile>, AppError> {
        let profile = FacebookProfiles::find_by_id(user_id).one(self.db.as_ref()).await?;

        Ok(profile.map(|p| self.to_profile(p)))
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError> {
        let txn = self.db.begin().await?;

        let user_model = users::ActiveModel {
            email: ActiveValue::Set(new_user.email.clone()),
            username: ActiveValue::Set(new_user.username.clone()),
            first_name: ActiveValue::Set(new_user.first_name.clone()),
            last_name: ActiveValue::Set(new_user.last_name.clone()),
            status: ActiveValue::Set(new_user.status.clone() as i16),
            ..Default::default()
        };
        let user = Users::insert(user_model).exec_with_returning(&txn).await.map_err(map_db_err)?;

        let cred_model = user_credentials::ActiveModel {
            user_id: ActiveValue::Set(user.id),
            hashed_password: ActiveValue::Set(new_user.password.clone()),
            ..Default::default()
        };
        UserCredentials::insert(cred_model).exec_without_returning(&txn).await?;

        let profile_model = facebook_profiles::ActiveModel {
            user_id: ActiveValue::Set(user.id),
            fb_update_required: ActiveValue::Set(false),
            ..Default::default()
        };
        FacebookProfiles::insert(profile_model).exec_without_returning(&txn).await?;

        txn.commit().await?;

        Ok(self.to_user(user))
    }

    async fn save_user(&self, user: &User) -> Result<(), AppError> {
        let active_model = users::ActiveModel {
            email: ActiveValue::Set(user.email.clone()),
            username: ActiveValue::Set(user.username.clone()),
            first_name: ActiveValue::Set(user.first_name.clone()),
            last_name: ActiveValue::Set(user.last_name.clone()),
            status: ActiveValue::Set(user.status.clone() as i16),
            updated_at: ActiveValue::Set(now_fixed()),
            ..Default::default()
        };

        let result = Users::update_many()
            .set(active_model)
            .filter(users::Column::Id.eq(user.id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn save_profile(&self, profile: &FacebookProfile) -> Result<(), AppError> {
        let now = now_fixed();
        let active_model = facebook_profiles::ActiveModel {
            user_id: ActiveValue::Set(profile.user_id),
            facebook_id: ActiveValue::Set(profile.facebook_id.clone()),
            facebook_name: ActiveValue::Set(profile.facebook_name.clone()),
            facebook_profile_url: ActiveValue::Set(profile.facebook_profile_url.clone()),
            date_of_birth: ActiveValue::Set(profile.date_of_birth),
            about_me: ActiveValue::Set(profile.about_me.clone()),
            website_url: ActiveValue::Set(profile.website_url.clone()),
            gender: ActiveValue::Set(profile.gender.clone()),
            raw_data: ActiveValue::Set(profile.raw_data.clone()),
            fb_update_required: ActiveValue::Set(profile.fb_update_required),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        let on_conflict = OnConflict::column(facebook_profiles::Column::UserId)
            .update_columns([
                facebook_profiles::Column::FacebookId,
                facebook_profiles::Column::FacebookName,
                facebook_profiles::Column::FacebookProfileUrl,
                facebook_profiles::Column::DateOfBirth,
                facebook_profiles::Column::AboutMe,
                facebook_profiles::Column::WebsiteUrl,
                facebook_profiles::Column::Gender,
                facebook_profiles::Column::RawData,
                facebook_profiles::Column::FbUpdateRequired,
                facebook_profiles::Column::UpdatedAt,
            ])
            .to_owned();

        FacebookProfiles::insert(active_model)
            .on_conflict(on_conflict)
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(())
    }

    async fn clear_facebook_id(&self, facebook_id: &str, except_user_id: i64) -> Result<u64, AppError> {
        let result = FacebookProfiles::update_many()
            .col_expr(facebook_profiles::Column::FacebookId, Expr::value(Option::<String>::None))
            .col_expr(facebook_profiles::Column::UpdatedAt, Expr::value(now_fixed()))
            .filter(facebook_profiles::Column::FacebookId.eq(facebook_id))
            .filter(facebook_profiles::Column::UserId.ne(except_user_id))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn store_relations(
        &self,
        user_id: i64,
        likes: &[FacebookLike],
        friends: &[FacebookFriend],
    ) -> Result<(), AppError> {
        let txn = self.db.begin().await?;
        let savepoint = txn.begin().await?;

        if let Err(err) = self.insert_relations(&savepoint, user_id, likes, friends).await {
            savepoint.rollback().await?;
            txn.commit().await?;
            return Err(map_db_err(err));
        }

        savepoint.commit().await?;
        txn.commit().await?;

        Ok(())
    }
}
