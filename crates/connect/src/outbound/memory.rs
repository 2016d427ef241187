//! An in-memory [`ConnectRepository`] for exercising the connect flow
//! against stateful storage.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use app_core::error::AppError;
use async_trait::async_trait;

use super::repository::ConnectRepository;
use crate::domain::entity::profile::FacebookProfile;
use crate::domain::entity::relation::{FacebookFriend, FacebookLike};
use crate::domain::entity::user::{NewUser, User, UserStatus};

#[derive(Default)]
struct Store {
    next_id: i64,
    users: BTreeMap<i64, User>,
    passwords: BTreeMap<i64, String>,
    profiles: BTreeMap<i64, FacebookProfile>,
    likes: Vec<(i64, FacebookLike)>,
    friends: Vec<(i64, FacebookFriend)>,
    user_saves: usize,
}

#[derive(Default)]
pub struct MemoryRepository {
    store: Mutex<Store>,
    relations_error: Mutex<Option<fn() -> AppError>>,
}

impl MemoryRepository {
    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    /// Adds an active user with an empty profile.
    pub fn insert_user(&self, username: &str, email: &str) -> User {
        let mut store = self.lock();
        store.next_id += 1;
        let user = User::new(store.next_id, email.to_string(), username.to_string(), UserStatus::Active);
        store.users.insert(user.id, user.clone());
        store.profiles.insert(user.id, FacebookProfile::empty(user.id));
        user
    }

    pub fn put_profile(&self, profile: FacebookProfile) {
        self.lock().profiles.insert(profile.user_id, profile);
    }

    pub fn user(&self, id: i64) -> Option<User> {
        self.lock().users.get(&id).cloned()
    }

    pub fn profile(&self, user_id: i64) -> Option<FacebookProfile> {
        self.lock().profiles.get(&user_id).cloned()
    }

    pub fn password_of(&self, user_id: i64) -> Option<String> {
        self.lock().passwords.get(&user_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    pub fn user_saves(&self) -> usize {
        self.lock().user_saves
    }

    /// The users whose profile holds `facebook_id`.
    pub fn holders_of(&self, facebook_id: &str) -> Vec<i64> {
        self.lock()
            .profiles
            .values()
            .filter(|p| p.facebook_id.as_deref() == Some(facebook_id))
            .map(|p| p.user_id)
            .collect()
    }

    pub fn likes_of(&self, user_id: i64) -> Vec<FacebookLike> {
        self.lock().likes.iter().filter(|(id, _)| *id == user_id).map(|(_, like)| like.clone()).collect()
    }

    pub fn friends_of(&self, user_id: i64) -> Vec<FacebookFriend> {
        self.lock().friends.iter().filter(|(id, _)| *id == user_id).map(|(_, f)| f.clone()).collect()
    }

    /// Makes every later `store_relations` call fail with `error()`.
    pub fn fail_relations_with(&self, error: fn() -> AppError) {
        *self.relations_error.lock().unwrap() = Some(error);
    }
}

/// The entries of `items` not yet stored for the user, or the duplicated id
/// when the batch itself repeats one.
fn new_entries<'a, T>(
    items: &'a [T],
    existing: &HashSet<String>,
    id_of: impl Fn(&T) -> &str,
) -> Result<Vec<&'a T>, String> {
    let mut seen = HashSet::new();
    let mut fresh = Vec::new();
    for item in items.iter().filter(|item| !existing.contains(id_of(*item))) {
        if !seen.insert(id_of(item).to_string()) {
            return Err(id_of(item).to_string());
        }
        fresh.push(item);
    }
    Ok(fresh)
}

#[async_trait]
impl ConnectRepository for MemoryRepository {
    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.user(id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        Ok(self.lock().users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_facebook_id(&self, facebook_id: &str) -> Result<Option<User>, AppError> {
        let store = self.lock();
        let user = store
            .profiles
            .values()
            .find(|p| p.facebook_id.as_deref() == Some(facebook_id))
            .and_then(|p| store.users.get(&p.user_id))
            .cloned();
        Ok(user)
    }

    async fn find_profile_by_user_id(&self, user_id: i64) -> Result<Option<FacebookProfile>, AppError> {
        Ok(self.profile(user_id))
    }

    async fn create_user(&self, new_user: &NewUser) -> Result<User, AppError> {
        let mut store = self.lock();
        if store.users.values().any(|u| u.email == new_user.email || u.username == new_user.username) {
            return Err(AppError::DuplicateEntry("users_email_key".to_string()));
        }

        store.next_id += 1;
        let mut user =
            User::new(store.next_id, new_user.email.clone(), new_user.username.clone(), new_user.status.clone());
        user.first_name = new_user.first_name.clone();
        user.last_name = new_user.last_name.clone();

        store.users.insert(user.id, user.clone());
        store.passwords.insert(user.id, new_user.password.clone());
        store.profiles.insert(user.id, FacebookProfile::empty(user.id));
        Ok(user)
    }

    async fn save_user(&self, user: &User) -> Result<(), AppError> {
        let mut store = self.lock();
        if !store.users.contains_key(&user.id) {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        store.users.insert(user.id, user.clone());
        store.user_saves += 1;
        Ok(())
    }

    async fn save_profile(&self, profile: &FacebookProfile) -> Result<(), AppError> {
        self.lock().profiles.insert(profile.user_id, profile.clone());
        Ok(())
    }

    async fn clear_facebook_id(&self, facebook_id: &str, except_user_id: i64) -> Result<u64, AppError> {
        let mut cleared = 0;
        for profile in self.lock().profiles.values_mut() {
            if profile.user_id != except_user_id && profile.facebook_id.as_deref() == Some(facebook_id) {
                profile.facebook_id = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn store_relations(
        &self,
        user_id: i64,
        likes: &[FacebookLike],
        friends: &[FacebookFriend],
    ) -> Result<(), AppError> {
        if let Some(error) = *self.relations_error.lock().unwrap() {
            return Err(error());
        }

        let mut store = self.lock();
        let stored_likes = store.likes.iter().filter(|(id, _)| *id == user_id).map(|(_, l)| l.facebook_id.clone());
        let stored_likes: HashSet<String> = stored_likes.collect();
        let stored_friends = store.friends.iter().filter(|(id, _)| *id == user_id).map(|(_, f)| f.facebook_id.clone());
        let stored_friends: HashSet<String> = stored_friends.collect();

        // Nothing is written unless both batches are clean.
        let new_likes = new_entries(likes, &stored_likes, |l| l.facebook_id.as_str())
            .map_err(|id| AppError::DuplicateEntry(format!("facebook_likes ({user_id}, {id}) already exists")))?;
        let new_friends = new_entries(friends, &stored_friends, |f| f.facebook_id.as_str())
            .map_err(|id| AppError::DuplicateEntry(format!("facebook_users ({user_id}, {id}) already exists")))?;

        let new_likes: Vec<_> = new_likes.into_iter().map(|l| (user_id, l.clone())).collect();
        let new_friends: Vec<_> = new_friends.into_iter().map(|f| (user_id, f.clone())).collect();
        store.likes.extend(new_likes);
        store.friends.extend(new_friends);
        Ok(())
    }
}
