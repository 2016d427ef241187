//! Password secrets for accounts created through a social login.
//!
//! Accounts registered from a Facebook profile never choose a password, so
//! they receive a random one that is stored only as an Argon2id hash.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{Error as Argon2Error, PasswordHasher, SaltString};
use rand::Rng;
use rand::distributions::Alphanumeric;
use thiserror::Error;

pub const RANDOM_PASSWORD_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum HashingError {
    #[error("Failed to hash password: {0}")]
    Hash(Argon2Error),
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Hasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, HashingError>;
}

pub struct Argon2Hasher<'a> {
    argon2: Argon2<'a>,
}

impl<'a> Argon2Hasher<'a> {
    pub fn new() -> Self {
        Self { argon2: Argon2::default() }
    }
}

impl Default for Argon2Hasher<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Argon2Hasher<'_> {
    fn hash(&self, plain: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);

        Ok(self.argon2.hash_password(plain.as_bytes(), &salt)?.to_string())
    }
}

impl From<Argon2Error> for HashingError {
    fn from(err: Argon2Error) -> Self {
        HashingError::Hash(err)
    }
}

/// Generates an alphanumeric password of `len` characters.
pub fn make_random_password(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    use super::*;

    #[test]
    fn test_hash_is_verifiable_argon2id() {
        let hasher = Argon2Hasher::default();
        let password = make_random_password(RANDOM_PASSWORD_LEN);

        let hashed = hasher.hash(&password).unwrap();
        assert!(hashed.starts_with("$argon2id$"));

        let parsed = PasswordHash::new(&hashed).unwrap();
        assert!(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok());
    }

    #[test]
    fn test_unique_for_the_same_password() {
        let hasher = Argon2Hasher::new();

        let hash1 = hasher.hash("same-password-different-salt").unwrap();
        let hash2 = hasher.hash("same-password-different-salt").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_make_random_password() {
        let first = make_random_password(RANDOM_PASSWORD_LEN);
        let second = make_random_password(RANDOM_PASSWORD_LEN);

        assert_eq!(first.len(), RANDOM_PASSWORD_LEN);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
        assert!(make_random_password(0).is_empty());
    }
}
