use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserStatus {
    Unverified,
    Active,
    Banned,
}

impl UserStatus {
    pub fn from_i16(status_code: i16) -> Self {
        match status_code {
            1 => UserStatus::Active,
            2 => UserStatus::Banned,
            _ => UserStatus::Unverified,
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UserStatus::Unverified => "Unverified",
            UserStatus::Active => "Active",
            UserStatus::Banned => "Banned",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: i64, email: String, username: String, status: UserStatus) -> Self {
        Self {
            id,
            email,
            username,
            first_name: String::new(),
            last_name: String::new(),
            status,
            created_at: DateTime::default(), // UNIX_EPOCH (1970-01-01 UTC)
            updated_at: DateTime::default(), // UNIX_EPOCH (1970-01-01 UTC)
        }
    }
}

/// A user about to be inserted together with its credential and an empty
/// Facebook profile.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_status_from_i16() {
        assert_eq!(UserStatus::from_i16(1), UserStatus::Active);
        assert_eq!(UserStatus::from_i16(2), UserStatus::Banned);
        assert_eq!(UserStatus::from_i16(99), UserStatus::Unverified);
        assert_eq!(UserStatus::from_i16(0), UserStatus::Unverified);
    }

    #[test]
    fn test_user_status_display() {
        assert_eq!(format!("{}", UserStatus::Unverified), "Unverified");
        assert_eq!(format!("{}", UserStatus::Active), "Active");
        assert_eq!(format!("{}", UserStatus::Banned), "Banned");
    }

    #[test]
    fn test_user_new() {
        let user = User::new(1, "jane@example.com".to_string(), "jane".to_string(), UserStatus::Active);

        assert_eq!(user.id, 1);
        assert_eq!(user.username, "jane");
        assert!(user.first_name.is_empty());
        assert!(user.last_name.is_empty());
        assert_eq!(user.created_at, DateTime::<Utc>::default());
    }
}
