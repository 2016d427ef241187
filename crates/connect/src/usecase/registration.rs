use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use app_core::error::AppError;
use app_core::password::Hasher;
use async_trait::async_trait;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::domain::entity::user::{NewUser, User, UserStatus};
use crate::outbound::repository::ConnectRepository;

const EMAIL_TAKEN_MSG: &str = "This email address is already in use. Please supply a different email address.";
const USERNAME_TAKEN_MSG: &str = "A user with that username already exists.";
const USERNAME_CHARS_MSG: &str = "may contain only letters, numbers and @/./+/-/_ characters";

/// The unique-email registration form.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct RegistrationForm {
    #[validate(length(min = 1, max = 30, message = "must be between 1 and 30 characters long"))]
    pub username: String,
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "this field is required"))]
    pub password1: String,
    #[validate(must_match(other = "password1", message = "the two password fields didn't match"))]
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
}

impl RegistrationForm {
    pub fn from_data(data: &BTreeMap<String, String>) -> Self {
        let field = |key: &str| data.get(key).map(|value| value.trim().to_string()).unwrap_or_default();

        Self {
            username: field("username"),
            email: field("email"),
            password1: data.get("password1").cloned().unwrap_or_default(),
            password2: data.get("password2").cloned().unwrap_or_default(),
            first_name: field("first_name"),
            last_name: field("last_name"),
        }
    }
}

/// Validates registration data and creates accounts from it.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait RegistrationBackend: Send + Sync {
    /// Validates the submitted data. Invalid data yields
    /// [`AppError::Validation`] with the offending fields.
    async fn clean(&self, data: &BTreeMap<String, String>) -> Result<RegistrationForm, AppError>;

    async fn register(&self, form: RegistrationForm) -> Result<User, AppError>;
}

pub struct FormRegistrationBackend {
    repo: Arc<dyn ConnectRepository>,
    hasher: Arc<dyn Hasher>,
}

impl FormRegistrationBackend {
    pub fn new(repo: Arc<dyn ConnectRepository>, hasher: Arc<dyn Hasher>) -> Self {
        Self { repo, hasher }
    }
}

#[async_trait]
impl RegistrationBackend for FormRegistrationBackend {
    async fn clean(&self, data: &BTreeMap<String, String>) -> Result<RegistrationForm, AppError> {
        let form = RegistrationForm::from_data(data);
        let mut errors = form.validate().err().unwrap_or_else(ValidationErrors::new);

        if !form.username.is_empty() && !is_valid_username(&form.username) {
            errors.add("username", field_error("invalid", USERNAME_CHARS_MSG));
        }

        let check_username = !errors.field_errors().contains_key("username");
        if check_username && self.repo.find_user_by_username(&form.username).await?.is_some() {
            errors.add("username", field_error("unique", USERNAME_TAKEN_MSG));
        }

        let check_email = !errors.field_errors().contains_key("email");
        if check_email && self.repo.find_user_by_email(&form.email).await?.is_some() {
            errors.add("email", field_error("unique", EMAIL_TAKEN_MSG));
        }

        if errors.errors().is_empty() { Ok(form) } else { Err(AppError::Validation(errors)) }
    }

    async fn register(&self, form: RegistrationForm) -> Result<User, AppError> {
        let password = self.hasher.hash(&form.password1)?;

        let user = self
            .repo
            .create_user(&NewUser {
                email: form.email,
                username: form.username,
                first_name: form.first_name,
                last_name: form.last_name,
                status: UserStatus::Active,
                password,
            })
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "Registered new user");

        Ok(user)
    }
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}
