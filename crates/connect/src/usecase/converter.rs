use app_core::error::AppError;
use app_core::graph::FacebookGraph;
use app_core::password::{RANDOM_PASSWORD_LEN, make_random_password};
use app_core::time::parse_graph_birthday;
use serde_json::Value;

use crate::domain::entity::registration::FacebookRegistrationData;

pub const USERNAME_MAX_LEN: usize = 30;

/// Reads local account data out of a Graph `/me` payload.
#[derive(Debug, Clone)]
pub struct FacebookUserConverter {
    payload: Value,
}

impl FacebookUserConverter {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    pub async fn from_graph(graph: &dyn FacebookGraph) -> Result<Self, AppError> {
        Ok(Self::new(graph.me().await?))
    }

    pub fn facebook_profile_data(&self) -> &Value {
        &self.payload
    }

    /// The payload serialized for the profile's `raw_data` column.
    pub fn raw_data(&self) -> Result<String, AppError> {
        Ok(serde_json::to_string(self.facebook_profile_data())?)
    }

    pub fn facebook_id(&self) -> Result<String, AppError> {
        match self.payload.get("id") {
            Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.trim().to_string()),
            Some(Value::Number(id)) => Ok(id.to_string()),
            _ => Err(AppError::InvalidState("Facebook profile has no id".to_string())),
        }
    }

    /// The email, only when Facebook reports it as verified.
    pub fn verified_email(&self) -> Option<String> {
        let verified = self.payload.get("verified").and_then(Value::as_bool).unwrap_or(false);
        if verified { self.text("email") } else { None }
    }

    pub fn registration_data(&self) -> Result<FacebookRegistrationData, AppError> {
        let facebook_id = self.facebook_id()?;
        let email = self.text("email");
        let username = base_username(self.text("username"), self.text("name"), email.as_deref(), &facebook_id);

        Ok(FacebookRegistrationData {
            facebook_name: self.text("name"),
            facebook_profile_url: self.text("link"),
            website_url: self.text("website"),
            about_me: self.text("about").or_else(|| self.text("bio")),
            date_of_birth: self.text("birthday").as_deref().and_then(parse_graph_birthday),
            first_name: self.text("first_name"),
            last_name: self.text("last_name"),
            gender: self.text("gender"),
            email,
            username,
            password: make_random_password(RANDOM_PASSWORD_LEN),
            facebook_id,
        })
    }

    fn text(&self, key: &str) -> Option<String> {
        self.payload
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }
}

/// Derives a username from the first usable source: the Facebook username,
/// the display name, then the email's local part.
pub fn base_username(
    username: Option<String>,
    name: Option<String>,
    email: Option<&str>,
    facebook_id: &str,
) -> String {
    let email_local = email.and_then(|email| email.split('@').next()).map(str::to_string);

    [username, name, email_local]
        .into_iter()
        .flatten()
        .map(|candidate| slugify(&candidate))
        .find(|slug| !slug.is_empty())
        .unwrap_or_else(|| format!("facebook_{facebook_id}"))
        .chars()
        .take(USERNAME_MAX_LEN)
        .collect()
}

/// Lowercases `value` and keeps the characters a username may contain.
pub fn slugify(value: &str) -> String {
    let slug: String = value
        .trim()
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();

    slug.trim_matches(|c| matches!(c, '.' | '_' | '-')).to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::json;

    use super::*;

    fn payload() -> Value {
        json!({
            "id": "100001",
            "name": "Jane Doe",
            "first_name": "Jane",
            "last_name": "Doe",
            "username": "jane.doe",
            "email": "jane@example.com",
            "verified": true,
            "link": "https://www.facebook.com/jane.doe",
            "website": "https://jane.example.com",
            "bio": "Rustacean",
            "birthday": "12/31/1990",
            "gender": "female"
        })
    }

    #[test]
    fn test_registration_data() {
        let data = FacebookUserConverter::new(payload()).registration_data().unwrap();

        assert_eq!(data.facebook_id, "100001");
        assert_eq!(data.facebook_name.as_deref(), Some("Jane Doe"));
        assert_eq!(data.facebook_profile_url.as_deref(), Some("https://www.facebook.com/jane.doe"));
        assert_eq!(data.website_url.as_deref(), Some("https://jane.example.com"));
        assert_eq!(data.about_me.as_deref(), Some("Rustacean"));
        assert_eq!(data.date_of_birth, NaiveDate::from_ymd_opt(1990, 12, 31));
        assert_eq!(data.username, "jane.doe");
        assert_eq!(data.password.len(), RANDOM_PASSWORD_LEN);
    }

    #[test]
    fn test_about_wins_over_bio() {
        let mut payload = payload();
        payload["about"] = json!("About me");

        let data = FacebookUserConverter::new(payload).registration_data().unwrap();

        assert_eq!(data.about_me.as_deref(), Some("About me"));
    }

    #[test]
    fn test_partial_birthday_is_ignored() {
        let mut payload = payload();
        payload["birthday"] = json!("12/31");

        let data = FacebookUserConverter::new(payload).registration_data().unwrap();

        assert!(data.date_of_birth.is_none());
    }

    #[test]
    fn test_facebook_id() {
        assert_eq!(FacebookUserConverter::new(json!({"id": 42})).facebook_id().unwrap(), "42");

        let missing = FacebookUserConverter::new(json!({"name": "Jane"})).facebook_id();
        assert!(matches!(missing, Err(AppError::InvalidState(_))));

        let blank = FacebookUserConverter::new(json!({"id": " "})).registration_data();
        assert!(matches!(blank, Err(AppError::InvalidState(_))));
    }

    #[test]
    fn test_verified_email() {
        assert_eq!(FacebookUserConverter::new(payload()).verified_email().as_deref(), Some("jane@example.com"));

        let mut unverified = payload();
        unverified["verified"] = json!(false);
        assert!(FacebookUserConverter::new(unverified).verified_email().is_none());

        let mut unknown = payload();
        unknown.as_object_mut().unwrap().remove("verified");
        assert!(FacebookUserConverter::new(unknown).verified_email().is_none());
    }

    #[test]
    fn test_base_username_fallbacks() {
        assert_eq!(base_username(None, Some("Jane Doe".into()), None, "1"), "jane_doe");
        assert_eq!(base_username(Some("!!!".into()), None, Some("j.doe@example.com"), "1"), "j.doe");
        assert_eq!(base_username(None, Some("李".into()), None, "100001"), "facebook_100001");

        let long = base_username(Some("a".repeat(40)), None, None, "1");
        assert_eq!(long.len(), USERNAME_MAX_LEN);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("  Jane  Doe "), "jane__doe");
        assert_eq!(slugify("José-María"), "jos-mara");
        assert_eq!(slugify("_.jane._"), "jane");
    }

    #[test]
    fn test_raw_data_round_trips() {
        let converter = FacebookUserConverter::new(payload());
        let raw: Value = serde_json::from_str(&converter.raw_data().unwrap()).unwrap();

        assert_eq!(&raw, converter.facebook_profile_data());
    }
}
