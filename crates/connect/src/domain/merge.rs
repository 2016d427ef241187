//! Copies Facebook profile values into local records without ever
//! overwriting a value the user already has.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use super::entity::profile::FacebookProfile;
use super::entity::registration::FacebookRegistrationData;
use super::entity::user::User;

/// The record a merged field lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeTarget {
    Profile,
    User,
}

/// A Facebook value that can be merged into a local record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacebookField {
    FacebookName,
    FacebookProfileUrl,
    DateOfBirth,
    AboutMe,
    WebsiteUrl,
    FirstName,
    LastName,
    Gender,
}

impl FacebookField {
    pub const DEFAULTS: [FacebookField; 7] = [
        FacebookField::FacebookName,
        FacebookField::FacebookProfileUrl,
        FacebookField::DateOfBirth,
        FacebookField::AboutMe,
        FacebookField::WebsiteUrl,
        FacebookField::FirstName,
        FacebookField::LastName,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FacebookField::FacebookName => "facebook_name",
            FacebookField::FacebookProfileUrl => "facebook_profile_url",
            FacebookField::DateOfBirth => "date_of_birth",
            FacebookField::AboutMe => "about_me",
            FacebookField::WebsiteUrl => "website_url",
            FacebookField::FirstName => "first_name",
            FacebookField::LastName => "last_name",
            FacebookField::Gender => "gender",
        }
    }

    pub fn target(self) -> MergeTarget {
        match self {
            FacebookField::FirstName | FacebookField::LastName => MergeTarget::User,
            _ => MergeTarget::Profile,
        }
    }
}

impl fmt::Display for FacebookField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownField(pub String);

impl fmt::Display for UnknownField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown Facebook field `{}`", self.0)
    }
}

impl FromStr for FacebookField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "facebook_name" => Ok(FacebookField::FacebookName),
            "facebook_profile_url" => Ok(FacebookField::FacebookProfileUrl),
            "date_of_birth" => Ok(FacebookField::DateOfBirth),
            "about_me" => Ok(FacebookField::AboutMe),
            "website_url" => Ok(FacebookField::WebsiteUrl),
            "first_name" => Ok(FacebookField::FirstName),
            "last_name" => Ok(FacebookField::LastName),
            "gender" => Ok(FacebookField::Gender),
            other => Err(UnknownField(other.to_string())),
        }
    }
}

/// Which records a merge changed and therefore need saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub user_dirty: bool,
    pub profile_dirty: bool,
}

/// Fills every blank local field in `fields` with its non-empty Facebook
/// value.
pub fn merge_facebook_fields(
    fields: &[FacebookField],
    data: &FacebookRegistrationData,
    user: &mut User,
    profile: &mut FacebookProfile,
) -> MergeOutcome {
    let mut outcome = MergeOutcome::default();

    for &field in fields {
        let changed = match field {
            FacebookField::FacebookName => fill(&mut profile.facebook_name, data.facebook_name.as_deref()),
            FacebookField::FacebookProfileUrl => {
                fill(&mut profile.facebook_profile_url, data.facebook_profile_url.as_deref())
            },
            FacebookField::DateOfBirth => fill_date(&mut profile.date_of_birth, data.date_of_birth),
            FacebookField::AboutMe => fill(&mut profile.about_me, data.about_me.as_deref()),
            FacebookField::WebsiteUrl => fill(&mut profile.website_url, data.website_url.as_deref()),
            FacebookField::Gender => fill(&mut profile.gender, data.gender.as_deref()),
            FacebookField::FirstName => fill_required(&mut user.first_name, data.first_name.as_deref()),
            FacebookField::LastName => fill_required(&mut user.last_name, data.last_name.as_deref()),
        };

        if changed {
            match field.target() {
                MergeTarget::Profile => outcome.profile_dirty = true,
                MergeTarget::User => outcome.user_dirty = true,
            }
        }
    }

    outcome
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn present(remote: Option<&str>) -> Option<&str> {
    remote.filter(|value| !is_blank(value))
}

fn fill(local: &mut Option<String>, remote: Option<&str>) -> bool {
    match present(remote) {
        Some(value) if local.as_deref().map_or(true, is_blank) => {
            *local = Some(value.to_string());
            true
        },
        _ => false,
    }
}

fn fill_required(local: &mut String, remote: Option<&str>) -> bool {
    match present(remote) {
        Some(value) if is_blank(local) => {
            *local = value.to_string();
            true
        },
        _ => false,
    }
}

fn fill_date(local: &mut Option<NaiveDate>, remote: Option<NaiveDate>) -> bool {
    match (local.as_ref(), remote) {
        (None, Some(value)) => {
            *local = Some(value);
            true
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::user::UserStatus;

    fn facebook_data() -> FacebookRegistrationData {
        FacebookRegistrationData {
            facebook_id: "100001".to_string(),
            facebook_name: Some("Jane Doe".to_string()),
            facebook_profile_url: Some("https://www.facebook.com/jane.doe".to_string()),
            website_url: Some("https://jane.example.com".to_string()),
            about_me: Some("Rustacean".to_string()),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 12, 31),
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            gender: Some("female".to_string()),
            email: Some("jane@example.com".to_string()),
            username: "jane.doe".to_string(),
            password: "secret".to_string(),
        }
    }

    fn user() -> User {
        User::new(1, "jane@example.com".to_string(), "jane".to_string(), UserStatus::Active)
    }

    #[test]
    fn test_merge_fills_blank_fields() {
        let mut user = user();
        let mut profile = FacebookProfile::empty(1);

        let outcome = merge_facebook_fields(&FacebookField::DEFAULTS, &facebook_data(), &mut user, &mut profile);

        assert_eq!(outcome, MergeOutcome { user_dirty: true, profile_dirty: true });
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.last_name, "Doe");
        assert_eq!(profile.facebook_name.as_deref(), Some("Jane Doe"));
        assert_eq!(profile.date_of_birth, NaiveDate::from_ymd_opt(1990, 12, 31));
        assert_eq!(profile.about_me.as_deref(), Some("Rustacean"));
        // gender is not merged unless configured
        assert!(profile.gender.is_none());
    }

    #[test]
    fn test_merge_never_overwrites_populated_fields() {
        let mut user = user();
        user.first_name = "Janet".to_string();
        user.last_name = "Smith".to_string();
        let mut profile = FacebookProfile::empty(1);
        profile.about_me = Some("Written by hand".to_string());
        profile.date_of_birth = NaiveDate::from_ymd_opt(1985, 1, 1);
        profile.website_url = Some("   ".to_string());

        let outcome = merge_facebook_fields(&FacebookField::DEFAULTS, &facebook_data(), &mut user, &mut profile);

        assert!(!outcome.user_dirty);
        assert!(outcome.profile_dirty);
        assert_eq!(user.first_name, "Janet");
        assert_eq!(user.last_name, "Smith");
        assert_eq!(profile.about_me.as_deref(), Some("Written by hand"));
        assert_eq!(profile.date_of_birth, NaiveDate::from_ymd_opt(1985, 1, 1));
        assert_eq!(profile.website_url.as_deref(), Some("https://jane.example.com"));
    }

    #[test]
    fn test_merge_skips_empty_remote_values() {
        let mut data = facebook_data();
        data.first_name = Some(" ".to_string());
        data.last_name = None;
        let mut user = user();
        let mut profile = FacebookProfile::empty(1);

        let outcome =
            merge_facebook_fields(&[FacebookField::FirstName, FacebookField::LastName], &data, &mut user, &mut profile);

        assert_eq!(outcome, MergeOutcome::default());
        assert!(user.first_name.is_empty());
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut user = user();
        let mut profile = FacebookProfile::empty(1);
        let fields = [FacebookField::Gender, FacebookField::FirstName];

        merge_facebook_fields(&fields, &facebook_data(), &mut user, &mut profile);
        let second = merge_facebook_fields(&fields, &facebook_data(), &mut user, &mut profile);

        assert_eq!(second, MergeOutcome::default());
        assert_eq!(profile.gender.as_deref(), Some("female"));
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in FacebookField::DEFAULTS.into_iter().chain([FacebookField::Gender]) {
            assert_eq!(field.name().parse::<FacebookField>(), Ok(field));
        }
        assert_eq!("email".parse::<FacebookField>(), Err(UnknownField("email".to_string())));
        assert_eq!(FacebookField::FirstName.target(), MergeTarget::User);
        assert_eq!(FacebookField::AboutMe.target(), MergeTarget::Profile);
    }
}
