use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Registration and profile values derived from a Facebook `/me` payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FacebookRegistrationData {
    pub facebook_id: String,
    pub facebook_name: Option<String>,
    pub facebook_profile_url: Option<String>,
    pub website_url: Option<String>,
    pub about_me: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub email: Option<String>,
    pub username: String,
    pub password: String,
}

impl FacebookRegistrationData {
    /// Flattens the data into registration form fields. Missing values are
    /// left out so they never shadow anything the user submitted.
    pub fn to_form_data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                data.insert(key.to_string(), value);
            }
        };

        put("facebook_id", Some(self.facebook_id.clone()));
        put("facebook_name", self.facebook_name.clone());
        put("facebook_profile_url", self.facebook_profile_url.clone());
        put("website_url", self.website_url.clone());
        put("about_me", self.about_me.clone());
        put("date_of_birth", self.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()));
        put("first_name", self.first_name.clone());
        put("last_name", self.last_name.clone());
        put("gender", self.gender.clone());
        put("email", self.email.clone());
        put("username", Some(self.username.clone()));
        put("password1", Some(self.password.clone()));
        put("password2", Some(self.password.clone()));

        data
    }
}
