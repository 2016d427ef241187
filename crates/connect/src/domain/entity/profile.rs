use chrono::NaiveDate;

/// The Facebook extension of a local user, one per user.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FacebookProfile {
    pub user_id: i64,
    pub facebook_id: Option<String>,
    pub facebook_name: Option<String>,
    pub facebook_profile_url: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub about_me: Option<String>,
    pub website_url: Option<String>,
    pub gender: Option<String>,
    /// The last `/me` payload, serialized as JSON.
    pub raw_data: Option<String>,
    /// Forces the next Facebook login to merge the profile again.
    pub fb_update_required: bool,
}

impl FacebookProfile {
    pub fn empty(user_id: i64) -> Self {
        Self { user_id, ..Default::default() }
    }

    pub fn is_connected(&self) -> bool {
        self.facebook_id.as_deref().is_some_and(|id| !id.is_empty())
    }
}
