use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::entity::user::User;
use crate::domain::inout::prelude::*;

// ╔════════════════════════════╗
// ║    Connect                 ║
// ╚════════════════════════════╝

#[derive(Deserialize, Default)]
pub struct ConnectQuery {
    pub force_registration: Option<String>,
    pub force_registration_hard: Option<String>,
}

impl ConnectQuery {
    /// The force flags present in the query string, keyed by parameter name.
    pub fn into_params(self) -> BTreeMap<String, String> {
        [
            (PARAM_FORCE_REGISTRATION, self.force_registration),
            (PARAM_FORCE_REGISTRATION_HARD, self.force_registration_hard),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|value| (key.to_string(), value)))
        .collect()
    }
}

#[derive(Deserialize)]
pub struct ConnectRequest {
    pub access_token: Option<String>,
    /// Registration form fields and force flags.
    #[serde(flatten)]
    pub params: BTreeMap<String, Value>,
}

impl ConnectRequest {
    /// The submitted fields as form values. `false` becomes an empty value so
    /// a flag sent as `false` stays off; nulls and nested values are dropped.
    pub fn form_params(&self) -> BTreeMap<String, String> {
        self.params
            .iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(true) => "true".to_string(),
                    Value::Bool(false) => String::new(),
                    _ => return None,
                };
                Some((key.clone(), value))
            })
            .collect()
    }
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            status: user.status.to_string(),
        }
    }
}

#[derive(Serialize)]
pub struct ConnectResponse {
    pub action: String,
    pub user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl From<ConnectOutput> for ConnectResponse {
    fn from(output: ConnectOutput) -> Self {
        let (access_token, refresh_token) = match output.session {
            Some(session) => (Some(session.access_token), Some(session.refresh_token)),
            None => (None, None),
        };

        Self { action: output.action.to_string(), user: output.user.into(), access_token, refresh_token }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::domain::entity::action::ConnectAction;
    use crate::domain::entity::user::UserStatus;

    #[test]
    fn test_form_params_stringifies_scalars() {
        let req: ConnectRequest = serde_json::from_value(json!({
            "access_token": "tok",
            "username": "jane",
            "age": 30,
            "force_registration": true,
            "force_registration_hard": false,
            "nickname": null,
            "tags": ["a"]
        }))
        .unwrap();

        let params = req.form_params();

        assert_eq!(req.access_token.as_deref(), Some("tok"));
        assert!(!params.contains_key("access_token"));
        assert_eq!(params["username"], "jane");
        assert_eq!(params["age"], "30");
        assert_eq!(params["force_registration"], "true");
        assert_eq!(params["force_registration_hard"], "");
        assert!(!params.contains_key("nickname"));
        assert!(!params.contains_key("tags"));
    }

    #[test]
    fn test_query_into_params() {
        let query = ConnectQuery { force_registration_hard: Some("1".to_string()), ..Default::default() };

        let params = query.into_params();

        assert_eq!(params.len(), 1);
        assert_eq!(params[PARAM_FORCE_REGISTRATION_HARD], "1");
    }

    #[test]
    fn test_connect_response_from_output() {
        let output = ConnectOutput {
            action: ConnectAction::Login,
            user: User::new(4, "jane@example.com".to_string(), "jane".to_string(), UserStatus::Active),
            session: Some(SessionTokens { access_token: "a".to_string(), refresh_token: "r".to_string() }),
        };

        let json = serde_json::to_value(ConnectResponse::from(output)).unwrap();

        assert_eq!(json["action"], "login");
        assert_eq!(json["user"]["id"], 4);
        assert_eq!(json["user"]["status"], UserStatus::Active.to_string());
        assert_eq!(json["access_token"], "a");
        assert_eq!(json["refresh_token"], "r");
    }
}
