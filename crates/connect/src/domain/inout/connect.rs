use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use app_core::graph::FacebookGraph;

use crate::domain::entity::action::ConnectAction;
use crate::domain::entity::user::User;

pub const PARAM_FORCE_REGISTRATION: &str = "force_registration";
pub const PARAM_FORCE_REGISTRATION_HARD: &str = "force_registration_hard";

// ╔════════════════════════════╗
// ║    Force registration      ║
// ╚════════════════════════════╝

/// Skips login and connect so a new account is always registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ForceRegistration {
    #[default]
    Off,
    Soft,
    /// Also rewrites the submitted email so it cannot collide with an
    /// existing account.
    Hard,
}

impl ForceRegistration {
    /// Reads the request parameters. Any non-empty value switches a flag on
    /// and the hard flag wins.
    pub fn from_params(params: &BTreeMap<String, String>) -> Self {
        let is_on = |key: &str| params.get(key).is_some_and(|value| !value.trim().is_empty());

        if is_on(PARAM_FORCE_REGISTRATION_HARD) {
            ForceRegistration::Hard
        } else if is_on(PARAM_FORCE_REGISTRATION) {
            ForceRegistration::Soft
        } else {
            ForceRegistration::Off
        }
    }

    pub fn is_set(self) -> bool {
        self != ForceRegistration::Off
    }

    pub fn is_hard(self) -> bool {
        self == ForceRegistration::Hard
    }
}

impl fmt::Display for ForceRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ForceRegistration::Off => "off",
            ForceRegistration::Soft => "soft",
            ForceRegistration::Hard => "hard",
        };
        f.write_str(name)
    }
}

// ╔════════════════════════════╗
// ║          Connect           ║
// ╚════════════════════════════╝

pub struct ConnectInput {
    /// The local user already authenticated on this request, if any.
    pub caller: Option<i64>,
    pub access_token: Option<String>,
    /// A Graph session built by the caller. Takes precedence over
    /// `access_token`.
    pub graph: Option<Arc<dyn FacebookGraph>>,
    pub force_registration: ForceRegistration,
    /// Submitted registration form fields.
    pub form: BTreeMap<String, String>,
}

impl ConnectInput {
    /// Builds the input from the parameters of a request. The force flags are
    /// read from the same parameters that make up the registration form.
    pub fn from_params(
        caller: Option<i64>,
        access_token: Option<String>,
        graph: Option<Arc<dyn FacebookGraph>>,
        params: BTreeMap<String, String>,
    ) -> Self {
        Self {
            caller,
            access_token,
            graph,
            force_registration: ForceRegistration::from_params(&params),
            form: params,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct ConnectOutput {
    pub action: ConnectAction,
    pub user: User,
    /// Present when the request started a new session (login or register).
    pub session: Option<SessionTokens>,
}
