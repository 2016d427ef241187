use std::fmt;

/// What a connect request did with the Facebook identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectAction {
    /// An existing account matching the Facebook identity was logged in.
    Login,
    /// The Facebook identity was linked to the already authenticated caller.
    Connect,
    /// A new local account was created from the Facebook profile.
    Register,
}

impl ConnectAction {
    /// Picks the action for a request.
    ///
    /// An authenticated caller connects unless registration is forced. Anyone
    /// else logs in when a local account matches, otherwise registers.
    pub fn decide(authenticated: bool, force_registration: bool, has_match: bool) -> Self {
        if force_registration {
            ConnectAction::Register
        } else if authenticated {
            ConnectAction::Connect
        } else if has_match {
            ConnectAction::Login
        } else {
            ConnectAction::Register
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectAction::Login => "login",
            ConnectAction::Connect => "connect",
            ConnectAction::Register => "register",
        }
    }
}

impl fmt::Display for ConnectAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
