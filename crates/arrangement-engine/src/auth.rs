//! Authentication gate run before any page-level operation.
//!
//! Token issuance and storage belong to the authentication service; this
//! crate only asks whether a usable token exists and who it belongs to.

use crate::error::AuthError;
use crate::model::CurrentUser;

/// Return paths handed to [`AuthGate::check_token`].
pub mod paths {
    pub const HOME: &str = "/";
    pub const NEW_EVENT: &str = "/event/new";
    pub const MY_EVENTS: &str = "/my-events";
}

pub trait AuthGate {
    /// Fail if there is no valid token. `return_path` is where the user is
    /// sent back to after logging in.
    fn check_token(&self, return_path: &str) -> Result<(), AuthError>;

    fn current_user(&self) -> Option<CurrentUser>;
}

/// Gate backed by a token obtained out of band (configuration or environment).
#[derive(Debug, Clone, Default)]
pub struct StaticTokenGate {
    token: Option<String>,
    user: Option<CurrentUser>,
}

impl StaticTokenGate {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|t| !t.trim().is_empty()),
            user: None,
        }
    }

    pub fn with_user(mut self, user: CurrentUser) -> Self {
        self.user = Some(user);
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl AuthGate for StaticTokenGate {
    fn check_token(&self, return_path: &str) -> Result<(), AuthError> {
        match self.token {
            Some(_) => Ok(()),
            None => Err(AuthError::Unauthenticated {
                return_path: return_path.to_string(),
            }),
        }
    }

    fn current_user(&self) -> Option<CurrentUser> {
        self.token.as_ref().and(self.user.clone())
    }
}
