use serde::{Deserialize, Serialize};

use crate::error::{DeskError, DeskResult};

/// Access/refresh token pair issued by `token/`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Bearer credential attached to authorized requests
    pub access: String,
    /// Refresh token, stored but never used by the client itself
    pub refresh: String,
}

impl TokenPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: refresh.into(),
        }
    }
}

// Tokens must not end up in logs
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

/// Username/password pair sent to `token/` and `register/`
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields must be non-empty
    pub fn validate(&self) -> DeskResult<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(DeskError::validation(
                "Please fill in all required fields",
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Sign-up form: credentials plus the password confirmation
#[derive(Clone)]
pub struct Registration {
    pub credentials: Credentials,
    pub confirm_password: String,
}

impl Registration {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        confirm_password: impl Into<String>,
    ) -> Self {
        Self {
            credentials: Credentials::new(username, password),
            confirm_password: confirm_password.into(),
        }
    }

    /// Required fields first, then exact password equality
    pub fn validate(&self) -> DeskResult<()> {
        self.credentials.validate()?;
        if self.credentials.password != self.confirm_password {
            return Err(DeskError::validation("Passwords do not match"));
        }
        Ok(())
    }
}
