//! Login credentials and authentication outcomes.

use std::fmt;

/// Username/password pair submitted to a session.
#[derive(Clone, PartialEq, Eq)]
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
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Result of one authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    pub success: bool,
    pub message: String,
}

impl AuthStatus {
    pub fn success() -> Self {
        Self {
            success: true,
            message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            f.write_str("Success")
        } else {
            write!(f, "Failed: {}", self.message)
        }
    }
}
