use serde::{Deserialize, Serialize};

/// Authenticated principal as issued by the external identity provider.
///
/// Only the provider owns these values: the subject is the stable key used to
/// look up domain data and the email is the provider-verified address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
    subject: String,
    email: Option<String>,
    access_token: String,
    refresh_token: Option<String>,
}

impl SessionIdentity {
    /// Creates a session identity from provider session data.
    #[must_use]
    pub fn new(
        subject: impl Into<String>,
        email: Option<String>,
        access_token: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            email,
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// Returns the stable subject claim from the identity provider.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the verified email, if the provider returned one.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Returns the opaque bearer token for the live session.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }

    /// Returns the refresh token, if the provider issued one.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }
}
