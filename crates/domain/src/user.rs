//! Member domain types.

use cantoria_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Role;

/// Unique identifier for a member, equal to the identity provider subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a provider subject claim.
    pub fn parse(subject: &str) -> AppResult<Self> {
        Uuid::parse_str(subject.trim())
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid subject '{subject}': {error}")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Profile attributes stored for a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    /// Member identifier.
    pub id: UserId,
    /// Name shown in the console.
    pub display_name: String,
    /// Local congregation.
    pub locality: String,
    /// Region the locality belongs to.
    pub region: String,
    /// Instrument played, if any.
    pub instrument: Option<String>,
}

/// One role held by a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Member holding the role.
    pub user_id: UserId,
    /// Assigned role.
    pub role: Role,
}

/// Member record derived from a live session plus stored profile and role data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUser {
    id: UserId,
    display_name: String,
    email: EmailAddress,
    role: Role,
    locality: String,
    region: String,
}

impl ResolvedUser {
    /// Combines a stored profile with the session email and effective role.
    #[must_use]
    pub fn from_profile(profile: MemberProfile, email: EmailAddress, role: Role) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name,
            email,
            role,
            locality: profile.locality,
            region: profile.region,
        }
    }

    /// Returns the member identifier.
    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the provider-verified email.
    #[must_use]
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Returns the effective role.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Returns the local congregation.
    #[must_use]
    pub fn locality(&self) -> &str {
        self.locality.as_str()
    }

    /// Returns the region.
    #[must_use]
    pub fn region(&self) -> &str {
        self.region.as_str()
    }
}
