use async_trait::async_trait;
use cantoria_core::{AppResult, SessionIdentity};
use cantoria_domain::{MemberProfile, RoleAssignment, UserId};
use tokio::sync::broadcast;

/// Session change emitted by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was established by sign-in.
    SignedIn(SessionIdentity),
    /// The live session received a renewed token.
    TokenRefreshed(SessionIdentity),
    /// The session was ended or invalidated.
    SignedOut,
}

impl SessionEvent {
    /// Returns the session carried by the event, if any.
    #[must_use]
    pub fn session(&self) -> Option<&SessionIdentity> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }

    /// Returns a stable name for logging.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SignedIn(_) => "signed_in",
            Self::TokenRefreshed(_) => "token_refreshed",
            Self::SignedOut => "signed_out",
        }
    }
}

/// Partial profile update. `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    /// New display name.
    pub display_name: Option<String>,
    /// New local congregation.
    pub locality: Option<String>,
    /// New region.
    pub region: Option<String>,
    /// New instrument. `Some(None)` clears it.
    pub instrument: Option<Option<String>>,
}

/// Repository port for member profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Finds the profile keyed by the member identifier.
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<MemberProfile>>;

    /// Stores a new profile.
    async fn create_profile(&self, profile: MemberProfile) -> AppResult<()>;

    /// Applies a partial update and returns the stored result.
    async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> AppResult<MemberProfile>;
}

/// Repository port for role assignments.
#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    /// Lists role assignments for a member, oldest assignment first.
    async fn list_role_assignments(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>>;

    /// Replaces every role held by the member with the given one.
    async fn replace_role(&self, assignment: RoleAssignment) -> AppResult<()>;
}

/// Port for the external identity provider.
///
/// Implementations publish a [`SessionEvent`] for every session change they
/// perform so subscribers observe sign-in, refresh and sign-out uniformly.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Registers a new account and returns its subject. Does not sign in.
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<String>;

    /// Establishes a session with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionIdentity>;

    /// Ends the live session, if any.
    async fn sign_out(&self) -> AppResult<()>;

    /// Renews the live session token.
    async fn refresh_session(&self) -> AppResult<SessionIdentity>;

    /// Returns the live session, if one is stored.
    async fn current_session(&self) -> AppResult<Option<SessionIdentity>>;

    /// Subscribes to session change events.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}
