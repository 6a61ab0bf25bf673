use std::sync::Arc;

use async_trait::async_trait;
use cantoria_core::{AppError, SessionIdentity};
use cantoria_domain::{EmailAddress, ResolvedUser, Role, RoleAssignment, UserId};
use thiserror::Error;
use tracing::warn;

use crate::{ProfileRepository, RoleAssignmentRepository};

/// Reasons a session could not be turned into a member record.
///
/// Callers treat every variant the same way: there is no authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionFailure {
    /// No profile is stored for the authenticated subject.
    #[error("no profile stored for subject '{0}'")]
    ProfileNotFound(String),

    /// The role assignment lookup failed.
    #[error("role assignment lookup failed: {0}")]
    RoleLookupFailure(String),

    /// The session lacks a usable subject or verified email.
    #[error("session is not usable: {0}")]
    InvalidSession(String),

    /// A backend read failed.
    #[error("backend request failed: {0}")]
    TransientNetworkFailure(String),
}

/// Resolves an authenticated session into a member record.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolves the session. Reads only; safe to repeat.
    async fn resolve_user(
        &self,
        session: &SessionIdentity,
    ) -> Result<ResolvedUser, ResolutionFailure>;
}

/// Resolver backed by the profile and role assignment stores.
#[derive(Clone)]
pub struct ProfileIdentityResolver {
    profile_repository: Arc<dyn ProfileRepository>,
    role_assignment_repository: Arc<dyn RoleAssignmentRepository>,
}

impl ProfileIdentityResolver {
    /// Creates a resolver from repository implementations.
    #[must_use]
    pub fn new(
        profile_repository: Arc<dyn ProfileRepository>,
        role_assignment_repository: Arc<dyn RoleAssignmentRepository>,
    ) -> Self {
        Self {
            profile_repository,
            role_assignment_repository,
        }
    }
}

#[async_trait]
impl IdentityResolver for ProfileIdentityResolver {
    async fn resolve_user(
        &self,
        session: &SessionIdentity,
    ) -> Result<ResolvedUser, ResolutionFailure> {
        let user_id = UserId::parse(session.subject())
            .map_err(|error| ResolutionFailure::InvalidSession(error.to_string()))?;

        let profile = self
            .profile_repository
            .find_profile(user_id)
            .await
            .map_err(|error| match error {
                AppError::NotFound(_) => {
                    ResolutionFailure::ProfileNotFound(session.subject().to_owned())
                }
                other => ResolutionFailure::TransientNetworkFailure(other.to_string()),
            })?
            .ok_or_else(|| ResolutionFailure::ProfileNotFound(session.subject().to_owned()))?;

        let assignments = self
            .role_assignment_repository
            .list_role_assignments(user_id)
            .await
            .map_err(|error| ResolutionFailure::RoleLookupFailure(error.to_string()))?;
        let role = primary_role(user_id, &assignments);

        let email = session.email().ok_or_else(|| {
            ResolutionFailure::InvalidSession("session carries no verified email".to_owned())
        })?;
        let email = EmailAddress::new(email)
            .map_err(|error| ResolutionFailure::InvalidSession(error.to_string()))?;

        Ok(ResolvedUser::from_profile(profile, email, role))
    }
}

/// Picks the effective role: the oldest assignment, or the lowest-privilege role when none exist.
fn primary_role(user_id: UserId, assignments: &[RoleAssignment]) -> Role {
    let Some(first) = assignments.first() else {
        return Role::lowest_privilege();
    };

    if assignments.len() > 1 {
        let ignored: Vec<&str> = assignments[1..]
            .iter()
            .map(|assignment| assignment.role.as_str())
            .collect();
        warn!(
            user_id = %user_id,
            primary_role = first.role.as_str(),
            ignored_roles = ?ignored,
            "member holds several roles; only the oldest assignment is effective"
        );
    }

    first.role
}
