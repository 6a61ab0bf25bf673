use std::str::FromStr;

use cantoria_core::{AppError, AppResult};
use cantoria_domain::{Permission, ResolvedUser, Resource, Role, role_permissions};

use crate::{SessionPhase, SessionReader};

/// Answers permission and section-access questions for the live session.
///
/// Every check reads the session slot afresh and never triggers resolution.
/// Without a resolved member every check is denied.
#[derive(Debug, Clone)]
pub struct AuthorizationService {
    session: SessionReader,
}

impl AuthorizationService {
    /// Creates a new authorization service over a session reader.
    #[must_use]
    pub fn new(session: SessionReader) -> Self {
        Self { session }
    }

    /// Returns the resolved member, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<ResolvedUser> {
        self.session.current_user()
    }

    /// Returns the current session phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    /// Returns whether the current member holds the permission.
    #[must_use]
    pub fn has_permission(&self, permission: Permission) -> bool {
        self.current_role()
            .is_some_and(|role| role_grants(role, permission))
    }

    /// Returns whether the current member holds the permission named by `tag`.
    ///
    /// Unknown tags are denied.
    #[must_use]
    pub fn has_permission_tag(&self, tag: &str) -> bool {
        Permission::from_str(tag).is_ok_and(|permission| self.has_permission(permission))
    }

    /// Returns whether the current member may open the section.
    #[must_use]
    pub fn can_access(&self, resource: Resource) -> bool {
        self.current_role().is_some_and(|role| resource.allows(role))
    }

    /// Returns whether the current member may open the section named by `tag`.
    ///
    /// Unknown tags are denied.
    #[must_use]
    pub fn can_access_tag(&self, tag: &str) -> bool {
        Resource::from_str(tag).is_ok_and(|resource| self.can_access(resource))
    }

    /// Ensures the current member holds the permission.
    pub fn require_permission(&self, permission: Permission) -> AppResult<()> {
        let role = self.require_role()?;
        if role_grants(role, permission) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "role '{role}' is missing permission '{}'",
            permission.as_str()
        )))
    }

    /// Ensures the current member may open the section.
    pub fn require_access(&self, resource: Resource) -> AppResult<()> {
        let role = self.require_role()?;
        if resource.allows(role) {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "role '{role}' may not access '{}'",
            resource.as_str()
        )))
    }

    /// Returns the sections the current member may open, in navigation order.
    #[must_use]
    pub fn accessible_resources(&self) -> Vec<Resource> {
        let Some(role) = self.current_role() else {
            return Vec::new();
        };

        Resource::all()
            .iter()
            .copied()
            .filter(|resource| resource.allows(role))
            .collect()
    }

    /// Returns the permissions granted to the current member.
    #[must_use]
    pub fn granted_permissions(&self) -> Vec<Permission> {
        self.current_role()
            .map(|role| role_permissions(role).to_vec())
            .unwrap_or_default()
    }

    fn current_role(&self) -> Option<Role> {
        self.session
            .inspect(|phase| phase.user().map(ResolvedUser::role))
    }

    fn require_role(&self) -> AppResult<Role> {
        self.current_role()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))
    }
}

pub(crate) fn role_grants(role: Role, permission: Permission) -> bool {
    role_permissions(role).contains(&permission)
}
