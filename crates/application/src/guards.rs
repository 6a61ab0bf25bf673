//! Render guards for pages and inline fragments.
//!
//! Guards hold no answer of their own: every evaluation takes a fresh
//! snapshot of the session slot.

use cantoria_domain::{Permission, Resource, Role};

use crate::authorization_service::role_grants;
use crate::{AuthorizationService, SessionPhase};

/// What a guard checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRequirement {
    /// The member may open the section.
    Resource(Resource),
    /// The member holds the permission.
    Permission(Permission),
}

impl AccessRequirement {
    /// Returns whether a member holding `role` satisfies the requirement.
    #[must_use]
    pub fn is_met_by(&self, role: Role) -> bool {
        match self {
            Self::Resource(resource) => resource.allows(role),
            Self::Permission(permission) => role_grants(role, *permission),
        }
    }

    fn is_met(&self, authorization: &AuthorizationService) -> bool {
        match self {
            Self::Resource(resource) => authorization.can_access(*resource),
            Self::Permission(permission) => authorization.has_permission(*permission),
        }
    }
}

/// Outcome of a full-page guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDecision {
    /// Render the protected page.
    Render,
    /// Session resolution is in flight; show the loading affordance.
    Loading,
    /// No member is resolved; send the visitor to sign-in.
    RedirectToLogin,
    /// A member is resolved but lacks access.
    AccessDenied,
}

/// Guard for a whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGuard {
    requirement: AccessRequirement,
}

impl PageGuard {
    /// Guards a page behind a section.
    #[must_use]
    pub fn resource(resource: Resource) -> Self {
        Self {
            requirement: AccessRequirement::Resource(resource),
        }
    }

    /// Guards a page behind a permission.
    #[must_use]
    pub fn permission(permission: Permission) -> Self {
        Self {
            requirement: AccessRequirement::Permission(permission),
        }
    }

    /// Returns the guarded requirement.
    #[must_use]
    pub fn requirement(&self) -> AccessRequirement {
        self.requirement
    }

    /// Decides what to render for the current session.
    #[must_use]
    pub fn evaluate(&self, authorization: &AuthorizationService) -> PageDecision {
        match authorization.phase() {
            SessionPhase::Authenticated(user) if self.requirement.is_met_by(user.role()) => {
                PageDecision::Render
            }
            SessionPhase::Authenticated(_) => PageDecision::AccessDenied,
            SessionPhase::Resolving => PageDecision::Loading,
            SessionPhase::Unauthenticated | SessionPhase::ResolutionFailed => {
                PageDecision::RedirectToLogin
            }
        }
    }
}

/// Guard for a fragment inside an already rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineGuard {
    requirement: AccessRequirement,
}

impl InlineGuard {
    /// Shows the fragment only to members who may open the section.
    #[must_use]
    pub fn resource(resource: Resource) -> Self {
        Self {
            requirement: AccessRequirement::Resource(resource),
        }
    }

    /// Shows the fragment only to members holding the permission.
    #[must_use]
    pub fn permission(permission: Permission) -> Self {
        Self {
            requirement: AccessRequirement::Permission(permission),
        }
    }

    /// Returns the content when access is granted, otherwise nothing.
    pub fn show<T>(&self, authorization: &AuthorizationService, content: T) -> Option<T> {
        self.requirement.is_met(authorization).then_some(content)
    }

    /// Returns the content when access is granted, otherwise the fallback.
    pub fn show_or<T>(&self, authorization: &AuthorizationService, content: T, fallback: T) -> T {
        if self.requirement.is_met(authorization) {
            content
        } else {
            fallback
        }
    }
}
