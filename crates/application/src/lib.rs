//! Application services and ports.

#![forbid(unsafe_code)]

mod account_service;
mod authorization_service;
mod guards;
mod identity_ports;
mod identity_resolver;
mod session_lifecycle;
mod session_state;

pub use account_service::{AccountService, SignUpInput, UpdateProfileInput};
pub use authorization_service::AuthorizationService;
pub use guards::{AccessRequirement, InlineGuard, PageDecision, PageGuard};
pub use identity_ports::{
    IdentityProvider, ProfileRepository, ProfileUpdate, RoleAssignmentRepository, SessionEvent,
};
pub use identity_resolver::{IdentityResolver, ProfileIdentityResolver, ResolutionFailure};
pub use session_lifecycle::SessionLifecycle;
pub use session_state::{SessionPhase, SessionReader};

#[cfg(test)]
mod test_support;
