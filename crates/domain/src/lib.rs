//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod role;
mod security;
mod user;

pub use role::Role;
pub use security::{
    Permission, Resource, permissions_for_role_tag, role_permissions, roles_for_resource_tag,
};
pub use user::{EmailAddress, MemberProfile, ResolvedUser, RoleAssignment, UserId};
