use cantoria_application::SessionPhase;
use cantoria_domain::{MemberProfile, ResolvedUser, Resource, role_permissions};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Incoming payload for email/password sign-in.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/sign-in-request.ts"
)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Incoming payload for self-service registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/sign-up-request.ts"
)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub locality: String,
    pub region: String,
    pub instrument: Option<String>,
}

/// Incoming payload for editing the operator's own profile.
///
/// Omitted fields stay unchanged; a blank instrument clears it.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/update-profile-request.ts"
)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub instrument: Option<String>,
}

/// Incoming payload for setting a member's role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    pub role: String,
}

/// Stored member profile.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/profile-response.ts"
)]
pub struct ProfileResponse {
    pub id: String,
    pub display_name: String,
    pub locality: String,
    pub region: String,
    pub instrument: Option<String>,
}

impl From<MemberProfile> for ProfileResponse {
    fn from(profile: MemberProfile) -> Self {
        Self {
            id: profile.id.to_string(),
            display_name: profile.display_name,
            locality: profile.locality,
            region: profile.region,
            instrument: profile.instrument,
        }
    }
}

/// Resolved member as shown in the console header.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/user-response.ts"
)]
pub struct UserResponse {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub role: String,
    pub role_label: String,
    pub locality: String,
    pub region: String,
}

impl From<&ResolvedUser> for UserResponse {
    fn from(user: &ResolvedUser) -> Self {
        Self {
            id: user.id().to_string(),
            display_name: user.display_name().to_owned(),
            email: user.email().as_str().to_owned(),
            role: user.role().as_str().to_owned(),
            role_label: user.role().label().to_owned(),
            locality: user.locality().to_owned(),
            region: user.region().to_owned(),
        }
    }
}

/// Navigation entry for a section the member may open.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/navigation-item-response.ts"
)]
pub struct NavigationItemResponse {
    pub resource: String,
    pub title: String,
    pub path: String,
}

impl From<Resource> for NavigationItemResponse {
    fn from(resource: Resource) -> Self {
        Self {
            resource: resource.as_str().to_owned(),
            title: resource.title().to_owned(),
            path: format!("/sections/{}", resource.as_str()),
        }
    }
}

/// Session snapshot for the live operator.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/session-response.ts"
)]
pub struct SessionResponse {
    pub phase: String,
    pub user: Option<UserResponse>,
    pub resources: Vec<NavigationItemResponse>,
    pub permissions: Vec<String>,
}

impl SessionResponse {
    /// Builds the snapshot from one reading of the session slot.
    pub fn from_phase(phase: &SessionPhase) -> Self {
        let user = phase.user();
        let role = user.map(ResolvedUser::role);

        Self {
            phase: phase.as_str().to_owned(),
            user: user.map(UserResponse::from),
            resources: role
                .map(|role| {
                    Resource::all()
                        .iter()
                        .filter(|resource| resource.allows(role))
                        .map(|resource| NavigationItemResponse::from(*resource))
                        .collect()
                })
                .unwrap_or_default(),
            permissions: role
                .map(|role| {
                    role_permissions(role)
                        .iter()
                        .map(|permission| permission.as_str().to_owned())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// Result of a single permission check.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/permission-check-response.ts"
)]
pub struct PermissionCheckResponse {
    pub permission: String,
    pub granted: bool,
}

/// Protected section as rendered for the member.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/section-response.ts"
)]
pub struct SectionResponse {
    pub resource: String,
    pub title: String,
    pub actions: Vec<String>,
}

/// Answer while the session is still being resolved.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/console-types/src/generated/pending-response.ts"
)]
pub struct PendingResponse {
    pub status: &'static str,
}
