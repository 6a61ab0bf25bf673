//! Demo members for the in-memory backend, one per role.

use cantoria_application::{IdentityProvider, ProfileRepository, RoleAssignmentRepository};
use cantoria_core::AppResult;
use cantoria_domain::{MemberProfile, Role, RoleAssignment, UserId};
use tracing::info;

pub const DEV_SEED_PASSWORD: &str = "cantoria-demo";

const DEV_SEED_LOCALITY: &str = "Central";
const DEV_SEED_REGION: &str = "Regional Demonstração";

/// Returns the sign-in email of the demo member holding `role`.
pub fn seed_email(role: Role) -> String {
    format!("{}@cantoria.local", role.as_str())
}

pub async fn run(
    identity_provider: &dyn IdentityProvider,
    profile_repository: &dyn ProfileRepository,
    role_assignment_repository: &dyn RoleAssignmentRepository,
    roles: &[Role],
) -> AppResult<()> {
    for role in roles.iter().copied() {
        let email = seed_email(role);
        let subject = identity_provider
            .sign_up(email.as_str(), DEV_SEED_PASSWORD)
            .await?;
        let user_id = UserId::parse(subject.as_str())?;

        profile_repository
            .create_profile(MemberProfile {
                id: user_id,
                display_name: format!("{} Demo", role.label()),
                locality: DEV_SEED_LOCALITY.to_owned(),
                region: DEV_SEED_REGION.to_owned(),
                instrument: matches!(role, Role::Candidate | Role::Musician | Role::Instructor)
                    .then(|| "violino".to_owned()),
            })
            .await?;
        role_assignment_repository
            .replace_role(RoleAssignment { user_id, role })
            .await?;

        info!(email = %email, role = role.as_str(), "seeded demo member");
    }

    Ok(())
}
