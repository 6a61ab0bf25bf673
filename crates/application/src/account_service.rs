//! Account operations offered to the signed-in operator.
//!
//! None of these write the session slot. Session changes go through the
//! identity provider, whose events reach [`crate::SessionLifecycle`].

use std::sync::Arc;

use cantoria_core::{AppError, AppResult, NonEmptyString};
use cantoria_domain::{EmailAddress, MemberProfile, Permission, Role, RoleAssignment, UserId};
use tracing::{error, info, warn};

use crate::{
    AuthorizationService, IdentityProvider, ProfileRepository, ProfileUpdate,
    RoleAssignmentRepository,
};

/// Minimum accepted password length for new accounts.
const PASSWORD_MIN_LENGTH: usize = 8;

/// Input for a self-service registration.
#[derive(Debug, Clone)]
pub struct SignUpInput {
    /// Account email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Name shown in the console.
    pub display_name: String,
    /// Local congregation.
    pub locality: String,
    /// Region.
    pub region: String,
    /// Instrument played, if any.
    pub instrument: Option<String>,
}

/// Input for editing the operator's own profile.
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    /// New display name.
    pub display_name: Option<String>,
    /// New local congregation.
    pub locality: Option<String>,
    /// New region.
    pub region: Option<String>,
    /// New instrument. A blank value clears it.
    pub instrument: Option<String>,
}

/// Application service for sign-in, registration and profile upkeep.
#[derive(Clone)]
pub struct AccountService {
    identity_provider: Arc<dyn IdentityProvider>,
    profile_repository: Arc<dyn ProfileRepository>,
    role_assignment_repository: Arc<dyn RoleAssignmentRepository>,
    authorization_service: AuthorizationService,
}

impl AccountService {
    /// Creates a new account service.
    #[must_use]
    pub fn new(
        identity_provider: Arc<dyn IdentityProvider>,
        profile_repository: Arc<dyn ProfileRepository>,
        role_assignment_repository: Arc<dyn RoleAssignmentRepository>,
        authorization_service: AuthorizationService,
    ) -> Self {
        Self {
            identity_provider,
            profile_repository,
            role_assignment_repository,
            authorization_service,
        }
    }

    /// Signs in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<()> {
        let email = EmailAddress::new(email)?;
        if password.is_empty() {
            return Err(AppError::Validation("password must not be empty".to_owned()));
        }

        let session = self
            .identity_provider
            .sign_in(email.as_str(), password)
            .await?;
        info!(subject = session.subject(), "signed in");

        Ok(())
    }

    /// Registers an account, stores its profile with the lowest-privilege
    /// role, and signs in.
    ///
    /// Signing up again with the same credentials completes an account whose
    /// member record was never stored.
    pub async fn sign_up(&self, input: SignUpInput) -> AppResult<UserId> {
        let email = EmailAddress::new(&input.email)?;
        if input.password.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(AppError::Validation(format!(
                "password must be at least {PASSWORD_MIN_LENGTH} characters"
            )));
        }
        let registration = Registration {
            display_name: NonEmptyString::new(input.display_name)?.into(),
            locality: NonEmptyString::new(input.locality)?.into(),
            region: NonEmptyString::new(input.region)?.into(),
            instrument: non_blank(input.instrument),
        };

        let subject = match self
            .identity_provider
            .sign_up(email.as_str(), &input.password)
            .await
        {
            Ok(subject) => subject,
            Err(AppError::Conflict(message)) => {
                return self
                    .resume_registration(&email, &input.password, registration, message)
                    .await;
            }
            Err(error) => return Err(error),
        };
        let user_id = parse_subject(&subject)?;

        if let Err(error) = self.store_member(registration.profile(user_id)).await {
            error!(
                user_id = %user_id,
                error = %error,
                "account registered without member record"
            );
            return Err(error);
        }
        info!(user_id = %user_id, "account registered");

        self.identity_provider
            .sign_in(email.as_str(), &input.password)
            .await?;

        Ok(user_id)
    }

    /// Stores the member record of an existing account after proving the
    /// caller holds its credentials.
    async fn resume_registration(
        &self,
        email: &EmailAddress,
        password: &str,
        registration: Registration,
        conflict: String,
    ) -> AppResult<UserId> {
        let session = match self.identity_provider.sign_in(email.as_str(), password).await {
            Ok(session) => session,
            Err(AppError::Unauthorized(_)) => return Err(AppError::Conflict(conflict)),
            Err(error) => return Err(error),
        };
        let user_id = parse_subject(session.subject())?;

        if self.profile_repository.find_profile(user_id).await?.is_some() {
            self.identity_provider.sign_out().await?;
            return Err(AppError::Conflict(conflict));
        }

        warn!(user_id = %user_id, "completing registration of account without member record");
        self.store_member(registration.profile(user_id)).await?;
        self.refresh_session().await?;

        Ok(user_id)
    }

    async fn store_member(&self, profile: MemberProfile) -> AppResult<()> {
        let user_id = profile.id;
        self.profile_repository.create_profile(profile).await?;
        self.role_assignment_repository
            .replace_role(RoleAssignment {
                user_id,
                role: Role::lowest_privilege(),
            })
            .await
    }

    /// Ends the live session.
    pub async fn sign_out(&self) -> AppResult<()> {
        self.identity_provider.sign_out().await
    }

    /// Renews the live session so its member record is resolved again.
    pub async fn refresh_session(&self) -> AppResult<()> {
        self.identity_provider.refresh_session().await.map(|_| ())
    }

    /// Updates the operator's own profile and refreshes the session.
    pub async fn update_profile(&self, input: UpdateProfileInput) -> AppResult<MemberProfile> {
        self.authorization_service
            .require_permission(Permission::ManageOwnProfile)?;
        let user = self
            .authorization_service
            .current_user()
            .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

        let update = ProfileUpdate {
            display_name: validated(input.display_name)?,
            locality: validated(input.locality)?,
            region: validated(input.region)?,
            instrument: input.instrument.map(|value| non_blank(Some(value))),
        };
        let profile = self
            .profile_repository
            .update_profile(user.id(), update)
            .await?;

        self.refresh_session().await?;

        Ok(profile)
    }

    /// Sets the role of a member. Takes effect on the member's next session refresh.
    pub async fn assign_role(&self, user_id: UserId, role: Role) -> AppResult<()> {
        self.authorization_service
            .require_permission(Permission::ManageRoles)?;

        if self.profile_repository.find_profile(user_id).await?.is_none() {
            return Err(AppError::NotFound(format!(
                "member '{user_id}' does not exist"
            )));
        }

        self.role_assignment_repository
            .replace_role(RoleAssignment { user_id, role })
            .await?;
        info!(user_id = %user_id, role = role.as_str(), "role assigned");

        Ok(())
    }
}

/// Validated profile fields of a registration.
struct Registration {
    display_name: String,
    locality: String,
    region: String,
    instrument: Option<String>,
}

impl Registration {
    fn profile(self, id: UserId) -> MemberProfile {
        MemberProfile {
            id,
            display_name: self.display_name,
            locality: self.locality,
            region: self.region,
            instrument: self.instrument,
        }
    }
}

fn parse_subject(subject: &str) -> AppResult<UserId> {
    UserId::parse(subject).map_err(|error| {
        AppError::Internal(format!("identity provider returned invalid subject: {error}"))
    })
}

fn validated(value: Option<String>) -> AppResult<Option<String>> {
    value
        .map(|value| NonEmptyString::new(value).map(String::from))
        .transpose()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
