use std::sync::Arc;
use std::time::Duration;

use cantoria_application::{
    AccountService, IdentityProvider, ProfileIdentityResolver, ProfileRepository,
    RoleAssignmentRepository, SessionLifecycle,
};
use cantoria_core::{AppError, AppResult};
use cantoria_domain::Role;
use cantoria_infrastructure::{
    HttpIdentityProvider, InMemoryIdentityProvider, InMemoryMemberRepository, MIGRATOR,
    PostgresMemberRepository,
};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::console_config::{BackendConfig, ConsoleConfig};
use crate::dev_seed;
use crate::state::AppState;

const IDENTITY_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn build_app_state(config: &ConsoleConfig) -> AppResult<AppState> {
    match &config.backend {
        BackendConfig::Memory => {
            let identity_provider = Arc::new(InMemoryIdentityProvider::new());
            let members = Arc::new(InMemoryMemberRepository::new());
            dev_seed::run(
                identity_provider.as_ref(),
                members.as_ref(),
                members.as_ref(),
                Role::all(),
            )
            .await?;

            wire_app_state(identity_provider, members.clone(), members).await
        }
        BackendConfig::Remote {
            database_url,
            identity_url,
            identity_api_key,
        } => {
            let pool = PgPoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to connect to database: {error}"))
                })?;
            MIGRATOR
                .run(&pool)
                .await
                .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

            let http_client = reqwest::Client::builder()
                .timeout(IDENTITY_TIMEOUT)
                .build()
                .map_err(|error| {
                    AppError::Internal(format!("failed to build identity client: {error}"))
                })?;
            let identity_provider = Arc::new(HttpIdentityProvider::new(
                http_client,
                identity_url.clone(),
                identity_api_key.clone(),
            ));
            let members = Arc::new(PostgresMemberRepository::new(pool));

            wire_app_state(identity_provider, members.clone(), members).await
        }
    }
}

/// Connects the session lifecycle to the provider and restores any stored session.
pub async fn wire_app_state(
    identity_provider: Arc<dyn IdentityProvider>,
    profile_repository: Arc<dyn ProfileRepository>,
    role_assignment_repository: Arc<dyn RoleAssignmentRepository>,
) -> AppResult<AppState> {
    let lifecycle = SessionLifecycle::new(Arc::new(ProfileIdentityResolver::new(
        profile_repository.clone(),
        role_assignment_repository.clone(),
    )));
    lifecycle.spawn(identity_provider.subscribe());

    let restored = lifecycle.restore(identity_provider.as_ref()).await?;
    info!(phase = restored.as_str(), "session lifecycle started");

    let authorization_service = lifecycle.authorization_service();
    Ok(AppState {
        account_service: AccountService::new(
            identity_provider,
            profile_repository,
            role_assignment_repository,
            authorization_service.clone(),
        ),
        authorization_service,
        lifecycle,
    })
}
