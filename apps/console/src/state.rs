use cantoria_application::{AccountService, AuthorizationService, SessionLifecycle};

/// Shared console state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub authorization_service: AuthorizationService,
    pub lifecycle: SessionLifecycle,
}
