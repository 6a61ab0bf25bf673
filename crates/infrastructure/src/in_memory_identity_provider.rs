//! Identity provider keeping accounts and the live session in process memory.
//!
//! Passwords are stored as Argon2id hashes. Used by the console's memory
//! backend and by tests that need a provider emitting real session events.

use std::collections::HashMap;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use async_trait::async_trait;
use cantoria_application::{IdentityProvider, SessionEvent};
use cantoria_core::{AppError, AppResult, SessionIdentity};
use tokio::sync::{RwLock, broadcast};
use tracing::debug;
use uuid::Uuid;

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
struct StoredAccount {
    subject: String,
    email: String,
    password_hash: String,
}

/// In-memory identity provider.
pub struct InMemoryIdentityProvider {
    argon2: Argon2<'static>,
    accounts: RwLock<HashMap<String, StoredAccount>>,
    live: RwLock<Option<SessionIdentity>>,
    events: broadcast::Sender<SessionEvent>,
}

impl InMemoryIdentityProvider {
    /// Creates a provider with no accounts and no live session.
    #[must_use]
    pub fn new() -> Self {
        let params = Params::new(19456, 2, 1, None).unwrap_or_else(|_| Params::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            accounts: RwLock::new(HashMap::new()),
            live: RwLock::new(None),
            events,
        }
    }

    fn hash_password(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|error| AppError::Internal(format!("failed to hash password: {error}")))?;

        Ok(hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash).map_err(|error| {
            AppError::Internal(format!("failed to parse password hash: {error}"))
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(error) => Err(AppError::Internal(format!(
                "password verification failed: {error}"
            ))),
        }
    }

    fn publish(&self, event: SessionEvent) {
        let kind = event.as_str();
        if self.events.send(event).is_err() {
            debug!(event = kind, "no session event subscribers");
        }
    }

    fn issue_session(account: &StoredAccount) -> SessionIdentity {
        SessionIdentity::new(
            account.subject.clone(),
            Some(account.email.clone()),
            Uuid::new_v4().to_string(),
            Some(Uuid::new_v4().to_string()),
        )
    }
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn account_key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<String> {
        let key = account_key(email);
        let password_hash = self.hash_password(password)?;

        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "an account for '{key}' already exists"
            )));
        }

        let subject = Uuid::new_v4().to_string();
        accounts.insert(
            key.clone(),
            StoredAccount {
                subject: subject.clone(),
                email: key,
                password_hash,
            },
        );

        Ok(subject)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionIdentity> {
        let account = self.accounts.read().await.get(&account_key(email)).cloned();
        let Some(account) = account else {
            return Err(AppError::Unauthorized("invalid credentials".to_owned()));
        };
        if !self.verify_password(password, &account.password_hash)? {
            return Err(AppError::Unauthorized("invalid credentials".to_owned()));
        }

        let session = Self::issue_session(&account);
        *self.live.write().await = Some(session.clone());
        self.publish(SessionEvent::SignedIn(session.clone()));

        Ok(session)
    }

    async fn sign_out(&self) -> AppResult<()> {
        *self.live.write().await = None;
        self.publish(SessionEvent::SignedOut);
        Ok(())
    }

    async fn refresh_session(&self) -> AppResult<SessionIdentity> {
        let mut live = self.live.write().await;
        let Some(current) = live.as_ref() else {
            return Err(AppError::Unauthorized("no live session".to_owned()));
        };

        let session = SessionIdentity::new(
            current.subject(),
            current.email().map(str::to_owned),
            Uuid::new_v4().to_string(),
            Some(Uuid::new_v4().to_string()),
        );
        *live = Some(session.clone());
        drop(live);
        self.publish(SessionEvent::TokenRefreshed(session.clone()));

        Ok(session)
    }

    async fn current_session(&self) -> AppResult<Option<SessionIdentity>> {
        Ok(self.live.read().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use cantoria_application::{IdentityProvider, SessionEvent};
    use cantoria_core::AppError;

    use super::InMemoryIdentityProvider;

    #[tokio::test]
    async fn sign_up_then_sign_in_publishes_session() {
        let provider = InMemoryIdentityProvider::new();
        let mut events = provider.subscribe();

        let subject = provider.sign_up("Ana@Coral.org", "partitura-7").await;
        let session = provider.sign_in("ana@coral.org", "partitura-7").await;

        let (Ok(subject), Ok(session)) = (subject, session) else {
            panic!("sign-up and sign-in should succeed");
        };
        assert_eq!(session.subject(), subject);
        assert_eq!(session.email(), Some("ana@coral.org"));
        assert_eq!(events.recv().await.ok(), Some(SessionEvent::SignedIn(session.clone())));
        assert_eq!(provider.current_session().await.ok().flatten(), Some(session));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_account_are_unauthorized() {
        let provider = InMemoryIdentityProvider::new();
        assert!(provider.sign_up("ana@coral.org", "partitura-7").await.is_ok());

        let wrong = provider.sign_in("ana@coral.org", "partitura-8").await;
        let unknown = provider.sign_in("bia@coral.org", "partitura-7").await;

        assert!(matches!(wrong, Err(AppError::Unauthorized(_))));
        assert!(matches!(unknown, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn duplicate_sign_up_conflicts() {
        let provider = InMemoryIdentityProvider::new();
        assert!(provider.sign_up("ana@coral.org", "partitura-7").await.is_ok());

        let duplicate = provider.sign_up(" ANA@coral.org ", "outra-senha").await;

        assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn refresh_rotates_tokens_and_sign_out_clears() {
        let provider = InMemoryIdentityProvider::new();
        assert!(provider.sign_up("ana@coral.org", "partitura-7").await.is_ok());
        let Ok(first) = provider.sign_in("ana@coral.org", "partitura-7").await else {
            panic!("sign-in should succeed");
        };
        let mut events = provider.subscribe();

        let Ok(refreshed) = provider.refresh_session().await else {
            panic!("refresh should succeed");
        };
        assert_eq!(refreshed.subject(), first.subject());
        assert_ne!(refreshed.access_token(), first.access_token());
        assert_eq!(
            events.recv().await.ok(),
            Some(SessionEvent::TokenRefreshed(refreshed))
        );

        assert!(provider.sign_out().await.is_ok());
        assert_eq!(events.recv().await.ok(), Some(SessionEvent::SignedOut));
        assert_eq!(provider.current_session().await.ok().flatten(), None);
        assert!(matches!(
            provider.refresh_session().await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
