use cantoria_core::{AppError, AppResult};
use cantoria_domain::ResolvedUser;
use tokio::sync::watch;

/// Phase of the live session as seen by authorization checks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// No session exists.
    #[default]
    Unauthenticated,
    /// A session exists and its member record is being resolved.
    Resolving,
    /// The session resolved to a member.
    Authenticated(ResolvedUser),
    /// The session exists but could not be resolved. Treated as no user.
    ResolutionFailed,
}

impl SessionPhase {
    /// Returns the resolved member, if authenticated.
    #[must_use]
    pub fn user(&self) -> Option<&ResolvedUser> {
        match self {
            Self::Authenticated(user) => Some(user),
            Self::Unauthenticated | Self::Resolving | Self::ResolutionFailed => None,
        }
    }

    /// Returns a stable transport value for this phase.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Resolving => "resolving",
            Self::Authenticated(_) => "authenticated",
            Self::ResolutionFailed => "resolution_failed",
        }
    }
}

/// Read handle on the session slot.
///
/// Reads are synchronous and always observe the latest published phase.
/// Only [`crate::SessionLifecycle`] holds the write side.
#[derive(Debug, Clone)]
pub struct SessionReader {
    receiver: watch::Receiver<SessionPhase>,
}

impl SessionReader {
    pub(crate) fn new(receiver: watch::Receiver<SessionPhase>) -> Self {
        Self { receiver }
    }

    /// Returns a snapshot of the current phase.
    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.receiver.borrow().clone()
    }

    /// Returns the resolved member, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<ResolvedUser> {
        self.receiver.borrow().user().cloned()
    }

    /// Runs a closure against the current phase without cloning it.
    pub fn inspect<R>(&self, read: impl FnOnce(&SessionPhase) -> R) -> R {
        read(&self.receiver.borrow())
    }

    /// Waits for the next published phase and returns it.
    pub async fn changed(&mut self) -> AppResult<SessionPhase> {
        self.receiver
            .changed()
            .await
            .map_err(|_| AppError::Internal("session lifecycle has shut down".to_owned()))?;

        Ok(self.receiver.borrow_and_update().clone())
    }
}
