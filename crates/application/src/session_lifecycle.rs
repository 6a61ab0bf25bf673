use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use cantoria_core::{AppResult, SessionIdentity};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    AuthorizationService, IdentityProvider, IdentityResolver, SessionEvent, SessionPhase,
    SessionReader,
};

/// Drives the session slot from identity provider events.
///
/// Every established or refreshed session is resolved again from scratch.
/// Each resolution attempt carries a sequence number and its outcome is only
/// published while it is still the newest attempt, so a sign-out or a later
/// sign-in always wins over an older resolution that completes late.
#[derive(Clone)]
pub struct SessionLifecycle {
    inner: Arc<LifecycleInner>,
}

struct LifecycleInner {
    resolver: Arc<dyn IdentityResolver>,
    sender: watch::Sender<SessionPhase>,
    latest_attempt: AtomicU64,
}

impl SessionLifecycle {
    /// Creates a lifecycle in the unauthenticated phase.
    #[must_use]
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        let (sender, _) = watch::channel(SessionPhase::Unauthenticated);

        Self {
            inner: Arc::new(LifecycleInner {
                resolver,
                sender,
                latest_attempt: AtomicU64::new(0),
            }),
        }
    }

    /// Returns a read handle on the session slot.
    #[must_use]
    pub fn reader(&self) -> SessionReader {
        SessionReader::new(self.inner.sender.subscribe())
    }

    /// Returns an authorization service reading this lifecycle's slot.
    #[must_use]
    pub fn authorization_service(&self) -> AuthorizationService {
        AuthorizationService::new(self.reader())
    }

    /// Applies one identity provider event and waits for any resolution it starts.
    pub async fn handle_event(&self, event: SessionEvent) -> SessionPhase {
        debug!(event = event.as_str(), "session event received");

        match event {
            SessionEvent::SignedIn(session) | SessionEvent::TokenRefreshed(session) => {
                self.session_established(session).await
            }
            SessionEvent::SignedOut => {
                self.session_ended();
                SessionPhase::Unauthenticated
            }
        }
    }

    /// Resolves a newly established session and publishes the outcome.
    ///
    /// Returns the phase in the slot once the attempt finished, which is not
    /// this attempt's outcome when a newer event superseded it.
    pub async fn session_established(&self, session: SessionIdentity) -> SessionPhase {
        let attempt = self.start_attempt();
        self.finish_attempt(attempt, session).await
    }

    /// Claims the next attempt number and marks the slot as resolving.
    fn start_attempt(&self) -> u64 {
        let mut attempt = 0;
        self.inner.sender.send_modify(|phase| {
            attempt = self.inner.latest_attempt.fetch_add(1, Ordering::SeqCst) + 1;
            *phase = SessionPhase::Resolving;
        });
        attempt
    }

    /// Publishes the resolution outcome while `attempt` is still the newest.
    async fn finish_attempt(&self, attempt: u64, session: SessionIdentity) -> SessionPhase {
        let next = match self.inner.resolver.resolve_user(&session).await {
            Ok(user) => {
                info!(
                    user_id = %user.id(),
                    role = user.role().as_str(),
                    "session resolved"
                );
                SessionPhase::Authenticated(user)
            }
            Err(failure) => {
                warn!(subject = session.subject(), error = %failure, "session resolution failed");
                SessionPhase::ResolutionFailed
            }
        };

        let applied = self.inner.sender.send_if_modified(|phase| {
            if self.inner.latest_attempt.load(Ordering::SeqCst) != attempt {
                return false;
            }
            *phase = next;
            true
        });
        if !applied {
            debug!(attempt, "discarded stale session resolution");
        }

        self.inner.sender.borrow().clone()
    }

    /// Clears the session slot immediately.
    pub fn session_ended(&self) {
        self.inner.sender.send_modify(|phase| {
            self.inner.latest_attempt.fetch_add(1, Ordering::SeqCst);
            *phase = SessionPhase::Unauthenticated;
        });
        info!("session ended");
    }

    /// Resolves a session already stored by the provider at startup.
    pub async fn restore(&self, provider: &dyn IdentityProvider) -> AppResult<SessionPhase> {
        match provider.current_session().await? {
            Some(session) => Ok(self.session_established(session).await),
            None => {
                self.session_ended();
                Ok(SessionPhase::Unauthenticated)
            }
        }
    }

    /// Consumes provider events until the provider shuts down.
    ///
    /// Attempt numbers are claimed here in arrival order. Only the lookups
    /// run on their own tasks, so a later event is never queued behind a
    /// slow lookup and a late lookup never overwrites a later event.
    pub fn spawn(&self, mut events: broadcast::Receiver<SessionEvent>) -> JoinHandle<()> {
        let lifecycle = self.clone();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(SessionEvent::SignedOut) => lifecycle.session_ended(),
                    Ok(
                        SessionEvent::SignedIn(session) | SessionEvent::TokenRefreshed(session),
                    ) => {
                        let attempt = lifecycle.start_attempt();
                        let lifecycle = lifecycle.clone();
                        tokio::spawn(async move {
                            lifecycle.finish_attempt(attempt, session).await;
                        });
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "session event subscriber lagged");
                    }
                    Err(RecvError::Closed) => {
                        info!("identity provider event stream closed");
                        break;
                    }
                }
            }
        })
    }
}
