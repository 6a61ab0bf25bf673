use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cantoria_core::{AppError, AppResult, SessionIdentity};
use cantoria_domain::{EmailAddress, MemberProfile, ResolvedUser, Role, RoleAssignment, UserId};
use tokio::sync::{Mutex, Notify, broadcast, watch};

use crate::{
    IdentityProvider, IdentityResolver, ProfileRepository, ProfileUpdate, ResolutionFailure,
    RoleAssignmentRepository, SessionEvent, SessionLifecycle, SessionPhase, SessionReader,
};

/// Resolver whose outcome per subject is scripted by the test.
pub(crate) struct ScriptedResolver {
    outcomes: Mutex<HashMap<String, Result<ResolvedUser, ResolutionFailure>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    completed: watch::Sender<usize>,
}

impl Default for ScriptedResolver {
    fn default() -> Self {
        Self {
            outcomes: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            completed: watch::channel(0).0,
        }
    }
}

impl ScriptedResolver {
    pub(crate) async fn set_outcome(
        &self,
        subject: &str,
        outcome: Result<ResolvedUser, ResolutionFailure>,
    ) {
        self.outcomes
            .lock()
            .await
            .insert(subject.to_owned(), outcome);
    }

    /// Holds resolutions for `subject` until the returned gate is notified.
    pub(crate) async fn gate(&self, subject: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .await
            .insert(subject.to_owned(), gate.clone());
        gate
    }

    /// Waits until `count` resolutions have returned, failing after two seconds.
    pub(crate) async fn wait_for_resolutions(&self, count: usize) {
        let mut completed = self.completed.subscribe();
        let reached = tokio::time::timeout(
            Duration::from_secs(2),
            completed.wait_for(|done| *done >= count),
        )
        .await
        .is_ok_and(|waited| waited.is_ok());

        assert!(reached, "resolver never completed {count} resolutions");
    }
}

#[async_trait]
impl IdentityResolver for ScriptedResolver {
    async fn resolve_user(
        &self,
        session: &SessionIdentity,
    ) -> Result<ResolvedUser, ResolutionFailure> {
        let gate = self.gates.lock().await.get(session.subject()).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let outcome = self
            .outcomes
            .lock()
            .await
            .get(session.subject())
            .cloned()
            .unwrap_or_else(|| {
                Err(ResolutionFailure::ProfileNotFound(
                    session.subject().to_owned(),
                ))
            });
        self.completed.send_modify(|done| *done += 1);

        outcome
    }
}

pub(crate) fn member(role: Role, name: &str) -> (SessionIdentity, ResolvedUser) {
    let id = UserId::new();
    let address = format!("{}@coral.org", role.as_str());
    let Ok(email) = EmailAddress::new(address.clone()) else {
        panic!("test email '{address}' must be valid");
    };
    let user = ResolvedUser::from_profile(
        MemberProfile {
            id,
            display_name: name.to_owned(),
            locality: "Central".to_owned(),
            region: "Campinas".to_owned(),
            instrument: None,
        },
        email,
        role,
    );
    let session = SessionIdentity::new(id.to_string(), Some(address), "access-token", None);

    (session, user)
}

/// Builds a lifecycle already authenticated as a member holding `role`.
pub(crate) async fn signed_in_as(role: Role) -> (SessionLifecycle, Arc<ScriptedResolver>) {
    let resolver = Arc::new(ScriptedResolver::default());
    let (session, user) = member(role, "Membro de Teste");
    resolver.set_outcome(session.subject(), Ok(user)).await;

    let lifecycle = SessionLifecycle::new(resolver.clone());
    lifecycle.session_established(session).await;

    (lifecycle, resolver)
}

/// Waits until the slot reaches the named phase, failing after two seconds.
pub(crate) async fn wait_for(reader: &mut SessionReader, expected: &str) -> SessionPhase {
    let deadline = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let phase = reader.phase();
            if phase.as_str() == expected {
                return phase;
            }
            if reader.changed().await.is_err() {
                return phase;
            }
        }
    });

    match deadline.await {
        Ok(phase) => phase,
        Err(_) => panic!("session never reached phase '{expected}'"),
    }
}

#[derive(Default)]
pub(crate) struct FakeProfileRepository {
    pub(crate) profiles: Mutex<HashMap<UserId, MemberProfile>>,
    pub(crate) unavailable: bool,
    /// Number of upcoming profile inserts that fail.
    pub(crate) failing_inserts: Mutex<u32>,
}

#[async_trait]
impl ProfileRepository for FakeProfileRepository {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<MemberProfile>> {
        if self.unavailable {
            return Err(AppError::Internal("connection reset by peer".to_owned()));
        }

        Ok(self.profiles.lock().await.get(&user_id).cloned())
    }

    async fn create_profile(&self, profile: MemberProfile) -> AppResult<()> {
        let mut failing = self.failing_inserts.lock().await;
        if *failing > 0 {
            *failing -= 1;
            return Err(AppError::Internal("profiles insert timed out".to_owned()));
        }
        drop(failing);

        self.profiles.lock().await.insert(profile.id, profile);
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> AppResult<MemberProfile> {
        let mut profiles = self.profiles.lock().await;
        let profile = profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(user_id.to_string()))?;
        if let Some(display_name) = update.display_name {
            profile.display_name = display_name;
        }
        if let Some(locality) = update.locality {
            profile.locality = locality;
        }
        if let Some(region) = update.region {
            profile.region = region;
        }
        if let Some(instrument) = update.instrument {
            profile.instrument = instrument;
        }

        Ok(profile.clone())
    }
}

#[derive(Default)]
pub(crate) struct FakeRoleAssignmentRepository {
    pub(crate) assignments: Mutex<Vec<RoleAssignment>>,
    pub(crate) unavailable: bool,
}

#[async_trait]
impl RoleAssignmentRepository for FakeRoleAssignmentRepository {
    async fn list_role_assignments(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        if self.unavailable {
            return Err(AppError::Internal("user_roles query timed out".to_owned()));
        }

        Ok(self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|assignment| assignment.user_id == user_id)
            .copied()
            .collect())
    }

    async fn replace_role(&self, assignment: RoleAssignment) -> AppResult<()> {
        let mut assignments = self.assignments.lock().await;
        assignments.retain(|existing| existing.user_id != assignment.user_id);
        assignments.push(assignment);
        Ok(())
    }
}

/// Identity provider holding accounts in memory and publishing every session change.
pub(crate) struct FakeIdentityProvider {
    accounts: Mutex<HashMap<String, (String, String)>>,
    live: Mutex<Option<SessionIdentity>>,
    events: broadcast::Sender<SessionEvent>,
    pub(crate) refreshes: Mutex<u32>,
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            live: Mutex::new(None),
            events: broadcast::channel(16).0,
            refreshes: Mutex::new(0),
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<String> {
        let mut accounts = self.accounts.lock().await;
        if accounts.contains_key(email) {
            return Err(AppError::Conflict("account already exists".to_owned()));
        }
        let subject = UserId::new().to_string();
        accounts.insert(email.to_owned(), (subject.clone(), password.to_owned()));
        Ok(subject)
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<SessionIdentity> {
        let accounts = self.accounts.lock().await;
        let Some((subject, stored)) = accounts.get(email) else {
            return Err(AppError::Unauthorized("invalid credentials".to_owned()));
        };
        if stored != password {
            return Err(AppError::Unauthorized("invalid credentials".to_owned()));
        }

        let session =
            SessionIdentity::new(subject.clone(), Some(email.to_owned()), "access-token", None);
        *self.live.lock().await = Some(session.clone());
        let _ = self.events.send(SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> AppResult<()> {
        *self.live.lock().await = None;
        let _ = self.events.send(SessionEvent::SignedOut);
        Ok(())
    }

    async fn refresh_session(&self) -> AppResult<SessionIdentity> {
        let session = self
            .live
            .lock()
            .await
            .clone()
            .ok_or_else(|| AppError::Unauthorized("no live session".to_owned()))?;
        *self.refreshes.lock().await += 1;
        let _ = self.events.send(SessionEvent::TokenRefreshed(session.clone()));
        Ok(session)
    }

    async fn current_session(&self) -> AppResult<Option<SessionIdentity>> {
        Ok(self.live.lock().await.clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}
