use std::collections::HashMap;

use async_trait::async_trait;
use cantoria_application::{ProfileRepository, ProfileUpdate, RoleAssignmentRepository};
use cantoria_core::{AppError, AppResult};
use cantoria_domain::{MemberProfile, RoleAssignment, UserId};
use tokio::sync::RwLock;

/// In-memory store for member profiles and their role assignments.
#[derive(Debug, Default)]
pub struct InMemoryMemberRepository {
    profiles: RwLock<HashMap<UserId, MemberProfile>>,
    assignments: RwLock<Vec<RoleAssignment>>,
}

impl InMemoryMemberRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileRepository for InMemoryMemberRepository {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<MemberProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn create_profile(&self, profile: MemberProfile) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&profile.id) {
            return Err(AppError::Conflict(format!(
                "profile '{}' already exists",
                profile.id
            )));
        }

        profiles.insert(profile.id, profile);
        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> AppResult<MemberProfile> {
        let mut profiles = self.profiles.write().await;
        let profile = profiles
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("profile '{user_id}' does not exist")))?;

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

#[async_trait]
impl RoleAssignmentRepository for InMemoryMemberRepository {
    async fn list_role_assignments(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        Ok(self
            .assignments
            .read()
            .await
            .iter()
            .filter(|assignment| assignment.user_id == user_id)
            .copied()
            .collect())
    }

    async fn replace_role(&self, assignment: RoleAssignment) -> AppResult<()> {
        if !self.profiles.read().await.contains_key(&assignment.user_id) {
            return Err(AppError::NotFound(format!(
                "profile '{}' does not exist",
                assignment.user_id
            )));
        }

        let mut assignments = self.assignments.write().await;
        assignments.retain(|existing| existing.user_id != assignment.user_id);
        assignments.push(assignment);
        Ok(())
    }
}
