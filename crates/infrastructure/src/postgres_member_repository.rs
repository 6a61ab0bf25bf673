use std::str::FromStr;

use async_trait::async_trait;
use cantoria_application::{ProfileRepository, ProfileUpdate, RoleAssignmentRepository};
use cantoria_core::{AppError, AppResult};
use cantoria_domain::{MemberProfile, Role, RoleAssignment, UserId};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// PostgreSQL-backed repository over the `profiles` and `user_roles` tables.
#[derive(Clone)]
pub struct PostgresMemberRepository {
    pool: PgPool,
}

impl PostgresMemberRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: Uuid,
    display_name: String,
    locality: String,
    region: String,
    instrument: Option<String>,
}

impl From<ProfileRow> for MemberProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            display_name: row.display_name,
            locality: row.locality,
            region: row.region,
            instrument: row.instrument,
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role: String,
}

#[async_trait]
impl ProfileRepository for PostgresMemberRepository {
    async fn find_profile(&self, user_id: UserId) -> AppResult<Option<MemberProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, display_name, locality, region, instrument
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load profile '{user_id}': {error}"))
        })?;

        Ok(row.map(MemberProfile::from))
    }

    async fn create_profile(&self, profile: MemberProfile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (id, display_name, locality, region, instrument)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(profile.display_name.as_str())
        .bind(profile.locality.as_str())
        .bind(profile.region.as_str())
        .bind(profile.instrument.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            let is_duplicate = error
                .as_database_error()
                .is_some_and(|database_error| database_error.is_unique_violation());
            if is_duplicate {
                AppError::Conflict(format!("profile '{}' already exists", profile.id))
            } else {
                AppError::Internal(format!(
                    "failed to create profile '{}': {error}",
                    profile.id
                ))
            }
        })?;

        Ok(())
    }

    async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> AppResult<MemberProfile> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            UPDATE profiles
            SET display_name = COALESCE($2, display_name),
                locality = COALESCE($3, locality),
                region = COALESCE($4, region),
                instrument = CASE WHEN $5 THEN $6 ELSE instrument END,
                updated_at = now()
            WHERE id = $1
            RETURNING id, display_name, locality, region, instrument
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(update.display_name)
        .bind(update.locality)
        .bind(update.region)
        .bind(update.instrument.is_some())
        .bind(update.instrument.flatten())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update profile '{user_id}': {error}"))
        })?;

        row.map(MemberProfile::from)
            .ok_or_else(|| AppError::NotFound(format!("profile '{user_id}' does not exist")))
    }
}

#[async_trait]
impl RoleAssignmentRepository for PostgresMemberRepository {
    async fn list_role_assignments(&self, user_id: UserId) -> AppResult<Vec<RoleAssignment>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT role
            FROM user_roles
            WHERE user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load role assignments for '{user_id}': {error}"
            ))
        })?;

        rows.into_iter()
            .map(|row| {
                Role::from_str(row.role.as_str())
                    .map(|role| RoleAssignment { user_id, role })
                    .map_err(|error| {
                        AppError::Internal(format!(
                            "failed to decode role '{}' for '{user_id}': {error}",
                            row.role
                        ))
                    })
            })
            .collect()
    }

    async fn replace_role(&self, assignment: RoleAssignment) -> AppResult<()> {
        let user_id = assignment.user_id;
        let mut transaction = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to start role transaction: {error}"))
        })?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear roles for '{user_id}': {error}"))
            })?;

        sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
            .bind(user_id.as_uuid())
            .bind(assignment.role.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                let is_missing_profile = error
                    .as_database_error()
                    .is_some_and(|database_error| database_error.is_foreign_key_violation());
                if is_missing_profile {
                    AppError::NotFound(format!("profile '{user_id}' does not exist"))
                } else {
                    AppError::Internal(format!(
                        "failed to assign role '{}' to '{user_id}': {error}",
                        assignment.role
                    ))
                }
            })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit roles for '{user_id}': {error}"))
        })
    }
}

#[cfg(test)]
mod tests;
