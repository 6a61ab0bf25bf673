use cantoria_application::{ProfileRepository, ProfileUpdate, RoleAssignmentRepository};
use cantoria_core::AppError;
use cantoria_domain::{MemberProfile, Role, RoleAssignment, UserId};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::PostgresMemberRepository;
use crate::MIGRATOR;

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres member tests: {error}");
    }

    Some(pool)
}

fn profile(id: UserId) -> MemberProfile {
    MemberProfile {
        id,
        display_name: "Joana Prado".to_owned(),
        locality: "Vila Mariana".to_owned(),
        region: "Sao Paulo".to_owned(),
        instrument: None,
    }
}

#[tokio::test]
async fn profile_round_trip_and_partial_update() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresMemberRepository::new(pool);
    let id = UserId::new();

    assert!(repository.create_profile(profile(id)).await.is_ok());
    assert!(matches!(
        repository.create_profile(profile(id)).await,
        Err(AppError::Conflict(_))
    ));
    assert_eq!(
        repository.find_profile(id).await.ok().flatten(),
        Some(profile(id))
    );

    let updated = repository
        .update_profile(
            id,
            ProfileUpdate {
                instrument: Some(Some("clarinete".to_owned())),
                ..ProfileUpdate::default()
            },
        )
        .await;
    let Ok(updated) = updated else {
        panic!("update should succeed");
    };
    assert_eq!(updated.instrument.as_deref(), Some("clarinete"));
    assert_eq!(updated.display_name, "Joana Prado");

    let cleared = repository
        .update_profile(
            id,
            ProfileUpdate {
                instrument: Some(None),
                ..ProfileUpdate::default()
            },
        )
        .await;
    assert_eq!(cleared.ok().and_then(|profile| profile.instrument), None);

    assert!(matches!(
        repository
            .update_profile(UserId::new(), ProfileUpdate::default())
            .await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn replace_role_leaves_single_assignment() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresMemberRepository::new(pool);
    let id = UserId::new();
    assert!(repository.create_profile(profile(id)).await.is_ok());

    for role in [Role::Candidate, Role::Examiner] {
        assert!(
            repository
                .replace_role(RoleAssignment { user_id: id, role })
                .await
                .is_ok()
        );
    }

    assert_eq!(
        repository.list_role_assignments(id).await.unwrap_or_default(),
        vec![RoleAssignment {
            user_id: id,
            role: Role::Examiner,
        }]
    );
    assert!(matches!(
        repository
            .replace_role(RoleAssignment {
                user_id: UserId::new(),
                role: Role::Musician,
            })
            .await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn legacy_multi_role_rows_list_oldest_first() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresMemberRepository::new(pool.clone());
    let id = UserId::new();
    assert!(repository.create_profile(profile(id)).await.is_ok());

    let insert = sqlx::query(
        r#"
            INSERT INTO user_roles (user_id, role, created_at)
            VALUES ($1, 'diacono', now() - interval '2 days'),
                   ($1, 'anciao', now() - interval '1 day')
            "#,
    )
    .bind(id.as_uuid())
    .execute(&pool)
    .await;
    assert!(insert.is_ok());

    let roles: Vec<Role> = repository
        .list_role_assignments(id)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|assignment| assignment.role)
        .collect();

    assert_eq!(roles, vec![Role::Deacon, Role::Elder]);
}
