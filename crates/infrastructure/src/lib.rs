//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_identity_provider;
mod in_memory_identity_provider;
mod in_memory_member_repository;
mod postgres_member_repository;

pub use http_identity_provider::HttpIdentityProvider;
pub use in_memory_identity_provider::InMemoryIdentityProvider;
pub use in_memory_member_repository::InMemoryMemberRepository;
pub use postgres_member_repository::PostgresMemberRepository;

pub use sqlx::migrate::Migrator;

/// Schema migrations for the member tables.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");
