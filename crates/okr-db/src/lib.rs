//! OKR Database — SurrealDB connection management and repository
//! implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema initialization and migrations ([`run_migrations`])
//! - Error types ([`DbError`])
//! - One SurrealDB repository per record collection, plus the
//!   [`SurrealRepositories`] bundle implementing
//!   [`okr_core::repository::OkrRepositories`]

mod connection;
mod error;
pub mod repository;
mod schema;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::SurrealRepositories;
pub use schema::{run_migrations, schema_v1};
