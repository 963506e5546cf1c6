//! Remote SurrealDB connection.

use surrealdb::Surreal;
use surrealdb::engine::remote::ws::{Client, Ws};
use surrealdb::opt::auth::Root;
use tracing::{debug, info};

use crate::error::DbError;
use crate::repository::SurrealRepositories;
use crate::schema::run_migrations;

/// Where the OKR data lives and how to sign in to it.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// `host:port` of the SurrealDB WebSocket endpoint.
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "127.0.0.1:8000".into(),
            namespace: "okr".into(),
            database: "main".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

/// A signed-in connection scoped to one namespace and database.
///
/// Cloning is cheap; every clone shares the same socket.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Client>,
}

impl DbManager {
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        debug!(url = %config.url, "Opening SurrealDB socket");
        let db = Surreal::new::<Ws>(config.url.as_str()).await?;

        db.signin(Root {
            username: config.username.clone(),
            password: config.password.clone(),
        })
        .await?;
        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;

        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connected to SurrealDB"
        );
        Ok(Self { db })
    }

    /// Bring the schema up to date on this connection.
    pub async fn migrate(&self) -> Result<(), DbError> {
        run_migrations(&self.db).await
    }

    /// Repository bundle sharing this connection.
    pub fn repositories(&self) -> SurrealRepositories<Client> {
        SurrealRepositories::new(self.db.clone())
    }
}
