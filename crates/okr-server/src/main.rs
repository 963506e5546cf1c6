//! OKR command-line entry point.

mod config;
mod local;

use anyhow::{Context, bail};
use chrono::Utc;
use clap::Parser;
use okr_calendar::CalendarScheduler;
use okr_core::repository::{OkrRepositories, ProfileRepository};
use okr_dashboard::{DashboardEngine, DashboardScope};
use okr_db::{DbConfig, DbManager, SurrealRepositories};
use okr_session::{Identity, RoleResolver, SessionContext};
use serde_json::json;
use surrealdb::engine::remote::ws::Client;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::{Cli, Command, DbArgs};
use crate::local::LocalState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("okr={},warn", cli.log_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .json()
        .init();

    match cli.command {
        Command::Migrate => {
            let db = connect(&cli.db).await?;
            db.migrate().await?;
            info!("Schema is up to date");
        }
        Command::Companies { user, select } => {
            let repos = connect(&cli.db).await?.repositories();
            let local = LocalState::open(&cli.storage_path)?;
            let mut selector = local.selector(repos.companies().clone());
            let ctx = session_for(&repos, user).await?;
            selector.reconcile(&ctx).await;
            if let Some(company_id) = select {
                selector.select(company_id)?;
            }
            let report = json!({
                "role": ctx.role.role(),
                "visible": selector.visible(),
                "selected": selector.selected(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Dashboard {
            user,
            company,
            date,
        } => {
            let repos = connect(&cli.db).await?.repositories();
            let ctx = session_for(&repos, user).await?;
            let company_id = match company {
                Some(id) => id,
                None => {
                    let local = LocalState::open(&cli.storage_path)?;
                    let mut selector = local.selector(repos.companies().clone());
                    selector.reconcile(&ctx).await;
                    match selector.selected() {
                        Some(selected) => selected.id,
                        None => bail!("user {user} has no company to show"),
                    }
                }
            };
            let role = ctx.role.role().unwrap_or_default();
            let today = date.unwrap_or_else(|| Utc::now().date_naive());

            let engine = DashboardEngine::new(repos);
            let dashboard = engine
                .load(DashboardScope::new(company_id, user, role), today)
                .await;
            println!("{}", serde_json::to_string_pretty(&dashboard)?);
        }
        Command::SignOut => {
            LocalState::open(&cli.storage_path)?.sign_out();
            info!("Signed out");
        }
        Command::Schedule { quarter, calendar } => {
            let repos = connect(&cli.db).await?.repositories();
            let scheduler = CalendarScheduler::from_config(repos, &calendar.into())?;
            let outcome = scheduler.schedule_quarter(quarter).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

async fn connect(args: &DbArgs) -> anyhow::Result<DbManager> {
    let config: DbConfig = args.clone().into();
    DbManager::connect(&config)
        .await
        .context("connecting to SurrealDB")
}

/// Session context for `user` as if they had just signed in.
async fn session_for(
    repos: &SurrealRepositories<Client>,
    user: Uuid,
) -> anyhow::Result<SessionContext> {
    let profile = repos
        .profiles()
        .get_by_id(user)
        .await
        .with_context(|| format!("loading profile {user}"))?;
    let identity = Identity {
        id: profile.id,
        email: profile.email.clone(),
    };
    let resolver = RoleResolver::new(repos.profiles().clone());
    Ok(resolver
        .resolve_context(SessionContext::new(Some(identity), Some(profile)))
        .await)
}
