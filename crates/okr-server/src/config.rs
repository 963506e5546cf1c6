//! Command-line arguments and environment handling.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use okr_calendar::CalendarConfig;
use okr_db::DbConfig;
use uuid::Uuid;

/// OKR workspace tooling: schema migrations, dashboards and check-in
/// invites.
#[derive(Parser, Debug)]
#[command(name = "okr", version)]
pub struct Cli {
    #[command(flatten)]
    pub db: DbArgs,

    /// JSON file holding the persisted company selection
    #[arg(long, env = "OKR_STORAGE_PATH", default_value = ".okr/storage.json")]
    pub storage_path: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct DbArgs {
    /// SurrealDB WebSocket address
    #[arg(long = "db-url", env = "SURREAL_URL", default_value = "127.0.0.1:8000")]
    pub url: String,

    #[arg(long = "db-namespace", env = "SURREAL_NS", default_value = "okr")]
    pub namespace: String,

    #[arg(long = "db-database", env = "SURREAL_DB", default_value = "main")]
    pub database: String,

    #[arg(long = "db-user", env = "SURREAL_USER", default_value = "root")]
    pub username: String,

    #[arg(long = "db-pass", env = "SURREAL_PASS", default_value = "root", hide_env_values = true)]
    pub password: String,
}

impl From<DbArgs> for DbConfig {
    fn from(args: DbArgs) -> Self {
        DbConfig {
            url: args.url,
            namespace: args.namespace,
            database: args.database,
            username: args.username,
            password: args.password,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply the database schema
    Migrate,

    /// List the companies a user can see and settle their selection
    Companies {
        #[arg(long)]
        user: Uuid,

        /// Switch the selection to this company
        #[arg(long)]
        select: Option<Uuid>,
    },

    /// Print the dashboard for a user as JSON
    Dashboard {
        #[arg(long)]
        user: Uuid,

        /// Company to show; defaults to the persisted selection
        #[arg(long)]
        company: Option<Uuid>,

        /// Evaluate as of this day (default: today, UTC)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Forget the stored company selection and end the session
    SignOut,

    /// Send calendar invites for a quarter's scheduled check-ins
    Schedule {
        #[arg(long)]
        quarter: Uuid,

        #[command(flatten)]
        calendar: CalendarArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CalendarArgs {
    /// OAuth access token; without it invites are only simulated
    #[arg(long, env = "GOOGLE_CALENDAR_TOKEN", hide_env_values = true)]
    pub calendar_token: Option<String>,

    #[arg(long, env = "GOOGLE_CALENDAR_ID", default_value = "primary")]
    pub calendar_id: String,
}

impl From<CalendarArgs> for CalendarConfig {
    fn from(args: CalendarArgs) -> Self {
        CalendarConfig {
            access_token: args.calendar_token.filter(|t| !t.trim().is_empty()),
            calendar_id: args.calendar_id,
            ..CalendarConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dashboard_command() {
        let user = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "okr",
            "--db-url",
            "db.internal:8000",
            "dashboard",
            "--user",
            &user.to_string(),
            "--date",
            "2026-05-01",
        ])
        .unwrap();

        assert_eq!(cli.db.url, "db.internal:8000");
        match cli.command {
            Command::Dashboard { user: u, company, date } => {
                assert_eq!(u, user);
                assert_eq!(company, None);
                assert_eq!(date, NaiveDate::from_ymd_opt(2026, 5, 1));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_sign_out_with_storage_path() {
        let cli =
            Cli::try_parse_from(["okr", "--storage-path", "/tmp/okr.json", "sign-out"]).unwrap();
        assert_eq!(cli.storage_path, PathBuf::from("/tmp/okr.json"));
        assert!(matches!(cli.command, Command::SignOut));
    }

    #[test]
    fn blank_calendar_token_means_simulated() {
        let config: CalendarConfig = CalendarArgs {
            calendar_token: Some("  ".into()),
            calendar_id: "team".into(),
        }
        .into();
        assert_eq!(config.access_token, None);
        assert_eq!(config.calendar_id, "team");
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
