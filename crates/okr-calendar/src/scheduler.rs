//! Check-in meeting scheduling for a quarter.

use std::sync::Arc;

use okr_core::error::OkrResult;
use okr_core::repository::{
    OkrRepositories, ProfileRepository, QuarterRepository, ScheduledCheckinRepository,
};
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::{CalendarClient, CalendarEvent, GoogleCalendarClient};
use crate::config::CalendarConfig;
use crate::error::CalendarError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleOutcome {
    pub created: usize,
    pub failed: usize,
    /// No calendar call was made; `created` is what would have been.
    pub simulated: bool,
}

/// Creates one all-day event per scheduled check-in of a quarter,
/// inviting every active member of the quarter's company.
pub struct CalendarScheduler<R: OkrRepositories, C: CalendarClient> {
    repos: R,
    client: Option<C>,
}

impl<R: OkrRepositories> CalendarScheduler<R, GoogleCalendarClient> {
    /// Build from configuration; no access token means simulated mode.
    pub fn from_config(repos: R, config: &CalendarConfig) -> Result<Self, CalendarError> {
        let client = config
            .access_token
            .as_deref()
            .map(|token| GoogleCalendarClient::new(config, token))
            .transpose()?;
        Ok(Self::new(repos, client))
    }
}

impl<R: OkrRepositories, C: CalendarClient> CalendarScheduler<R, C> {
    pub fn new(repos: R, client: Option<C>) -> Self {
        Self { repos, client }
    }

    pub fn is_simulated(&self) -> bool {
        self.client.is_none()
    }

    pub fn client(&self) -> Option<&C> {
        self.client.as_ref()
    }

    /// Send invites for every scheduled check-in of `quarter_id`.
    ///
    /// Lookup failures are returned; failures of individual events are
    /// logged and counted.
    pub async fn schedule_quarter(&self, quarter_id: Uuid) -> OkrResult<ScheduleOutcome> {
        let quarter = self.repos.quarters().get_by_id(quarter_id).await?;
        let checkins = self
            .repos
            .scheduled_checkins()
            .list_by_quarter(quarter_id)
            .await?;
        let attendees: Vec<String> = self
            .repos
            .profiles()
            .list_by_company(quarter.company_id)
            .await?
            .into_iter()
            .filter(|p| p.active)
            .map(|p| p.email)
            .collect();

        let Some(client) = &self.client else {
            info!(
                quarter_id = %quarter_id,
                checkins = checkins.len(),
                attendees = attendees.len(),
                "No calendar credential, simulating invites"
            );
            return Ok(ScheduleOutcome {
                created: checkins.len(),
                failed: 0,
                simulated: true,
            });
        };

        let mut outcome = ScheduleOutcome::default();
        for checkin in &checkins {
            let event = CalendarEvent {
                summary: format!("{}: {}", quarter.name, checkin.title),
                description: Some(format!("OKR check-in for {}", quarter.name)),
                date: checkin.date,
                attendees: attendees.clone(),
            };
            match client.create_event(&event).await {
                Ok(event_id) => {
                    info!(quarter_id = %quarter_id, checkin_id = %checkin.id, event_id, "Calendar event created");
                    outcome.created += 1;
                }
                Err(e) => {
                    warn!(quarter_id = %quarter_id, checkin_id = %checkin.id, error = %e, "Calendar event failed");
                    outcome.failed += 1;
                }
            }
        }

        info!(
            quarter_id = %quarter_id,
            created = outcome.created,
            failed = outcome.failed,
            "Quarter check-ins scheduled"
        );
        Ok(outcome)
    }
}

impl<R, C> CalendarScheduler<R, C>
where
    R: OkrRepositories + 'static,
    C: CalendarClient + 'static,
{
    /// Run [`schedule_quarter`](Self::schedule_quarter) in the
    /// background. The outcome is only logged.
    pub fn spawn_schedule(self: &Arc<Self>, quarter_id: Uuid) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            match scheduler.schedule_quarter(quarter_id).await {
                Ok(outcome) => info!(
                    quarter_id = %quarter_id,
                    created = outcome.created,
                    failed = outcome.failed,
                    simulated = outcome.simulated,
                    "Background scheduling finished"
                ),
                Err(e) => warn!(quarter_id = %quarter_id, error = %e, "Background scheduling failed"),
            }
        })
    }
}
