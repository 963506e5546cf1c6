//! Calendar API clients.

use chrono::{Days, NaiveDate};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::config::CalendarConfig;
use crate::error::CalendarError;

/// An all-day event with invitees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub attendees: Vec<String>,
}

pub trait CalendarClient: Send + Sync {
    /// Create the event and return the provider's event id.
    fn create_event(
        &self,
        event: &CalendarEvent,
    ) -> impl Future<Output = Result<String, CalendarError>> + Send;
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    id: String,
}

/// Google Calendar v3 `events.insert` over HTTPS.
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    events_url: Url,
    access_token: String,
}

impl GoogleCalendarClient {
    pub fn new(config: &CalendarConfig, access_token: impl Into<String>) -> Result<Self, CalendarError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("okr-calendar/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http_client,
            events_url: events_url(&config.api_base_url, &config.calendar_id)?,
            access_token: access_token.into(),
        })
    }
}

impl CalendarClient for GoogleCalendarClient {
    async fn create_event(&self, event: &CalendarEvent) -> Result<String, CalendarError> {
        debug!(summary = %event.summary, date = %event.date, "Creating calendar event");

        let response = self
            .http_client
            .post(self.events_url.clone())
            .query(&[("sendUpdates", "all")])
            .bearer_auth(&self.access_token)
            .json(&event_body(event))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CalendarError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let created: CreatedEvent = response
            .json()
            .await
            .map_err(|e| CalendarError::InvalidResponse(e.to_string()))?;
        Ok(created.id)
    }
}

/// `{base}/calendars/{calendar_id}/events`, with the id percent-encoded.
fn events_url(base: &str, calendar_id: &str) -> Result<Url, CalendarError> {
    let mut url = Url::parse(base).map_err(|e| CalendarError::Config(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| CalendarError::Config(format!("'{base}' cannot be a base URL")))?
        .pop_if_empty()
        .extend(["calendars", calendar_id, "events"]);
    Ok(url)
}

/// Request body for an all-day event. The end date is exclusive.
fn event_body(event: &CalendarEvent) -> Value {
    let end = event.date.checked_add_days(Days::new(1)).unwrap_or(event.date);
    let attendees: Vec<Value> = event
        .attendees
        .iter()
        .map(|email| json!({ "email": email }))
        .collect();

    json!({
        "summary": event.summary,
        "description": event.description,
        "start": { "date": event.date.to_string() },
        "end": { "date": end.to_string() },
        "attendees": attendees,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_url_encodes_calendar_id() {
        let url = events_url("https://www.googleapis.com/calendar/v3", "team@example.com").unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.googleapis.com/calendar/v3/calendars/team@example.com/events"
        );

        let url = events_url("https://calendar.test/v3/", "a b").unwrap();
        assert_eq!(url.as_str(), "https://calendar.test/v3/calendars/a%20b/events");
    }

    #[test]
    fn rejects_unusable_base_url() {
        assert!(matches!(
            events_url("not a url", "primary"),
            Err(CalendarError::Config(_))
        ));
    }

    #[test]
    fn all_day_body_ends_next_day() {
        let event = CalendarEvent {
            summary: "Q2: Mid-quarter check-in".into(),
            description: None,
            date: NaiveDate::from_ymd_opt(2026, 6, 30).unwrap(),
            attendees: vec!["ana@example.com".into(), "bo@example.com".into()],
        };

        let body = event_body(&event);
        assert_eq!(body["start"]["date"], "2026-06-30");
        assert_eq!(body["end"]["date"], "2026-07-01");
        assert_eq!(body["attendees"][1]["email"], "bo@example.com");
        assert!(body["description"].is_null());
    }
}
