//! Calendar configuration.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// OAuth access token for the calendar API. `None` switches the
    /// scheduler to simulated mode.
    pub access_token: Option<String>,
    /// Calendar that receives the events (default: "primary").
    pub calendar_id: String,
    /// Base URL of the Calendar v3 API.
    pub api_base_url: String,
    /// Timeout for each HTTP request (default: 10 seconds).
    pub request_timeout: Duration,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            calendar_id: "primary".into(),
            api_base_url: "https://www.googleapis.com/calendar/v3".into(),
            request_timeout: Duration::from_secs(10),
        }
    }
}
