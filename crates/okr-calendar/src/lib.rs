//! OKR Calendar — invites for scheduled quarter check-in meetings.
//!
//! Scheduling is a side channel: callers fire it and move on. Without
//! a calendar credential the scheduler reports what it would have
//! created instead of calling out.

pub mod client;
pub mod config;
pub mod error;
pub mod scheduler;

pub use client::{CalendarClient, CalendarEvent, GoogleCalendarClient};
pub use config::CalendarConfig;
pub use error::CalendarError;
pub use scheduler::{CalendarScheduler, ScheduleOutcome};
