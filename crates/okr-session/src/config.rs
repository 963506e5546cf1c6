//! Session configuration.

use std::time::Duration;

/// Configuration for the session store.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Upper bound on waiting for the auth backend during
    /// initialization (default: 5 s).
    pub session_timeout: Duration,
    /// Retries for a transiently failing profile fetch (default: 3).
    pub profile_max_retries: u32,
    /// Base backoff between profile retries, multiplied by the attempt
    /// number (default: 500 ms).
    pub profile_retry_backoff: Duration,
    /// Period of the background token refresh (default: 30 min,
    /// floor: 1 s).
    pub refresh_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_timeout: Duration::from_secs(5),
            profile_max_retries: 3,
            profile_retry_backoff: Duration::from_millis(500),
            refresh_interval: Duration::from_secs(30 * 60),
        }
    }
}
