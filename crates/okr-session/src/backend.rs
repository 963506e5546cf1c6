//! Contract with the hosted identity provider.
//!
//! The provider owns identities and tokens; this crate only observes
//! them. Implementations live outside the workspace (and as fakes in
//! tests).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::SessionError;

/// Authenticated subject as reported by the auth backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// A live backend session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub identity: Identity,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Asynchronous auth-state change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(AuthSession),
    SignedOut,
    TokenRefreshed(AuthSession),
    PasswordRecovery,
}

pub trait AuthBackend: Send + Sync + 'static {
    /// The current session, if any.
    fn get_session(
        &self,
    ) -> impl Future<Output = Result<Option<AuthSession>, SessionError>> + Send;

    /// Exchange the current session for a fresh token.
    fn refresh_session(&self) -> impl Future<Output = Result<AuthSession, SessionError>> + Send;

    fn sign_out(&self) -> impl Future<Output = Result<(), SessionError>> + Send;

    /// Subscribe to auth-state notifications. Each call returns an
    /// independent receiver.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
