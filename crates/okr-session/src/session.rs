//! Session store: the authenticated identity, its profile and the auth
//! token, kept current by two supervised background tasks.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use okr_core::error::OkrError;
use okr_core::models::profile::Profile;
use okr_core::repository::ProfileRepository;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{AuthBackend, AuthEvent, AuthSession, Identity};
use crate::config::SessionConfig;
use crate::context::SessionContext;
use crate::error::SessionError;
use crate::storage::{ClientStorage, clear_selection};

/// Floor for the refresh period; shorter configured values are raised.
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

/// Navigation side effects requested by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Login,
    PasswordReset,
}

#[derive(Debug, Default)]
struct SessionState {
    session: Option<AuthSession>,
    profile: Option<Profile>,
}

struct Inner<B: AuthBackend, P: ProfileRepository> {
    backend: B,
    profiles: P,
    config: SessionConfig,
    durable: Arc<dyn ClientStorage>,
    session_storage: Arc<dyn ClientStorage>,
    state: RwLock<SessionState>,
    navigation: broadcast::Sender<Navigation>,
    shutdown: watch::Sender<bool>,
}

/// Holds the current identity, profile and token.
///
/// Generic over the auth backend and the profile repository so the
/// store has no dependency on a concrete provider or database.
pub struct SessionStore<B: AuthBackend, P: ProfileRepository + 'static> {
    inner: Arc<Inner<B, P>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<B: AuthBackend, P: ProfileRepository + 'static> SessionStore<B, P> {
    pub fn new(
        backend: B,
        profiles: P,
        config: SessionConfig,
        durable: Arc<dyn ClientStorage>,
        session_storage: Arc<dyn ClientStorage>,
    ) -> Self {
        let (navigation, _) = broadcast::channel(16);
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                backend,
                profiles,
                config,
                durable,
                session_storage,
                state: RwLock::new(SessionState::default()),
                navigation,
                shutdown,
            }),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Resolve the current session and its profile.
    ///
    /// Never fails: a slow or failing backend yields an anonymous
    /// context, and an unreadable profile yields a context without one.
    pub async fn initialize(&self) -> SessionContext {
        let inner = &self.inner;
        let wait = inner.config.session_timeout;

        let session = match tokio::time::timeout(wait, inner.backend.get_session()).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                warn!(error = %e, "Session lookup failed, continuing without a session");
                None
            }
            Err(_) => {
                let err = SessionError::Timeout(wait);
                warn!(error = %err, "Session lookup timed out, continuing without a session");
                None
            }
        };

        let profile = match &session {
            Some(s) => inner.fetch_profile(s.identity.id).await,
            None => None,
        };

        if inner.is_live() {
            let mut state = inner.state.write().await;
            state.session = session;
            state.profile = profile;
        }

        let ctx = self.context().await;
        info!(
            authenticated = ctx.is_authenticated(),
            has_profile = ctx.profile.is_some(),
            "Session initialized"
        );
        ctx
    }

    /// Spawn the auth-event listener and the token refresher.
    /// Calling it again while they run is a no-op.
    pub async fn start(&self) {
        let mut tasks = self.tasks.lock().await;
        if !tasks.is_empty() || !self.inner.is_live() {
            return;
        }

        // Subscribe before spawning so no event between here and the
        // first poll is lost.
        let events = self.inner.backend.subscribe();
        tasks.push(tokio::spawn(Inner::listen(Arc::clone(&self.inner), events)));
        tasks.push(tokio::spawn(Inner::refresh_periodically(Arc::clone(
            &self.inner,
        ))));
        debug!("Session background tasks started");
    }

    /// Stop the background tasks and wait for them to finish. Results
    /// of fetches still in flight are discarded.
    pub async fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);

        let handles: Vec<_> = self.tasks.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Session task ended abnormally");
            }
        }
        debug!("Session store shut down");
    }

    /// Re-fetch the profile for the current identity.
    pub async fn refresh_profile(&self) -> Option<Profile> {
        let user_id = self.inner.user_id().await?;
        let profile = self.inner.fetch_profile(user_id).await;
        self.inner.apply_profile(user_id, profile.clone()).await;
        profile
    }

    /// Sign out.
    ///
    /// The backend call is best-effort. Local state, both selection
    /// keys and the session marker are cleared whatever it returns,
    /// then [`Navigation::Login`] is emitted.
    pub async fn sign_out(&self) {
        let inner = &self.inner;

        if let Err(e) = inner.backend.sign_out().await {
            warn!(error = %e, "Backend sign-out failed, clearing local state anyway");
        }

        inner.clear_local().await;

        clear_selection(inner.durable.as_ref(), inner.session_storage.as_ref());

        inner.navigate(Navigation::Login);
        info!("Signed out");
    }

    /// Subscribe to navigation requests.
    pub fn navigation(&self) -> broadcast::Receiver<Navigation> {
        self.inner.navigation.subscribe()
    }

    /// Snapshot of the current identity and profile. The role is left
    /// as [`RoleState::Loading`](crate::RoleState::Loading).
    pub async fn context(&self) -> SessionContext {
        let state = self.inner.state.read().await;
        SessionContext::new(
            state.session.as_ref().map(|s| s.identity.clone()),
            state.profile.clone(),
        )
    }

    pub async fn identity(&self) -> Option<Identity> {
        let state = self.inner.state.read().await;
        state.session.as_ref().map(|s| s.identity.clone())
    }

    pub async fn access_token(&self) -> Option<String> {
        let state = self.inner.state.read().await;
        state.session.as_ref().map(|s| s.access_token.clone())
    }

    pub async fn profile(&self) -> Option<Profile> {
        self.inner.state.read().await.profile.clone()
    }
}

impl<B: AuthBackend, P: ProfileRepository + 'static> Inner<B, P> {
    fn is_live(&self) -> bool {
        !*self.shutdown.borrow()
    }

    fn navigate(&self, target: Navigation) {
        // No subscribers is fine.
        let _ = self.navigation.send(target);
    }

    async fn user_id(&self) -> Option<Uuid> {
        let state = self.state.read().await;
        state.session.as_ref().map(|s| s.identity.id)
    }

    async fn clear_local(&self) {
        let mut state = self.state.write().await;
        state.session = None;
        state.profile = None;
    }

    /// Fetch a profile, retrying transient failures with linear
    /// backoff. `NotFound` and exhausted retries yield `None`.
    async fn fetch_profile(&self, user_id: Uuid) -> Option<Profile> {
        let max_retries = self.config.profile_max_retries;
        let mut attempt: u32 = 0;

        loop {
            match self.profiles.get_by_id(user_id).await {
                Ok(profile) => return Some(profile),
                Err(OkrError::NotFound { .. }) => {
                    info!(user_id = %user_id, "No profile for identity");
                    return None;
                }
                Err(e) if e.is_transient() && attempt < max_retries => {
                    attempt += 1;
                    let delay = self.config.profile_retry_backoff * attempt;
                    warn!(
                        user_id = %user_id,
                        attempt,
                        max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Profile fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(user_id = %user_id, attempts = attempt + 1, error = %e, "Giving up on profile fetch");
                    return None;
                }
            }
        }
    }

    /// Store a fetched profile unless the store was shut down or the
    /// identity changed while the fetch was suspended.
    async fn apply_profile(&self, user_id: Uuid, profile: Option<Profile>) {
        if !self.is_live() {
            debug!(user_id = %user_id, "Discarding profile fetched after shutdown");
            return;
        }
        let mut state = self.state.write().await;
        if state.session.as_ref().map(|s| s.identity.id) == Some(user_id) {
            state.profile = profile;
        } else {
            debug!(user_id = %user_id, "Discarding profile for a stale identity");
        }
    }

    async fn handle_event(&self, event: AuthEvent) {
        match event {
            AuthEvent::SignedIn(session) => {
                let user_id = session.identity.id;
                info!(user_id = %user_id, "Signed in");
                {
                    let mut state = self.state.write().await;
                    let same_identity =
                        state.session.as_ref().map(|s| s.identity.id) == Some(user_id);
                    if !same_identity {
                        state.profile = None;
                    }
                    state.session = Some(session);
                }
                let profile = self.fetch_profile(user_id).await;
                self.apply_profile(user_id, profile).await;
            }
            AuthEvent::SignedOut => {
                info!("Signed out by backend");
                self.clear_local().await;
            }
            AuthEvent::TokenRefreshed(session) => {
                debug!(user_id = %session.identity.id, "Token refreshed");
                let mut state = self.state.write().await;
                if state.session.as_ref().map(|s| s.identity.id) != Some(session.identity.id) {
                    state.profile = None;
                }
                state.session = Some(session);
            }
            AuthEvent::PasswordRecovery => {
                info!("Password recovery requested");
                self.navigate(Navigation::PasswordReset);
            }
        }
    }

    async fn refresh_token(&self) {
        if self.user_id().await.is_none() {
            return;
        }
        match self.backend.refresh_session().await {
            Ok(session) if session.is_expired(Utc::now()) => {
                warn!(
                    expires_at = %session.expires_at,
                    "Backend refreshed to an expired session, keeping the current token"
                );
            }
            Ok(session) => {
                if self.is_live() {
                    self.state.write().await.session = Some(session);
                    debug!("Access token refreshed");
                }
            }
            Err(e) => warn!(error = %e, "Token refresh failed"),
        }
    }

    async fn listen(self: Arc<Self>, mut events: broadcast::Receiver<AuthEvent>) {
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            return;
        }

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                event = events.recv() => match event {
                    Ok(event) => self.handle_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth event listener lagged");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Auth event stream closed");
                        break;
                    }
                },
            }
        }
    }

    async fn refresh_periodically(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();
        if *shutdown.borrow() {
            return;
        }

        let period = self.config.refresh_interval.max(MIN_REFRESH_INTERVAL);
        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately; the session was just
        // resolved, so skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = ticker.tick() => self.refresh_token().await,
            }
        }
    }
}
