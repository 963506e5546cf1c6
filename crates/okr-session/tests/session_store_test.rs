//! Integration tests for the session store.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use okr_core::error::{OkrError, OkrResult};
use okr_core::models::profile::{CreateProfile, Profile, Role, UpdateProfile};
use okr_core::repository::ProfileRepository;
use okr_db::repository::SurrealProfileRepository;
use okr_session::storage::{
    ADMIN_SELECTION_RESET_KEY, LEGACY_SELECTED_COMPANY_KEY, SELECTED_COMPANY_KEY,
};
use okr_session::{
    AuthBackend, AuthEvent, AuthSession, ClientStorage, Identity, MemoryStorage, Navigation,
    SessionConfig, SessionError, SessionStore,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use tokio::sync::broadcast;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct BackendState {
    session: Mutex<Option<AuthSession>>,
    lookup_delay: Option<Duration>,
    fail_sign_out: bool,
    refreshes: AtomicU32,
    /// Hand out already-expired sessions on refresh.
    stale_refresh: AtomicBool,
    sign_outs: AtomicU32,
    events: broadcast::Sender<AuthEvent>,
}

#[derive(Clone)]
struct FakeBackend(Arc<BackendState>);

impl FakeBackend {
    fn new(session: Option<AuthSession>) -> Self {
        Self::build(session, None, false)
    }

    fn build(session: Option<AuthSession>, lookup_delay: Option<Duration>, fail_sign_out: bool) -> Self {
        let (events, _) = broadcast::channel(16);
        Self(Arc::new(BackendState {
            session: Mutex::new(session),
            lookup_delay,
            fail_sign_out,
            refreshes: AtomicU32::new(0),
            stale_refresh: AtomicBool::new(false),
            sign_outs: AtomicU32::new(0),
            events,
        }))
    }

    fn emit(&self, event: AuthEvent) {
        self.0.events.send(event).unwrap();
    }

    fn refreshes(&self) -> u32 {
        self.0.refreshes.load(Ordering::SeqCst)
    }
}

impl AuthBackend for FakeBackend {
    async fn get_session(&self) -> Result<Option<AuthSession>, SessionError> {
        if let Some(delay) = self.0.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.0.session.lock().unwrap().clone())
    }

    async fn refresh_session(&self) -> Result<AuthSession, SessionError> {
        let n = self.0.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
        let mut guard = self.0.session.lock().unwrap();
        let session = guard
            .as_mut()
            .ok_or_else(|| SessionError::Backend("no session".into()))?;
        let mut refreshed = session.clone();
        refreshed.access_token = format!("token-{}", n + 1);
        if self.0.stale_refresh.load(Ordering::SeqCst) {
            refreshed.expires_at = Utc::now() - chrono::Duration::minutes(1);
        } else {
            *session = refreshed.clone();
        }
        Ok(refreshed)
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        self.0.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.0.fail_sign_out {
            return Err(SessionError::Backend("connection refused".into()));
        }
        *self.0.session.lock().unwrap() = None;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.0.events.subscribe()
    }
}

#[derive(Clone, Copy)]
enum Failure {
    Transient,
    NotFound,
}

/// Profile lookups that fail `failures` times before succeeding.
#[derive(Clone)]
struct FlakyProfiles {
    profile: Profile,
    failure: Failure,
    failures: u32,
    calls: Arc<AtomicU32>,
}

impl FlakyProfiles {
    fn new(profile: Profile, failure: Failure, failures: u32) -> Self {
        Self {
            profile,
            failure,
            failures,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProfileRepository for FlakyProfiles {
    async fn create(&self, _input: CreateProfile) -> OkrResult<Profile> {
        unimplemented!()
    }

    async fn get_by_id(&self, id: Uuid) -> OkrResult<Profile> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(match self.failure {
                Failure::Transient => OkrError::Database("connection reset".into()),
                Failure::NotFound => OkrError::NotFound {
                    entity: "profile".into(),
                    id: id.to_string(),
                },
            });
        }
        Ok(self.profile.clone())
    }

    async fn update(&self, _id: Uuid, _input: UpdateProfile) -> OkrResult<Profile> {
        unimplemented!()
    }

    async fn list_by_ids(&self, _ids: &[Uuid]) -> OkrResult<Vec<Profile>> {
        Ok(vec![self.profile.clone()])
    }

    async fn list_by_company(&self, _company_id: Uuid) -> OkrResult<Vec<Profile>> {
        Ok(vec![self.profile.clone()])
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn session_for(id: Uuid) -> AuthSession {
    AuthSession {
        identity: Identity {
            id,
            email: "ana@example.com".into(),
        },
        access_token: "token-1".into(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

fn profile_for(id: Uuid) -> Profile {
    Profile {
        id,
        email: "ana@example.com".into(),
        full_name: "Ana".into(),
        avatar_url: None,
        active: true,
        role: Role::Manager,
        company_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

struct Storages {
    durable: Arc<dyn ClientStorage>,
    session: Arc<dyn ClientStorage>,
}

fn storages() -> Storages {
    Storages {
        durable: Arc::new(MemoryStorage::new()),
        session: Arc::new(MemoryStorage::new()),
    }
}

fn store<P: ProfileRepository + 'static>(
    backend: FakeBackend,
    profiles: P,
    config: SessionConfig,
    storages: &Storages,
) -> SessionStore<FakeBackend, P> {
    SessionStore::new(
        backend,
        profiles,
        config,
        Arc::clone(&storages.durable),
        Arc::clone(&storages.session),
    )
}

async fn wait_for<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn initialize_without_session_is_anonymous() {
    let user_id = Uuid::new_v4();
    let profiles = FlakyProfiles::new(profile_for(user_id), Failure::Transient, 0);
    let store = store(
        FakeBackend::new(None),
        profiles.clone(),
        SessionConfig::default(),
        &storages(),
    );

    let ctx = store.initialize().await;
    assert!(!ctx.is_authenticated());
    assert!(ctx.profile.is_none());
    assert!(ctx.role.is_loading());
    assert_eq!(profiles.calls(), 0);
    assert_eq!(store.access_token().await, None);
}

#[tokio::test]
async fn initialize_loads_profile_from_database() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    okr_db::run_migrations(&db).await.unwrap();
    let profiles = SurrealProfileRepository::new(db);

    let user_id = Uuid::new_v4();
    profiles
        .create(CreateProfile {
            id: user_id,
            email: "ana@example.com".into(),
            full_name: "Ana Lima".into(),
            avatar_url: None,
            role: Role::Admin,
            company_id: None,
        })
        .await
        .unwrap();

    let store = store(
        FakeBackend::new(Some(session_for(user_id))),
        profiles,
        SessionConfig::default(),
        &storages(),
    );

    let ctx = store.initialize().await;
    assert_eq!(ctx.user_id(), Some(user_id));
    let profile = ctx.profile.expect("profile should load");
    assert_eq!(profile.full_name, "Ana Lima");
    assert_eq!(profile.role, Role::Admin);
    assert_eq!(store.access_token().await.as_deref(), Some("token-1"));
}

#[tokio::test(start_paused = true)]
async fn slow_backend_times_out_to_no_session() {
    let user_id = Uuid::new_v4();
    let backend = FakeBackend::build(
        Some(session_for(user_id)),
        Some(Duration::from_secs(60)),
        false,
    );
    let profiles = FlakyProfiles::new(profile_for(user_id), Failure::Transient, 0);
    let store = store(backend, profiles, SessionConfig::default(), &storages());

    let started = tokio::time::Instant::now();
    let ctx = store.initialize().await;
    let elapsed = started.elapsed();

    assert!(!ctx.is_authenticated());
    assert!(elapsed >= Duration::from_secs(5));
    assert!(elapsed < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn transient_profile_errors_are_retried() {
    let user_id = Uuid::new_v4();
    let profiles = FlakyProfiles::new(profile_for(user_id), Failure::Transient, 2);
    let store = store(
        FakeBackend::new(Some(session_for(user_id))),
        profiles.clone(),
        SessionConfig::default(),
        &storages(),
    );

    let started = tokio::time::Instant::now();
    let ctx = store.initialize().await;

    assert!(ctx.profile.is_some());
    assert_eq!(profiles.calls(), 3);
    // 500 ms after the first failure, 1 s after the second.
    assert!(started.elapsed() >= Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_yield_no_profile() {
    let user_id = Uuid::new_v4();
    let profiles = FlakyProfiles::new(profile_for(user_id), Failure::Transient, u32::MAX);
    let store = store(
        FakeBackend::new(Some(session_for(user_id))),
        profiles.clone(),
        SessionConfig::default(),
        &storages(),
    );

    let ctx = store.initialize().await;

    assert!(ctx.is_authenticated());
    assert!(ctx.profile.is_none());
    assert_eq!(profiles.calls(), 4);
}

#[tokio::test]
async fn missing_profile_is_not_retried() {
    let user_id = Uuid::new_v4();
    let profiles = FlakyProfiles::new(profile_for(user_id), Failure::NotFound, u32::MAX);
    let store = store(
        FakeBackend::new(Some(session_for(user_id))),
        profiles.clone(),
        SessionConfig::default(),
        &storages(),
    );

    let ctx = store.initialize().await;

    assert!(ctx.is_authenticated());
    assert!(ctx.profile.is_none());
    assert_eq!(profiles.calls(), 1);
}

// ---------------------------------------------------------------------------
// Sign-out
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sign_out_clears_local_state_even_when_backend_fails() {
    let user_id = Uuid::new_v4();
    let backend = FakeBackend::build(Some(session_for(user_id)), None, true);
    let storages = storages();
    storages
        .durable
        .set(SELECTED_COMPANY_KEY, r#"{"id":"00000000-0000-0000-0000-000000000001","name":"Acme"}"#)
        .unwrap();
    storages
        .durable
        .set(LEGACY_SELECTED_COMPANY_KEY, "00000000-0000-0000-0000-000000000001")
        .unwrap();
    storages.session.set(ADMIN_SELECTION_RESET_KEY, "1").unwrap();

    let store = store(
        backend.clone(),
        FlakyProfiles::new(profile_for(user_id), Failure::Transient, 0),
        SessionConfig::default(),
        &storages,
    );
    store.initialize().await;
    assert!(store.profile().await.is_some());

    let mut navigation = store.navigation();
    store.sign_out().await;

    assert_eq!(backend.0.sign_outs.load(Ordering::SeqCst), 1);
    assert_eq!(store.identity().await, None);
    assert_eq!(store.profile().await.map(|p| p.id), None);
    assert_eq!(store.access_token().await, None);
    assert_eq!(storages.durable.get(SELECTED_COMPANY_KEY), None);
    assert_eq!(storages.durable.get(LEGACY_SELECTED_COMPANY_KEY), None);
    assert_eq!(storages.session.get(ADMIN_SELECTION_RESET_KEY), None);
    assert_eq!(navigation.recv().await.unwrap(), Navigation::Login);
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn auth_events_update_the_store() {
    let user_id = Uuid::new_v4();
    let backend = FakeBackend::new(None);
    let store = store(
        backend.clone(),
        FlakyProfiles::new(profile_for(user_id), Failure::Transient, 0),
        SessionConfig::default(),
        &storages(),
    );
    store.initialize().await;
    store.start().await;
    let mut navigation = store.navigation();

    backend.emit(AuthEvent::SignedIn(session_for(user_id)));
    wait_for(|| async { store.profile().await.is_some() }).await;
    assert_eq!(store.identity().await.map(|i| i.id), Some(user_id));

    let mut refreshed = session_for(user_id);
    refreshed.access_token = "token-rotated".into();
    backend.emit(AuthEvent::TokenRefreshed(refreshed));
    wait_for(|| async { store.access_token().await.as_deref() == Some("token-rotated") }).await;
    assert!(store.profile().await.is_some());

    backend.emit(AuthEvent::PasswordRecovery);
    let target = tokio::time::timeout(Duration::from_secs(1), navigation.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(target, Navigation::PasswordReset);

    backend.emit(AuthEvent::SignedOut);
    wait_for(|| async { store.identity().await.is_none() }).await;
    assert!(store.profile().await.is_none());

    store.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn token_is_refreshed_periodically() {
    let user_id = Uuid::new_v4();
    let backend = FakeBackend::new(Some(session_for(user_id)));
    let store = store(
        backend.clone(),
        FlakyProfiles::new(profile_for(user_id), Failure::Transient, 0),
        SessionConfig::default(),
        &storages(),
    );
    store.initialize().await;
    store.start().await;

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(backend.refreshes(), 0, "first tick must be skipped");

    tokio::time::sleep(Duration::from_secs(30 * 60)).await;
    assert_eq!(backend.refreshes(), 1);
    assert_eq!(store.access_token().await.as_deref(), Some("token-2"));

    tokio::time::sleep(Duration::from_secs(30 * 60)).await;
    assert_eq!(backend.refreshes(), 2);

    store.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn expired_refresh_keeps_current_token() {
    let user_id = Uuid::new_v4();
    let backend = FakeBackend::new(Some(session_for(user_id)));
    backend.0.stale_refresh.store(true, Ordering::SeqCst);
    let store = store(
        backend.clone(),
        FlakyProfiles::new(profile_for(user_id), Failure::Transient, 0),
        SessionConfig::default(),
        &storages(),
    );
    store.initialize().await;
    store.start().await;

    tokio::time::sleep(Duration::from_secs(31 * 60)).await;
    assert_eq!(backend.refreshes(), 1);
    assert_eq!(store.access_token().await.as_deref(), Some("token-1"));

    store.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn zero_refresh_interval_is_raised_to_the_floor() {
    let user_id = Uuid::new_v4();
    let backend = FakeBackend::new(Some(session_for(user_id)));
    let config = SessionConfig {
        refresh_interval: Duration::ZERO,
        ..SessionConfig::default()
    };
    let store = store(
        backend.clone(),
        FlakyProfiles::new(profile_for(user_id), Failure::Transient, 0),
        config,
        &storages(),
    );
    store.initialize().await;
    store.start().await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(backend.refreshes(), 0);

    tokio::time::sleep(Duration::from_millis(2_600)).await;
    let refreshes = backend.refreshes();
    assert!((2..=3).contains(&refreshes), "refreshed {refreshes} times");

    store.shutdown().await;
}

#[tokio::test]
async fn shutdown_stops_event_handling() {
    let backend = FakeBackend::new(None);
    let user_id = Uuid::new_v4();
    let store = store(
        backend.clone(),
        FlakyProfiles::new(profile_for(user_id), Failure::Transient, 0),
        SessionConfig::default(),
        &storages(),
    );
    store.start().await;
    store.shutdown().await;

    let mut navigation = store.navigation();
    // The listener is gone, so nobody is subscribed to the backend.
    assert!(backend.0.events.send(AuthEvent::PasswordRecovery).is_err());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(navigation.try_recv().is_err());

    // Starting again after shutdown does nothing.
    store.start().await;
    assert_eq!(backend.0.events.receiver_count(), 0);
}
