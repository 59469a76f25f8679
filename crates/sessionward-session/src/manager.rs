//! The session manager: the state machine behind the public facade.
//!
//! # Concurrency
//!
//! The manager is shared as `Arc<SessionManager>` between the caller and
//! the background renewal task, which only holds a `Weak` so dropping
//! the last handle shuts everything down.
//!
//! Three locks, each with one job:
//!
//! - `gate` (async) serializes the sequences that talk to the backend
//!   and then rewrite credentials: `initialize`, `login` (also the sign-in
//!   half of `sign_up`) and `refresh`.
//!   A login can therefore never interleave with a scheduled renewal.
//! - `epoch` (sync) is bumped by every logout. Each write that follows a
//!   network call re-checks it under the same lock and is dropped if a
//!   logout happened in between. `logout` never touches `gate`, so it
//!   takes effect immediately even while a request is in flight.
//! - `phase` (sync) tracks [`SessionPhase`].
//!
//! No sync lock is ever held across an `.await`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use sessionward_protocol::{RenewalGrant, UserProfile};
use sessionward_refresh::{RefreshScheduler, RenewalTask};
use sessionward_store::{Credentials, SessionStore, Storage, now_millis};
use sessionward_transport::SessionTransport;
use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, warn};

use crate::{AuthState, RefreshOutcome, SessionConfig, SessionError, SessionPhase};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Acquires, persists, renews and invalidates one authenticated session.
///
/// ## Lifecycle
///
/// ```text
/// initialize() ──→ [stored credentials?] ──yes──→ renew now or arm timer
///      │                                                │
///      ▼                                                ▼
/// fetch_profile() ──fail──→ refresh() ──→ fetch_profile() once more
///
/// login() ──→ authenticate ──→ persist + arm timer ──→ fetch_profile()
/// timer   ──→ refresh() ──ok──→ persist + re-arm
///                      └─fail─→ wipe session (forced logout)
/// logout() ──→ wipe session now, terminate() in the background
/// ```
pub struct SessionManager<T: SessionTransport, S: Storage> {
    /// Handle to ourselves, given to the renewal timer.
    me: Weak<Self>,
    transport: Arc<T>,
    store: SessionStore<S>,
    scheduler: RefreshScheduler,

    /// Set once the first `initialize` has run to completion.
    initialized: OnceCell<()>,
    gate: tokio::sync::Mutex<()>,
    epoch: Mutex<u64>,
    phase: Mutex<SessionPhase>,
    state: watch::Sender<AuthState>,
}

impl<T: SessionTransport, S: Storage> SessionManager<T, S> {
    /// Creates a manager. Nothing is read or sent until [`initialize`](Self::initialize).
    pub fn new(transport: T, storage: S, config: SessionConfig) -> Arc<Self> {
        let (state, _) = watch::channel(AuthState::initial());
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            transport: Arc::new(transport),
            store: SessionStore::new(storage),
            scheduler: RefreshScheduler::new(config.refresh),
            initialized: OnceCell::new(),
            gate: tokio::sync::Mutex::new(()),
            epoch: Mutex::new(0),
            phase: Mutex::new(SessionPhase::Uninitialized),
            state,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// A snapshot of the current state.
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    pub fn phase(&self) -> SessionPhase {
        *lock(&self.phase)
    }

    /// The renewal timer, for inspection.
    pub fn scheduler(&self) -> &RefreshScheduler {
        &self.scheduler
    }

    /// The persisted credentials.
    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Restores the session left by a previous run, if any.
    ///
    /// Runs at most once per manager. Concurrent callers all wait for
    /// the same run; later calls return immediately. Never fails: every
    /// problem ends in the unauthenticated state with no error set.
    pub async fn initialize(&self) {
        self.initialized
            .get_or_init(|| self.run_initialize())
            .await;
    }

    /// Signs in with an identifier and secret.
    ///
    /// # Errors
    /// - [`SessionError::InvalidCredentials`] / [`SessionError::NetworkFailure`]
    ///   when authentication fails; the message is also put in `error`.
    /// - [`SessionError::Superseded`] when `logout` ran while the request
    ///   was in flight.
    /// - [`SessionError::ProfileUnavailable`] when the session was
    ///   established but the profile could not be loaded. The credentials
    ///   are kept; `user` stays `None` and `error` is not set.
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<(), SessionError> {
        let _gate = self.gate.lock().await;
        let epoch = self.begin_attempt();
        self.login_locked(identifier, secret, epoch).await
    }

    /// Creates an account, then signs in with the same credentials.
    ///
    /// A `logout` at any point before the sign-in completes wins: the
    /// result is discarded and no session is left behind.
    ///
    /// # Errors
    /// [`SessionError::RegistrationConflict`] / [`SessionError::NetworkFailure`]
    /// when registration fails, [`SessionError::Superseded`] when `logout`
    /// ran meanwhile, otherwise whatever [`login`](Self::login) returns.
    pub async fn sign_up(
        &self,
        name: &str,
        identifier: &str,
        secret: &str,
    ) -> Result<(), SessionError> {
        let epoch = self.begin_attempt();

        if let Err(e) = self.transport.register(name, identifier, secret).await {
            return Err(self.fail_attempt(SessionError::from_register(e)));
        }
        debug!("account registered, signing in");

        let _gate = self.gate.lock().await;
        if self.commit(epoch, || ()).is_none() {
            return Err(self.supersede());
        }
        self.login_locked(identifier, secret, epoch).await
    }

    /// Ends the session locally, right now.
    ///
    /// Clears the persisted credentials, disarms the renewal timer and
    /// drops the user. The backend is told with `terminate()` in a
    /// background task whose outcome is ignored. Any request still in
    /// flight will find its result discarded.
    pub fn logout(&self) {
        self.end_session();
        info!("logged out");

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("no runtime available, skipping remote terminate");
            return;
        };
        let transport = Arc::clone(&self.transport);
        runtime.spawn(async move {
            if let Err(e) = transport.terminate().await {
                debug!(error = %e, "remote terminate failed (ignored)");
            }
        });
    }

    /// Exchanges the persisted renewal token for fresh credentials.
    ///
    /// Called by the timer; may also be called directly. On failure the
    /// session is wiped, which is the only way a session ends without
    /// `logout`.
    pub async fn refresh(&self) -> RefreshOutcome {
        let _gate = self.gate.lock().await;
        self.renew().await
    }

    // -----------------------------------------------------------------------
    // Internals (callers hold `gate` where noted)
    // -----------------------------------------------------------------------

    /// Authenticates and installs the session, unless a logout bumps
    /// `epoch` first. Caller holds `gate`.
    async fn login_locked(
        &self,
        identifier: &str,
        secret: &str,
        epoch: u64,
    ) -> Result<(), SessionError> {
        let grant = match self.transport.authenticate(identifier, secret).await {
            Ok(grant) => grant,
            Err(e) => return Err(self.fail_attempt(SessionError::from_authenticate(e))),
        };

        if self.commit(epoch, || self.install(grant)).is_none() {
            return Err(self.supersede());
        }

        match self.transport.fetch_profile().await {
            Ok(user) => {
                let user_id = user.id;
                let published = self.commit(epoch, || {
                    self.publish(|s| {
                        s.user = Some(user);
                        s.loading = false;
                    })
                });
                if published.is_none() {
                    return Err(self.supersede());
                }
                info!(user_id, "session established");
                Ok(())
            }
            Err(e) => {
                let err = SessionError::from_profile(e);
                warn!(error = %err, "logged in but profile could not be loaded");
                self.publish(|s| {
                    s.user = None;
                    s.loading = false;
                });
                Err(err)
            }
        }
    }

    async fn run_initialize(&self) {
        let _gate = self.gate.lock().await;
        self.set_phase(SessionPhase::Initializing);
        let epoch = self.begin_attempt();

        let mut expired = false;
        match self.store.load() {
            Some(credentials) => {
                let remaining = credentials.remaining_secs(now_millis());
                if self.scheduler.policy().renew_immediately(remaining) {
                    debug!(remaining_secs = remaining, "stored credentials near expiry, renewing now");
                    expired = self.renew().await == RefreshOutcome::Expired;
                } else {
                    self.commit(epoch, || self.arm(remaining));
                }
            }
            None => debug!("no stored session"),
        }

        let user = if expired {
            None
        } else {
            self.load_profile().await
        };

        let committed = self.commit(epoch, || {
            self.publish(|s| {
                s.user = user;
                s.loading = false;
            })
        });
        if committed.is_none() {
            self.publish(|s| s.loading = false);
        }

        let user_id = self.state.borrow().user.as_ref().map(|u| u.id);
        match user_id {
            Some(user_id) => {
                self.set_phase(SessionPhase::Authenticated);
                info!(user_id, "session restored");
            }
            None => {
                self.set_phase(SessionPhase::Unauthenticated);
                debug!("initialized without a session");
            }
        }
    }

    /// Fetches the profile, renewing and retrying once on failure.
    /// Caller holds `gate`.
    async fn load_profile(&self) -> Option<UserProfile> {
        match self.transport.fetch_profile().await {
            Ok(user) => return Some(user),
            Err(e) => debug!(error = %e, "profile fetch failed, trying a renewal"),
        }

        if self.renew().await == RefreshOutcome::Expired {
            return None;
        }

        match self.transport.fetch_profile().await {
            Ok(user) => Some(user),
            Err(e) => {
                debug!(error = %e, "profile still unavailable after renewal");
                None
            }
        }
    }

    /// Caller holds `gate`.
    async fn renew(&self) -> RefreshOutcome {
        let epoch = self.current_epoch();
        let Some(credentials) = self.store.load() else {
            debug!("refresh skipped, no stored session");
            return RefreshOutcome::NoSession;
        };

        match self.transport.renew(&credentials.renewal_token).await {
            Ok(grant) => self
                .commit(epoch, || {
                    // The store is authoritative: another process sharing
                    // it may have logged out meanwhile.
                    if self.store.has_session() {
                        self.install(grant);
                        RefreshOutcome::Renewed
                    } else {
                        RefreshOutcome::NoSession
                    }
                })
                .unwrap_or(RefreshOutcome::NoSession),
            Err(e) => {
                let err = SessionError::from_renew(e);
                warn!(error = %err, "renewal failed, ending session");
                self.clear_session();
                info!("session expired");
                RefreshOutcome::Expired
            }
        }
    }

    /// Persists a grant and arms the timer for it. Caller holds `epoch`.
    fn install(&self, grant: RenewalGrant) {
        let lifetime = grant.expires_in_seconds;
        self.store
            .save(&Credentials::issued(grant.renewal_token, lifetime, now_millis()));
        self.arm(i64::try_from(lifetime).unwrap_or(i64::MAX));
    }

    fn arm(&self, remaining_secs: i64) {
        self.scheduler
            .schedule_renewal(remaining_secs, Self::scheduled_refresh(self.me.clone()));
    }

    fn scheduled_refresh(me: Weak<Self>) -> RenewalTask {
        Box::pin(async move {
            if let Some(manager) = me.upgrade() {
                manager.refresh().await;
            }
        })
    }

    /// `logout`: wipes the session and invalidates every result still
    /// in flight.
    fn end_session(&self) {
        let mut epoch = lock(&self.epoch);
        *epoch += 1;
        self.clear_session();
    }

    /// Wipes the session without bumping `epoch`, so a sign-up still
    /// registering is not cancelled by an expiry. Used by a failed renewal.
    fn clear_session(&self) {
        self.store.clear();
        self.scheduler.cancel();
        self.publish(|s| s.user = None);
    }

    fn current_epoch(&self) -> u64 {
        *lock(&self.epoch)
    }

    /// Runs `f` under the epoch lock if no logout happened since `epoch`
    /// was read.
    fn commit<R>(&self, epoch: u64, f: impl FnOnce() -> R) -> Option<R> {
        let current = lock(&self.epoch);
        (*current == epoch).then(f)
    }

    fn begin_attempt(&self) -> u64 {
        self.publish(|s| {
            s.loading = true;
            s.error = None;
        });
        self.current_epoch()
    }

    fn fail_attempt(&self, err: SessionError) -> SessionError {
        debug!(error = %err, "attempt failed");
        let message = err.to_string();
        self.publish(|s| {
            s.loading = false;
            s.error = Some(message);
        });
        err
    }

    fn supersede(&self) -> SessionError {
        debug!("late result discarded after logout");
        self.publish(|s| s.loading = false);
        SessionError::Superseded
    }

    /// Applies `f` to the state, notifies subscribers and keeps the
    /// phase in step with whether a user is present.
    fn publish(&self, f: impl FnOnce(&mut AuthState)) {
        self.state.send_modify(f);
        let authenticated = self.state.borrow().user.is_some();
        let mut phase = lock(&self.phase);
        // `initialize` settles the phase itself when it finishes.
        if *phase != SessionPhase::Initializing {
            *phase = if authenticated {
                SessionPhase::Authenticated
            } else {
                SessionPhase::Unauthenticated
            };
        }
    }

    fn set_phase(&self, phase: SessionPhase) {
        *lock(&self.phase) = phase;
    }
}
