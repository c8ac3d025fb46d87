//! Session state machine.
//!
//! `SessionManager` is the one owner of "who is signed in". Front ends
//! create it at startup, call `check_auth()`, and then drive it with
//! `login()`, `logout()` and `record_activity()`. Navigation and user-facing
//! notices come back as `SessionEvent`s on the channel returned by `new()`.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::api::PortalBackend;
use crate::error::PortalError;
use crate::models::{LoginRequest, User};

use super::credentials::CredentialStore;
use super::inactivity::{InactivityMonitor, INACTIVITY_TIMEOUT};

/// Buffer size for the session event channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Shown when login fails without a backend message.
pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

pub const LOGIN_SUCCEEDED: &str = "Login successful";

pub const SESSION_EXPIRED: &str = "Session expired due to inactivity";

const PROFILE_LOAD_FAILED: &str = "Failed to load profile";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Startup validation has not finished yet.
    Unknown,
    Anonymous,
    Authenticated(User),
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Screens the session asks the front end to move to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/installer/dashboard",
            Route::Login => "/installer/login",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Navigate(Route),
    Notice(Notice),
}

struct Inner {
    backend: Arc<dyn PortalBackend>,
    credentials: Arc<CredentialStore>,
    state: RwLock<SessionState>,
    events: mpsc::Sender<SessionEvent>,
    inactivity: InactivityMonitor,
}

/// Handle to the session. Clone is cheap; all clones share one session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(
        backend: Arc<dyn PortalBackend>,
        credentials: Arc<CredentialStore>,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        Self::with_inactivity_timeout(backend, credentials, INACTIVITY_TIMEOUT)
    }

    pub fn with_inactivity_timeout(
        backend: Arc<dyn PortalBackend>,
        credentials: Arc<CredentialStore>,
        timeout: Duration,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let manager = Self {
            inner: Arc::new(Inner {
                backend,
                credentials,
                state: RwLock::new(SessionState::Unknown),
                events: tx,
                inactivity: InactivityMonitor::new(timeout),
            }),
        };
        (manager, rx)
    }

    pub fn backend(&self) -> &Arc<dyn PortalBackend> {
        &self.inner.backend
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.inner.credentials
    }

    // =========================================================================
    // Read-only state
    // =========================================================================

    pub async fn state(&self) -> SessionState {
        self.inner.state.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<User> {
        self.inner.state.read().await.user().cloned()
    }

    /// Check if a user is signed in and validated
    pub async fn is_authenticated(&self) -> bool {
        matches!(*self.inner.state.read().await, SessionState::Authenticated(_))
    }

    /// True until `check_auth()` has settled the startup state.
    pub async fn is_loading(&self) -> bool {
        matches!(*self.inner.state.read().await, SessionState::Unknown)
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Validate a stored token at startup.
    ///
    /// No token: `Anonymous` without touching the network. Token the backend
    /// rejects: storage is cleared and the session ends without an error notice.
    pub async fn check_auth(&self) -> SessionState {
        if !self.inner.credentials.has_access_token() {
            debug!("No stored token");
            return self.set_state(SessionState::Anonymous).await;
        }

        match self.inner.backend.fetch_profile().await {
            Ok(user) => {
                info!(user_id = user.id, "Stored session validated");
                self.set_state(SessionState::Authenticated(user)).await
            }
            Err(e) => {
                warn!(error = %e, "Stored session rejected, signing out");
                self.logout().await;
                SessionState::Anonymous
            }
        }
    }

    /// Re-fetch the profile for an active session, e.g. after a profile update.
    ///
    /// A failed fetch ends the session the same way `check_auth` does.
    pub async fn refresh_user(&self) -> Result<User, PortalError> {
        let user = match self.inner.backend.fetch_profile().await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Profile reload failed, signing out");
                self.logout().await;
                return Err(PortalError::from_api(e, PROFILE_LOAD_FAILED));
            }
        };

        let mut state = self.inner.state.write().await;
        if matches!(*state, SessionState::Authenticated(_)) {
            *state = SessionState::Authenticated(user.clone());
        }
        Ok(user)
    }

    /// Exchange credentials for a session.
    ///
    /// On failure nothing is stored and the state is left as it was.
    pub async fn login(&self, request: LoginRequest) -> Result<User, PortalError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(PortalError::validation("Email and password required"));
        }

        let response = match self.inner.backend.login(&request).await {
            Ok(response) => response,
            Err(e) => {
                error!(error = %e, email = %request.email, "Login failed");
                return Err(PortalError::from_api(e, LOGIN_FAILED));
            }
        };

        self.inner
            .credentials
            .store_tokens(&response.access_token, &response.refresh_token)?;

        let user = response.user;
        info!(user_id = user.id, "Login successful");
        self.set_state(SessionState::Authenticated(user.clone())).await;
        self.inner.inactivity.record_activity();

        self.emit(SessionEvent::Notice(Notice::success(LOGIN_SUCCEEDED))).await;
        self.emit(SessionEvent::Navigate(Route::Dashboard)).await;
        Ok(user)
    }

    /// End the session. Safe to call in any state, any number of times.
    pub async fn logout(&self) {
        if let Err(e) = self.inner.credentials.clear() {
            error!(error = %e, "Failed to clear stored credentials");
        }
        self.set_state(SessionState::Anonymous).await;
        info!("Logged out");
        self.emit(SessionEvent::Navigate(Route::Login)).await;
    }

    /// Queue a notice for the front end.
    pub async fn notify(&self, notice: Notice) {
        self.emit(SessionEvent::Notice(notice)).await;
    }

    // =========================================================================
    // Inactivity
    // =========================================================================

    /// Note user input; restarts the inactivity countdown.
    pub fn record_activity(&self) {
        self.inner.inactivity.record_activity();
    }

    pub fn inactivity_remaining(&self) -> Duration {
        self.inner.inactivity.remaining()
    }

    /// Start the inactivity countdown task. It holds only a weak reference,
    /// so it ends when the last `SessionManager` clone is dropped.
    pub fn spawn_inactivity_monitor(&self) -> JoinHandle<()> {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        self.inner.inactivity.spawn(move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(inner) => {
                        SessionManager { inner }.expire_for_inactivity().await;
                        true
                    }
                    None => false,
                }
            }
        })
    }

    /// Called when the quiet period elapses. Only acts while a token is stored.
    async fn expire_for_inactivity(&self) {
        if !self.inner.credentials.has_access_token() {
            debug!("Inactivity timeout with no stored token, ignoring");
            return;
        }
        warn!("Session expired due to inactivity");
        self.logout().await;
        self.emit(SessionEvent::Notice(Notice::error(SESSION_EXPIRED))).await;
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn set_state(&self, next: SessionState) -> SessionState {
        let mut state = self.inner.state.write().await;
        *state = next;
        state.clone()
    }

    /// Send an event, logging if the front end has gone away
    async fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.inner.events.send(event).await {
            debug!(error = %e, "Session event dropped - receiver closed");
        }
    }
}
