//! Session lifecycle manager.
//!
//! `SessionManager` owns the single in-memory session slot and keeps it in
//! step with the persistent store and the remote auth API. It is built once
//! at start-up and handed to every consumer; clones share the same state.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::api::AuthApi;
use crate::storage::{KeyValueStore, SESSION_KEY, TOKEN_KEY};

use super::credentials::{check_sign_in, check_sign_up};
use super::{AuthError, Session, SessionPatch, SignInCredentials, SignUpCredentials};

// ============================================================================
// State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum RestoreStatus {
    #[default]
    Pending,
    Running,
    Done,
}

/// Snapshot of what the screens render from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub session: Option<Session>,
    /// True during the start-up restore and any in-flight sign-in, sign-up or sign-out.
    pub loading: bool,
    restore: RestoreStatus,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
            restore: RestoreStatus::Pending,
        }
    }
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_guest(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_guest)
    }

    pub fn phase(&self) -> SessionPhase {
        match self.restore {
            RestoreStatus::Pending => SessionPhase::Uninitialized,
            RestoreStatus::Running => SessionPhase::Restoring,
            RestoreStatus::Done if self.loading => SessionPhase::Transitioning,
            RestoreStatus::Done if self.session.is_some() => SessionPhase::Authenticated,
            RestoreStatus::Done => SessionPhase::SignedOut,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Restoring,
    SignedOut,
    Authenticated,
    Transitioning,
}

/// A completed sign-in or sign-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedIn {
    pub session: Session,
    pub token: String,
}

/// Uniform `{success, error?, user?, token?}` result for front-ends that
/// render errors inline instead of matching on `Result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Session>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl From<Result<SignedIn, AuthError>> for AuthResponse {
    fn from(result: Result<SignedIn, AuthError>) -> Self {
        match result {
            Ok(signed_in) => Self {
                success: true,
                error: None,
                user: Some(signed_in.session),
                token: Some(signed_in.token),
            },
            Err(e) => Self {
                success: false,
                error: Some(e.user_message()),
                user: None,
                token: None,
            },
        }
    }
}

/// Clears `loading` when dropped, so every exit path (including a dropped
/// future) ends at rest.
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionState>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<SessionState>) -> Self {
        state.send_modify(|s| s.loading = true);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.loading = false);
    }
}

// ============================================================================
// Manager
// ============================================================================

struct Inner {
    api: AuthApi,
    store: Arc<dyn KeyValueStore>,
    state: watch::Sender<SessionState>,
}

#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    pub fn new(api: AuthApi, store: Arc<dyn KeyValueStore>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(Inner { api, store, state }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Receive a notification every time the session or loading flag changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.inner.state.borrow().session.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    pub fn is_guest(&self) -> bool {
        self.inner.state.borrow().is_guest()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.state.borrow().phase()
    }

    fn store(&self) -> &dyn KeyValueStore {
        self.inner.store.as_ref()
    }

    fn set_session(&self, session: Option<Session>) {
        self.inner.state.send_modify(|s| s.session = session);
    }

    // ------------------------------------------------------------------------
    // Restore
    // ------------------------------------------------------------------------

    /// Rebuild the session from storage at start-up. Never fails and never
    /// touches the network; a corrupted record wipes both keys.
    pub async fn restore(&self) -> Option<Session> {
        self.inner.state.send_modify(|s| {
            s.restore = RestoreStatus::Running;
            s.loading = true;
        });

        let restored = match self.read_persisted() {
            Ok(Some(session)) => {
                info!(user_id = %session.id, "Session restored");
                Some(session)
            }
            Ok(None) => {
                debug!("No stored session");
                None
            }
            Err(e) => {
                warn!(error = %e, "Discarding stored session");
                self.clear_persisted();
                None
            }
        };

        self.inner.state.send_modify(|s| {
            s.session = restored.clone();
            s.restore = RestoreStatus::Done;
            s.loading = false;
        });
        restored
    }

    /// Both keys must be present; a lone record or lone token restores nothing.
    fn read_persisted(&self) -> Result<Option<Session>, AuthError> {
        let token = self
            .store()
            .get(TOKEN_KEY)
            .map_err(|e| AuthError::CorruptedData(format!("{:#}", e)))?;
        let record = self
            .store()
            .get(SESSION_KEY)
            .map_err(|e| AuthError::CorruptedData(format!("{:#}", e)))?;

        match (token, record) {
            (Some(token), Some(record)) if !token.is_empty() && !record.is_empty() => {
                let session = serde_json::from_str::<Session>(&record)
                    .map_err(|e| AuthError::CorruptedData(e.to_string()))?;
                // Guests never own a token, so this pair is stale
                if session.is_guest() {
                    return Err(AuthError::CorruptedData(
                        "guest record stored next to a token".to_string(),
                    ));
                }
                Ok(Some(session))
            }
            _ => Ok(None),
        }
    }

    // ------------------------------------------------------------------------
    // Sign in / sign up
    // ------------------------------------------------------------------------

    /// Authenticate with existing credentials. Callers normalize the email
    /// first (`SignInCredentials::normalized`). A failure leaves any current
    /// session untouched.
    pub async fn sign_in(&self, credentials: &SignInCredentials) -> Result<SignedIn, AuthError> {
        check_sign_in(credentials)?;

        let _loading = LoadingGuard::begin(&self.inner.state);
        let result = self.inner.api.login(credentials).await;
        self.complete_auth(result.map_err(AuthError::from), "Sign in")
    }

    /// Register a new account. Email shape, password length and name are
    /// checked before any network call.
    pub async fn sign_up(&self, credentials: &SignUpCredentials) -> Result<SignedIn, AuthError> {
        check_sign_up(credentials)?;

        let _loading = LoadingGuard::begin(&self.inner.state);
        let result = self.inner.api.register(credentials).await;
        self.complete_auth(result.map_err(AuthError::from), "Sign up")
    }

    fn complete_auth(
        &self,
        result: Result<crate::api::AuthGrant, AuthError>,
        action: &str,
    ) -> Result<SignedIn, AuthError> {
        let grant = result.map_err(|e| {
            match &e {
                AuthError::Rejected(message) => info!(action, %message, "Rejected by server"),
                other => error!(action, error = %other, "Request failed"),
            }
            e
        })?;

        self.persist(&grant.token, &grant.session)?;
        self.set_session(Some(grant.session.clone()));
        info!(action, user_id = %grant.session.id, "Signed in");

        Ok(SignedIn {
            session: grant.session,
            token: grant.token,
        })
    }

    /// Token first, then the record. A partial write is rolled back.
    fn persist(&self, token: &str, session: &Session) -> Result<(), AuthError> {
        let record =
            serde_json::to_string(session).map_err(|e| AuthError::Storage(e.to_string()))?;

        let written = self
            .store()
            .set(TOKEN_KEY, token)
            .and_then(|()| self.store().set(SESSION_KEY, &record));

        if let Err(e) = written {
            error!(error = %e, "Failed to save session");
            self.clear_persisted();
            return Err(AuthError::Storage(format!("{:#}", e)));
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Sign out
    // ------------------------------------------------------------------------

    /// Always ends signed out with both keys cleared. The server is told
    /// about it on a best-effort basis.
    pub async fn sign_out(&self) {
        let _loading = LoadingGuard::begin(&self.inner.state);

        if let Some(token) = self.stored_token() {
            if let Err(e) = self.inner.api.logout(&token).await {
                warn!(error = %e, "Logout endpoint failed");
            }
        }

        self.clear_persisted();
        self.set_session(None);
        info!("Signed out");
    }

    fn stored_token(&self) -> Option<String> {
        match self.store().get(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                None
            }
        }
    }

    fn clear_persisted(&self) {
        if let Err(e) = self.store().remove_many(&[TOKEN_KEY, SESSION_KEY]) {
            error!(error = %e, "Failed to clear auth data");
        }
    }

    // ------------------------------------------------------------------------
    // Profile
    // ------------------------------------------------------------------------

    /// Merge `patch` into the current session, persist it and publish it.
    /// Remote sync is best-effort and never rolls back the local update.
    pub async fn update_user(&self, patch: &SessionPatch) -> Result<Session, AuthError> {
        let current = self.current_session().ok_or(AuthError::NoActiveSession)?;
        let updated = current.merged(patch);

        match serde_json::to_string(&updated) {
            Ok(record) => {
                if let Err(e) = self.store().set(SESSION_KEY, &record) {
                    warn!(error = %e, "Failed to persist profile update");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize profile update"),
        }
        self.set_session(Some(updated.clone()));

        // Nothing changed, so there is nothing to sync
        if patch.is_empty() {
            return Ok(updated);
        }
        if let Some(token) = self.stored_token() {
            if let Err(e) = self.inner.api.update_profile(&token, patch).await {
                warn!(error = %e, "Profile update sync failed");
            }
        }

        Ok(updated)
    }

    // ------------------------------------------------------------------------
    // Direct override / guest
    // ------------------------------------------------------------------------

    /// Replace the in-memory session without touching storage or the network.
    pub fn set_current_session(&self, session: Option<Session>) {
        self.set_session(session);
    }

    /// Start a local-only guest session. The record is written to storage
    /// and any leftover token is removed first, so `restore` will not bring
    /// it back.
    pub async fn continue_as_guest(&self) -> Result<Session, AuthError> {
        let guest = Session::guest(Utc::now());

        let record =
            serde_json::to_string(&guest).map_err(|e| AuthError::Storage(e.to_string()))?;
        self.store()
            .remove_many(&[TOKEN_KEY])
            .and_then(|()| self.store().set(SESSION_KEY, &record))
            .map_err(|e| {
                error!(error = %e, "Guest login error");
                AuthError::Storage("Failed to continue as guest. Please try again.".to_string())
            })?;

        self.set_current_session(Some(guest.clone()));
        info!(user_id = %guest.id, "Continuing as guest");
        Ok(guest)
    }
}
