//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `Session`: the signed-in (or guest) identity and its partial update
//! - `SignInCredentials` / `SignUpCredentials`: login form normalization and validation
//! - `SessionManager`: restore, sign-in, sign-up, sign-out and profile update
//!
//! The bearer token and the session record are persisted under two separate
//! storage keys. Guest sessions are local-only and never get a token.

pub mod credentials;
pub mod error;
pub mod manager;
pub mod session;

pub use credentials::{FieldErrors, SignInCredentials, SignUpCredentials};
pub use error::AuthError;
pub use manager::{AuthResponse, SessionManager, SessionPhase, SessionState, SignedIn};
pub use session::{Session, SessionPatch, GUEST_ID_PREFIX};
