//! Core library for the brewing companion app.
//!
//! Provides the client-side session lifecycle shared by every screen:
//! - `auth`: the `Session` record, credential forms and the `SessionManager`
//! - `api`: HTTP client for the remote auth API
//! - `storage`: persistent key-value backends for the token and session record
//! - `config`: application configuration (API base URL, storage backend)

pub mod api;
pub mod auth;
pub mod config;
pub mod storage;

pub use api::{ApiError, AuthApi};
pub use auth::{
    AuthError, AuthResponse, FieldErrors, Session, SessionManager, SessionPatch, SessionPhase,
    SessionState, SignInCredentials, SignUpCredentials, SignedIn,
};
pub use config::{Config, StorageBackend};
pub use storage::{FileStore, KeyValueStore, KeyringStore, MemoryStore};
