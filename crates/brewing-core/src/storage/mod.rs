//! Persistent key-value storage for the auth token and session record.
//!
//! The `SessionManager` is the only writer of its two keys. Backends:
//! - `FileStore`: a JSON file in the app data directory
//! - `KeyringStore`: one OS keychain entry per key
//! - `MemoryStore`: in-process, for tests and throwaway runs
//!
//! No transaction spans both keys; readers must tolerate one key without
//! the other.

pub mod file;
pub mod keychain;
pub mod memory;

use anyhow::Result;

pub use self::file::FileStore;
pub use self::keychain::KeyringStore;
pub use self::memory::MemoryStore;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "@auth_token";

/// Key holding the serialized `Session` record.
pub const SESSION_KEY: &str = "@user_data";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every key in `keys`. Missing keys are not an error.
    fn remove_many(&self, keys: &[&str]) -> Result<()>;
}
