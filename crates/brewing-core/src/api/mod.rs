//! REST client module for the brewing app auth API.
//!
//! This module provides the `AuthApi` for signing in, registering,
//! invalidating a token on logout and syncing profile changes.
//!
//! Authenticated calls use a bearer token issued by the login and
//! register endpoints.

pub mod client;
pub mod error;

pub use client::{AuthApi, AuthGrant};
pub use error::ApiError;
