//! API client for the brewing app auth endpoints.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{Session, SessionPatch, SignInCredentials, SignUpCredentials};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const LOGOUT_PATH: &str = "/auth/logout";
const PROFILE_PATH: &str = "/auth/profile";

const LOGIN_FALLBACK_MESSAGE: &str = "Invalid credentials";
const REGISTER_FALLBACK_MESSAGE: &str = "Registration failed";

/// Body shape shared by the login and register endpoints.
#[derive(Debug, Deserialize)]
struct AuthEnvelope {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    // Only decoded once the request is known to have succeeded
    user: Option<serde_json::Value>,
    token: Option<String>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RegisterBody<'a> {
    email: &'a str,
    password: &'a str,
    name: &'a str,
}

/// A successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub session: Session,
    pub token: String,
}

/// Client for the remote auth API.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct AuthApi {
    client: Client,
    base_url: String,
}

impl AuthApi {
    /// Create a client rooted at `base_url` (e.g. `https://api.example.com`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Exchange credentials for a session and bearer token
    pub async fn login(&self, credentials: &SignInCredentials) -> Result<AuthGrant, ApiError> {
        let body = LoginBody {
            email: &credentials.email,
            password: &credentials.password,
        };
        self.post_credentials(LOGIN_PATH, &body, LOGIN_FALLBACK_MESSAGE)
            .await
    }

    /// Create an account and receive a session and bearer token
    pub async fn register(&self, credentials: &SignUpCredentials) -> Result<AuthGrant, ApiError> {
        let body = RegisterBody {
            email: &credentials.email,
            password: &credentials.password,
            name: &credentials.name,
        };
        self.post_credentials(REGISTER_PATH, &body, REGISTER_FALLBACK_MESSAGE)
            .await
    }

    /// Ask the server to invalidate `token`. Any HTTP answer counts as delivered.
    pub async fn logout(&self, token: &str) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url(LOGOUT_PATH))
            .bearer_auth(token)
            .header(header::CONTENT_TYPE, "application/json")
            .send()
            .await?;

        debug!(status = %response.status(), "Logout delivered");
        Ok(())
    }

    /// Push changed profile fields. Any HTTP answer counts as delivered.
    pub async fn update_profile(&self, token: &str, patch: &SessionPatch) -> Result<(), ApiError> {
        let response = self
            .client
            .patch(self.url(PROFILE_PATH))
            .bearer_auth(token)
            .json(patch)
            .send()
            .await?;

        debug!(status = %response.status(), "Profile update delivered");
        Ok(())
    }

    async fn post_credentials<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<AuthGrant, ApiError> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await?;

        Self::read_grant(response, fallback).await
    }

    /// Success requires both a 2xx status and `success: true` in the body.
    async fn read_grant(response: Response, fallback: &str) -> Result<AuthGrant, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        let envelope: AuthEnvelope =
            serde_json::from_str(&text).map_err(|_| ApiError::unparseable(status, &text))?;

        if !(status.is_success() && envelope.success) {
            debug!(%status, success = envelope.success, "Auth request rejected");
            let message = envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string());
            return Err(ApiError::Rejected(message));
        }

        match (envelope.user, envelope.token) {
            (Some(user), Some(token)) => {
                let session = serde_json::from_value::<Session>(user)
                    .map_err(|e| ApiError::InvalidResponse(format!("Malformed user: {}", e)))?;
                Ok(AuthGrant { session, token })
            }
            _ => Err(ApiError::InvalidResponse(
                "Response is missing user or token".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = AuthApi::new("http://localhost:3000/api/").unwrap();
        assert_eq!(api.url(LOGIN_PATH), "http://localhost:3000/api/auth/login");
    }

    #[test]
    fn test_parse_auth_envelope_success() {
        let json = r#"{"success":true,"user":{"id":"u1","email":"a@b.com","name":"Ann"},"token":"tok123"}"#;
        let envelope: AuthEnvelope = serde_json::from_str(json).expect("envelope");
        assert!(envelope.success);
        assert_eq!(envelope.token.as_deref(), Some("tok123"));
        let session: Session = serde_json::from_value(envelope.user.unwrap()).unwrap();
        assert_eq!(session.id, "u1");
    }

    #[test]
    fn test_parse_auth_envelope_failure_with_partial_user() {
        let json = r#"{"success":false,"message":"Bad","user":{}}"#;
        let envelope: AuthEnvelope = serde_json::from_str(json).expect("envelope");
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Bad"));
    }

    #[test]
    fn test_parse_auth_envelope_failure_defaults() {
        let envelope: AuthEnvelope = serde_json::from_str(r#"{"message":"Nope"}"#).expect("envelope");
        assert!(!envelope.success);
        assert_eq!(envelope.message.as_deref(), Some("Nope"));
        assert!(envelope.user.is_none());
    }

    #[test]
    fn test_register_body_shape() {
        let body = RegisterBody {
            email: "a@b.com",
            password: "secret1",
            name: "Ann",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"email": "a@b.com", "password": "secret1", "name": "Ann"})
        );
    }
}
