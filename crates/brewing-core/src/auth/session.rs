use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Reserved id prefix marking a locally synthesized guest session.
pub const GUEST_ID_PREFIX: &str = "guest-";

const GUEST_EMAIL: &str = "guest@brewing.app";
const GUEST_NAME: &str = "Guest User";

/// The authenticated identity. Serialized with the same camelCase shape
/// the auth API returns, so the stored record and the wire record match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// ISO-8601 creation timestamp, never changed after creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Session {
    /// Build a local-only guest session. The id is derived from `now`.
    pub fn guest(now: DateTime<Utc>) -> Self {
        Self {
            id: format!("{}{}", GUEST_ID_PREFIX, now.timestamp_millis()),
            email: GUEST_EMAIL.to_string(),
            name: GUEST_NAME.to_string(),
            avatar: None,
            created_at: Some(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }

    /// The only place guest-ness is decided.
    pub fn is_guest(&self) -> bool {
        self.id.starts_with(GUEST_ID_PREFIX)
    }

    /// Shallow merge: fields present in `patch` overwrite, the rest are kept.
    pub fn merged(&self, patch: &SessionPatch) -> Self {
        Self {
            id: self.id.clone(),
            email: patch.email.clone().unwrap_or_else(|| self.email.clone()),
            name: patch.name.clone().unwrap_or_else(|| self.name.clone()),
            avatar: patch.avatar.clone().or_else(|| self.avatar.clone()),
            created_at: self.created_at.clone(),
        }
    }
}

/// Partial profile fields for `SessionManager::update_user`.
///
/// `id` and `createdAt` are deliberately absent: identity and creation
/// time are immutable once a session exists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl SessionPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn avatar(avatar: impl Into<String>) -> Self {
        Self {
            avatar: Some(avatar.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.avatar.is_none()
    }
}
