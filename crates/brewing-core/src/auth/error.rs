use thiserror::Error;

use crate::api::ApiError;

use super::FieldErrors;

/// Message shown for transport failures, kept distinct from credential errors.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Unable to connect to server. Check your internet connection.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Client-side form check failed before any I/O.
    #[error("{0}")]
    Validation(FieldErrors),

    /// Server answered and refused (bad credentials, duplicate account, ...).
    #[error("{0}")]
    Rejected(String),

    /// Connectivity failure or a response that could not be understood.
    #[error("Network error: {0}")]
    Network(String),

    /// Persisted session record could not be parsed.
    #[error("Stored session is corrupted: {0}")]
    CorruptedData(String),

    /// `update_user` was called while signed out.
    #[error("No user logged in")]
    NoActiveSession,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AuthError {
    /// Text a screen should show inline for this error.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::Validation(fields) => fields.to_string(),
            AuthError::Rejected(message) => message.clone(),
            AuthError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
            AuthError::CorruptedData(_) | AuthError::Storage(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            AuthError::NoActiveSession => self.to_string(),
        }
    }
}

impl From<FieldErrors> for AuthError {
    fn from(fields: FieldErrors) -> Self {
        AuthError::Validation(fields)
    }
}

impl From<ApiError> for AuthError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected(message) => AuthError::Rejected(message),
            other => AuthError::Network(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_rejection_maps_to_rejected() {
        let err: AuthError = ApiError::Rejected("Invalid credentials".into()).into();
        assert_eq!(err, AuthError::Rejected("Invalid credentials".into()));
        assert_eq!(err.user_message(), "Invalid credentials");
    }

    #[test]
    fn test_transport_failures_map_to_network() {
        let err: AuthError = ApiError::Timeout.into();
        assert!(matches!(err, AuthError::Network(_)));
        assert_eq!(err.user_message(), NETWORK_ERROR_MESSAGE);

        let err: AuthError = ApiError::InvalidResponse("garbage".into()).into();
        assert!(matches!(err, AuthError::Network(_)));
    }

    #[test]
    fn test_validation_message_is_field_text() {
        let err = AuthError::from(FieldErrors {
            email: Some("Please enter a valid email address".into()),
            ..FieldErrors::default()
        });
        assert_eq!(err.user_message(), "Please enter a valid email address");
    }
}
