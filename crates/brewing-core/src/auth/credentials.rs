use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum password length accepted for a new account.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Minimum display name length (after trimming) for a new account.
pub const MIN_NAME_LENGTH: usize = 2;

/// Field-level form errors, one optional message per input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.name.is_none()
    }

    pub(crate) fn email(message: &str) -> Self {
        Self {
            email: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub(crate) fn password(message: &str) -> Self {
        Self {
            password: Some(message.to_string()),
            ..Self::default()
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = [&self.name, &self.email, &self.password]
            .into_iter()
            .filter_map(|m| m.as_deref())
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignInCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignUpCredentials {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl SignInCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Lower-case and trim the email. The password is sent as typed.
    pub fn normalized(&self) -> Self {
        Self {
            email: normalize_email(&self.email),
            password: self.password.clone(),
        }
    }

    /// Full login form check, reporting every failing field.
    pub fn validate(&self) -> FieldErrors {
        FieldErrors {
            email: email_error(&self.email),
            password: password_error(&self.password),
            name: None,
        }
    }
}

impl SignUpCredentials {
    pub fn new(
        email: impl Into<String>,
        password: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            name: name.into(),
        }
    }

    pub fn normalized(&self) -> Self {
        Self {
            email: normalize_email(&self.email),
            password: self.password.clone(),
            name: self.name.trim().to_string(),
        }
    }

    /// Full registration form check, reporting every failing field.
    pub fn validate(&self) -> FieldErrors {
        FieldErrors {
            email: email_error(&self.email),
            password: password_error(&self.password),
            name: name_error(&self.name),
        }
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic `local@domain.tld` shape: exactly one `@`, no whitespace, and a dot
/// inside the domain with at least one character on each side.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() {
        return false;
    }

    let chars: Vec<char> = domain.chars().collect();
    chars.len() >= 3 && chars[1..chars.len() - 1].contains(&'.')
}

fn email_error(email: &str) -> Option<String> {
    if email.is_empty() {
        Some("Email is required".to_string())
    } else if !is_valid_email(email) {
        Some("Please enter a valid email address".to_string())
    } else {
        None
    }
}

fn password_error(password: &str) -> Option<String> {
    if password.is_empty() {
        Some("Password is required".to_string())
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        Some(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ))
    } else {
        None
    }
}

fn name_error(name: &str) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Some("Name is required".to_string())
    } else if trimmed.chars().count() < MIN_NAME_LENGTH {
        Some(format!("Name must be at least {} characters", MIN_NAME_LENGTH))
    } else {
        None
    }
}

/// Checks `SessionManager::sign_in` performs before any I/O.
pub(crate) fn check_sign_in(credentials: &SignInCredentials) -> Result<(), FieldErrors> {
    if credentials.email.is_empty() {
        return Err(FieldErrors::email("Email is required"));
    }
    if credentials.password.is_empty() {
        return Err(FieldErrors::password("Password is required"));
    }
    Ok(())
}

/// Checks `SessionManager::sign_up` performs before any I/O, first failure wins.
pub(crate) fn check_sign_up(credentials: &SignUpCredentials) -> Result<(), FieldErrors> {
    if !is_valid_email(&credentials.email) {
        return Err(FieldErrors::email("Please enter a valid email address"));
    }
    if let Some(message) = password_error(&credentials.password) {
        return Err(FieldErrors::password(&message));
    }
    if credentials.name.trim().is_empty() {
        return Err(FieldErrors {
            name: Some("Name is required".to_string()),
            ..FieldErrors::default()
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email() {
        assert!(is_valid_email("a@b.com"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(is_valid_email("x@y.z"));

        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plainaddress")); // no @
        assert!(!is_valid_email("a@bcom")); // no domain dot
        assert!(!is_valid_email("@b.com")); // empty local part
        assert!(!is_valid_email("a@.com")); // dot first in domain
        assert!(!is_valid_email("a@com.")); // dot last in domain
        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b.com ")); // trailing whitespace
    }

    #[test]
    fn test_normalized_email_and_name() {
        let creds = SignUpCredentials::new("  Ann@Example.COM ", "Secret1", "  Ann  ");
        let normalized = creds.normalized();
        assert_eq!(normalized.email, "ann@example.com");
        assert_eq!(normalized.name, "Ann");
        assert_eq!(normalized.password, "Secret1");

        let sign_in = SignInCredentials::new(" BOB@x.io", " pw ").normalized();
        assert_eq!(sign_in.email, "bob@x.io");
        assert_eq!(sign_in.password, " pw ");
    }

    #[test]
    fn test_sign_in_form_validation() {
        let errors = SignInCredentials::new("", "").validate();
        assert_eq!(errors.email.as_deref(), Some("Email is required"));
        assert_eq!(errors.password.as_deref(), Some("Password is required"));
        assert!(errors.name.is_none());

        let errors = SignInCredentials::new("nope", "123").validate();
        assert_eq!(errors.email.as_deref(), Some("Please enter a valid email address"));
        assert_eq!(
            errors.password.as_deref(),
            Some("Password must be at least 6 characters")
        );

        assert!(SignInCredentials::new("a@b.com", "secret1").validate().is_empty());
    }

    #[test]
    fn test_sign_up_form_validation_name() {
        let errors = SignUpCredentials::new("a@b.com", "secret1", "   ").validate();
        assert_eq!(errors.name.as_deref(), Some("Name is required"));

        let errors = SignUpCredentials::new("a@b.com", "secret1", " A ").validate();
        assert_eq!(errors.name.as_deref(), Some("Name must be at least 2 characters"));

        assert!(SignUpCredentials::new("a@b.com", "secret1", "Ann").validate().is_empty());
    }

    #[test]
    fn test_check_sign_up_first_failure_wins() {
        let err = check_sign_up(&SignUpCredentials::new("bad", "123", "Ann")).unwrap_err();
        assert!(err.email.is_some());
        assert!(err.password.is_none());

        let err = check_sign_up(&SignUpCredentials::new("a@b.com", "12345", "Ann")).unwrap_err();
        assert_eq!(
            err.password.as_deref(),
            Some("Password must be at least 6 characters")
        );

        let err = check_sign_up(&SignUpCredentials::new("a@b.com", "123456", " ")).unwrap_err();
        assert_eq!(err.name.as_deref(), Some("Name is required"));

        assert!(check_sign_up(&SignUpCredentials::new("a@b.com", "123456", "Ann")).is_ok());
    }

    #[test]
    fn test_check_sign_in_requires_both_fields() {
        assert!(check_sign_in(&SignInCredentials::new("", "pw")).is_err());
        assert!(check_sign_in(&SignInCredentials::new("a@b.com", "")).is_err());
        assert!(check_sign_in(&SignInCredentials::new("a@b.com", "pw")).is_ok());
    }

    #[test]
    fn test_field_errors_display() {
        let errors = FieldErrors {
            email: Some("bad email".to_string()),
            password: None,
            name: Some("bad name".to_string()),
        };
        assert_eq!(errors.to_string(), "bad name; bad email");
    }
}
