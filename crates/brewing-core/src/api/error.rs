use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Server was reachable but refused the request.
    #[error("{0}")]
    Rejected(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::NetworkError(err)
        }
    }
}

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn unparseable(status: reqwest::StatusCode, body: &str) -> Self {
        ApiError::InvalidResponse(format!("Status {}: {}", status, Self::truncate_body(body)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_short() {
        assert_eq!(ApiError::truncate_body("oops"), "oops");
    }

    #[test]
    fn test_truncate_body_long() {
        let body = "x".repeat(MAX_ERROR_BODY_LENGTH + 20);
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.starts_with(&"x".repeat(MAX_ERROR_BODY_LENGTH)));
        assert!(truncated.ends_with("(truncated, 520 total bytes)"));
    }

    #[test]
    fn test_truncate_body_respects_char_boundary() {
        let body = "é".repeat(MAX_ERROR_BODY_LENGTH);
        // Must not panic slicing through a multi-byte char
        let truncated = ApiError::truncate_body(&body);
        assert!(truncated.contains("truncated"));
    }

    #[test]
    fn test_unparseable_mentions_status() {
        let err = ApiError::unparseable(reqwest::StatusCode::BAD_GATEWAY, "<html>");
        assert_eq!(err.to_string(), "Invalid response: Status 502 Bad Gateway: <html>");
    }
}
