//! Error types for API requests
//!
//! Failed responses are classified into an [`ApiError`] carrying a stable
//! code and a remediation hint, so callers and output renderers can react
//! to the failure category instead of raw status codes.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::client::Response;

const API_KEYS_DOCS: &str =
    "https://docs.ahrefs.com/docs/api/reference/api-keys-creation-and-management";
const LIMITS_DOCS: &str = "https://docs.ahrefs.com/docs/api/reference/limits-consumption";

/// A classified error response from the API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("API error ({status_code}): {message}")]
pub struct ApiError {
    /// HTTP status of the failed response
    pub status_code: u16,
    /// Stable error category, set for recognized statuses only
    pub code: Option<&'static str>,
    /// Human readable message, never empty
    pub message: String,
    /// How to fix the problem
    pub suggestion: Option<&'static str>,
    /// Where to read more about it
    pub docs_url: Option<&'static str>,
}

/// Errors produced while executing a request
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("invalid endpoint URL: {0}")]
    InvalidEndpoint(String),

    #[error("failed to create HTTP client")]
    Setup(#[source] reqwest::Error),

    #[error("HTTP request failed")]
    Transport(#[source] reqwest::Error),

    #[error("failed to read response body")]
    Body(#[source] reqwest::Error),

    #[error("{error}")]
    Api {
        error: ApiError,
        response: Box<Response>,
    },

    #[error("request failed after {retries} retries")]
    Exhausted {
        retries: u32,
        #[source]
        last: Box<RequestError>,
    },

    #[error("request cancelled")]
    Cancelled,
}

impl RequestError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Body(_) => true,
            Self::Api { error, .. } => {
                error.status_code == StatusCode::TOO_MANY_REQUESTS.as_u16()
                    || error.status_code >= 500
            }
            _ => false,
        }
    }

    /// The classified API error, looking through exhausted retries
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { error, .. } => Some(error),
            Self::Exhausted { last, .. } => last.api_error(),
            _ => None,
        }
    }

    /// The raw response behind an API error
    pub fn response(&self) -> Option<&Response> {
        match self {
            Self::Api { response, .. } => Some(response),
            Self::Exhausted { last, .. } => last.response(),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Classify a failed response into an [`ApiError`].
///
/// The message comes from the `{"error": {"message": ..}}` envelope when
/// present, else the raw body, else the canonical status text. Code,
/// suggestion and docs link depend on the status alone.
pub fn classify(status: u16, body: &[u8]) -> ApiError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .map(|parsed| parsed.error.message)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| fallback_message(status, body));

    let (code, suggestion, docs_url) = match status {
        401 | 403 => (
            Some("AUTH_ERROR"),
            Some("Check your API key. Run 'ahrefs config set-key <your-key>' to configure it"),
            Some(API_KEYS_DOCS),
        ),
        429 => (
            Some("RATE_LIMIT_ERROR"),
            Some("Rate limit exceeded. Wait before retrying or check your subscription limits"),
            Some(LIMITS_DOCS),
        ),
        400 => (
            Some("VALIDATION_ERROR"),
            Some("Check the request parameters. Run the command with --help to see valid options"),
            None,
        ),
        404 => (
            Some("NOT_FOUND"),
            Some("Endpoint or resource not found. Verify the target and the endpoint"),
            None,
        ),
        _ => (None, None, None),
    };

    ApiError {
        status_code: status,
        code,
        message,
        suggestion,
        docs_url,
    }
}

fn fallback_message(status: u16, body: &[u8]) -> String {
    if !body.is_empty() {
        return String::from_utf8_lossy(body).into_owned();
    }
    StatusCode::from_u16(status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_auth_errors() {
        for status in [401, 403] {
            let error = classify(status, br#"{"error":{"code":"x","message":"Invalid token"}}"#);
            assert_eq!(error.code, Some("AUTH_ERROR"));
            assert_eq!(error.message, "Invalid token");
            assert!(error.suggestion.unwrap().contains("set-key"));
            assert_eq!(error.docs_url, Some(API_KEYS_DOCS));
        }
    }

    #[test]
    fn test_classify_recognized_statuses() {
        assert_eq!(classify(429, b"").code, Some("RATE_LIMIT_ERROR"));
        assert_eq!(classify(429, b"").docs_url, Some(LIMITS_DOCS));
        assert_eq!(classify(400, b"").code, Some("VALIDATION_ERROR"));
        assert_eq!(classify(404, b"").code, Some("NOT_FOUND"));
        assert_eq!(classify(404, b"").docs_url, None);
    }

    #[test]
    fn test_classify_other_statuses_carry_message_only() {
        for status in [402, 409, 500, 502, 503] {
            let error = classify(status, br#"{"error":{"code":"INTERNAL","message":"boom"}}"#);
            assert_eq!(error.code, None, "status {}", status);
            assert_eq!(error.suggestion, None);
            assert_eq!(error.docs_url, None);
            assert_eq!(error.message, "boom");
        }
    }

    #[test]
    fn test_classify_falls_back_to_body_text() {
        let error = classify(502, b"<html>bad gateway</html>");
        assert_eq!(error.message, "<html>bad gateway</html>");

        // an envelope without a message is not a usable message
        let error = classify(400, br#"{"error":{}}"#);
        assert_eq!(error.message, r#"{"error":{}}"#);
    }

    #[test]
    fn test_classify_falls_back_to_status_text() {
        assert_eq!(classify(404, b"").message, "Not Found");
        assert_eq!(classify(503, b"").message, "Service Unavailable");
        assert_eq!(classify(599, b"").message, "HTTP 599");
    }

    #[test]
    fn test_api_error_display() {
        let error = classify(401, br#"{"error":{"message":"Invalid token"}}"#);
        assert_eq!(error.to_string(), "API error (401): Invalid token");
    }

    #[test]
    fn test_missing_key_message() {
        assert_eq!(RequestError::MissingApiKey.to_string(), "API key is required");
    }

    #[test]
    fn test_exhausted_exposes_last_api_error() {
        let last = RequestError::Api {
            error: classify(503, b""),
            response: Box::default(),
        };
        assert!(last.is_retryable());

        let exhausted = RequestError::Exhausted {
            retries: 3,
            last: Box::new(last),
        };
        assert!(!exhausted.is_retryable());
        assert_eq!(exhausted.api_error().map(|e| e.status_code), Some(503));
        assert!(exhausted.response().is_some());
        assert_eq!(
            format!("{:#}", anyhow::Error::from(exhausted)),
            "request failed after 3 retries: API error (503): Service Unavailable"
        );
    }
}
