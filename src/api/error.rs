use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::core::config::ConfigError;

/// Convenient result alias for the API binding.
pub type Result<T> = std::result::Result<T, ApiError>;

/// One field-level message from an API error body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    #[serde(default)]
    pub message_code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub field: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

/// Errors returned by the API binding.
#[derive(Debug, Error, Diagnostic)]
pub enum ApiError {
    /// 404 from the API.
    #[error("Not found: {message}")]
    #[diagnostic(code(asa::api::not_found))]
    NotFound {
        message: String,
        #[help]
        details: Option<String>,
    },

    /// 400 from the API, with per-field messages when provided.
    #[error("Validation error: {message}")]
    #[diagnostic(code(asa::api::validation))]
    Validation {
        message: String,
        field_errors: Vec<FieldError>,
        #[help]
        details: Option<String>,
    },

    /// 401 or 403 from the API.
    #[error("Not authorized ({status}): {message}")]
    #[diagnostic(
        code(asa::api::unauthorized),
        help("Check your credentials and organization with `asa auth test`")
    )]
    Unauthorized { status: u16, message: String },

    /// 429 from the API.
    #[error("Rate limit exceeded: {message}")]
    #[diagnostic(code(asa::api::rate_limited), help("Wait a moment and try again"))]
    RateLimited { message: String },

    /// Any other non-success status.
    #[error("API error ({status}): {message}")]
    #[diagnostic(code(asa::api::status))]
    Status {
        status: u16,
        message: String,
        #[help]
        details: Option<String>,
    },

    /// The OAuth token endpoint refused the client secret.
    #[error("Failed to obtain access token ({status}): {message}")]
    #[diagnostic(
        code(asa::api::token),
        help("Verify ASA_CLIENT_ID, ASA_TEAM_ID, ASA_KEY_ID and the private key")
    )]
    Token { status: u16, message: String },

    /// The private key could not sign a client secret.
    #[error("Failed to sign client secret")]
    #[diagnostic(
        code(asa::api::key),
        help("The private key must be an EC (P-256) key in PEM format")
    )]
    Key(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    /// Transport-level failure.
    #[error("HTTP request failed")]
    #[diagnostic(code(asa::api::http))]
    Http(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("Unexpected response from {path}")]
    #[diagnostic(code(asa::api::decode))]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A successful response carried no `data`.
    #[error("Empty response from {path}")]
    #[diagnostic(code(asa::api::empty))]
    EmptyResponse { path: String },

    #[error("Custom report {id} did not complete within {seconds}s")]
    #[diagnostic(code(asa::api::report_timeout), help("Try a shorter date range"))]
    ReportTimeout { id: i64, seconds: u64 },

    #[error("Custom report {id} finished in state {state}")]
    #[diagnostic(code(asa::api::report_failed))]
    ReportFailed { id: i64, state: String },

    /// Downloaded report CSV could not be read.
    #[error("Failed to read report data")]
    #[diagnostic(code(asa::api::csv))]
    Csv(#[from] csv::Error),
}

impl ApiError {
    /// Build an error from a non-success response
    pub(crate) fn from_status(status: u16, body: &str) -> ApiError {
        let parsed: Option<ErrorBody> = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("error").cloned())
            .and_then(|e| serde_json::from_value(e).ok());
        let field_errors = parsed.map(|b| b.errors).unwrap_or_default();

        let message = field_errors
            .first()
            .map(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| reason(status).to_string());

        let mut details = vec![format!("Status code: {}", status)];
        for e in &field_errors {
            match &e.field {
                Some(field) => details.push(format!("{}: {}", field, e.message)),
                None => details.push(e.message.clone()),
            }
        }
        if !body.is_empty() && body.len() < 500 {
            details.push(format!("Response: {}", body));
        }
        let details = Some(details.join("\n"));

        match status {
            400 => ApiError::Validation {
                message,
                field_errors,
                details,
            },
            401 | 403 => ApiError::Unauthorized { status, message },
            404 => ApiError::NotFound { message, details },
            429 => ApiError::RateLimited { message },
            _ => ApiError::Status {
                status,
                message,
                details,
            },
        }
    }

    /// HTTP status code behind this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Validation { .. } => Some(400),
            ApiError::Unauthorized { status, .. } => Some(*status),
            ApiError::RateLimited { .. } => Some(429),
            ApiError::Status { status, .. } | ApiError::Token { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Resource not found",
        429 => "Too many requests",
        500..=599 => "Server error",
        _ => "Request failed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_keeps_field_messages() {
        let body = r#"{"data":null,"error":{"errors":[{"messageCode":"INVALID_INPUT","message":"budget too low","field":"dailyBudgetAmount"}]}}"#;
        let err = ApiError::from_status(400, body);
        match &err {
            ApiError::Validation {
                message,
                field_errors,
                details,
            } => {
                assert_eq!(message, "budget too low");
                assert_eq!(field_errors[0].field.as_deref(), Some("dailyBudgetAmount"));
                let details = details.as_deref().unwrap();
                assert!(details.contains("Status code: 400"));
                assert!(details.contains("dailyBudgetAmount: budget too low"));
                assert!(details.contains("Response: "));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(err.status(), Some(400));
    }

    #[test]
    fn test_status_mapping() {
        assert!(ApiError::from_status(404, "").is_not_found());
        assert!(matches!(ApiError::from_status(401, ""), ApiError::Unauthorized { status: 401, .. }));
        assert!(matches!(ApiError::from_status(429, ""), ApiError::RateLimited { .. }));
        assert!(matches!(ApiError::from_status(503, "oops"), ApiError::Status { status: 503, .. }));
    }

    #[test]
    fn test_long_body_not_echoed() {
        let body = "x".repeat(600);
        match ApiError::from_status(500, &body) {
            ApiError::Status { details, message, .. } => {
                assert_eq!(message, "Server error");
                assert!(!details.unwrap().contains("Response:"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
