/**
 * Backend Error Types
 *
 * This module defines the error types used throughout the feedback backend.
 * These errors are used in HTTP handlers and can be converted to HTTP responses.
 *
 * # Error Categories
 *
 * ## Contract Violations
 *
 * Contract errors signal a misconfiguration or programming fault, never bad
 * user input:
 * - A backend that requires a request was called without one
 * - No backend class could be resolved from the registry
 * - A record was persisted without a derivable client address while the
 *   network-address backend was active
 *
 * They always map to 500 and are never caught on the request path.
 *
 * ## Handler Errors
 *
 * Handler errors carry an explicit status code and cover the normal
 * client-facing outcomes that are not validation failures: duplicate
 * submissions (409), forbidden follow-ups (403), malformed requests (400).
 *
 * ## Not Found
 *
 * Unknown pages or feedback records surface as 404 through the standard
 * framework path.
 *
 * Validation failures are NOT errors: they travel back to the submitter as a
 * 422 payload carrying the form's field and non-field errors.
 */

use axum::http::StatusCode;
use thiserror::Error;

/// Feedback-service error type
///
/// This enum represents all possible errors that can occur in the backend.
/// Each variant can be converted to an HTTP response via `IntoResponse`.
///
/// # Usage
///
/// ```rust
/// use axum::http::StatusCode;
/// use sitefeedback::backend::error::FeedbackError;
///
/// // A misconfiguration fault
/// let err = FeedbackError::contract("No request available for the IP backend");
///
/// // A client-facing outcome with an explicit status
/// let err = FeedbackError::handler(StatusCode::CONFLICT, "Feedback already submitted");
///
/// // A missing resource
/// let err = FeedbackError::not_found("page");
/// ```
#[derive(Debug, Error)]
pub enum FeedbackError {
    /// Contract violation (misconfiguration or programming fault)
    ///
    /// Raised when a backend is used outside its construction contract, e.g.
    /// a duplicate check without a request, or an unknown backend key.
    #[error("Contract violation: {message}")]
    Contract {
        /// Human-readable description of the violated contract
        message: String,
    },

    /// Handler error with an explicit status code
    ///
    /// Covers normal client-facing outcomes that short-circuit a handler:
    /// duplicate submissions, forbidden follow-ups, malformed requests.
    #[error("Handler error: {message}")]
    Handler {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// A referenced resource does not exist
    #[error("{what} not found")]
    NotFound {
        /// What was looked up ("page", "feedback", ...)
        what: String,
    },

    /// Database error
    ///
    /// `RowNotFound` is mapped to 404; everything else is a 500.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FeedbackError {
    /// Create a new contract-violation error
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract {
            message: message.into(),
        }
    }

    /// Create a new handler error with a status code
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Handler {
            status,
            message: message.into(),
        }
    }

    /// Create a new not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Convenience constructor for the duplicate-submission outcome
    ///
    /// Duplicate detection is a normal decision, not a fault; it is carried
    /// as a 409 so the submitter gets an informational response.
    pub fn duplicate() -> Self {
        Self::handler(
            StatusCode::CONFLICT,
            "You have already submitted feedback for this page.",
        )
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Contract` - 500 Internal Server Error
    /// - `Handler` - the carried status code
    /// - `NotFound` - 404 Not Found
    /// - `Database` - 404 for `RowNotFound`, else 500
    /// - `Serialization` - 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Contract { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Handler { status, .. } => *status,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::Contract { message } => message.clone(),
            Self::Handler { message, .. } => message.clone(),
            Self::NotFound { what } => format!("{what} not found"),
            Self::Database(err) => err.to_string(),
            Self::Serialization(err) => err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_error() {
        let error = FeedbackError::contract("No backend class specified");
        match error {
            FeedbackError::Contract { message } => {
                assert_eq!(message, "No backend class specified");
            }
            _ => panic!("Expected Contract"),
        }
    }

    #[test]
    fn test_handler_error() {
        let error = FeedbackError::handler(StatusCode::FORBIDDEN, "Messages not allowed");
        match error {
            FeedbackError::Handler { status, message } => {
                assert_eq!(status, StatusCode::FORBIDDEN);
                assert_eq!(message, "Messages not allowed");
            }
            _ => panic!("Expected Handler"),
        }
    }

    #[test]
    fn test_status_code_mapping() {
        let contract = FeedbackError::contract("boom");
        assert_eq!(contract.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let duplicate = FeedbackError::duplicate();
        assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

        let not_found = FeedbackError::not_found("page");
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);

        let row = FeedbackError::Database(sqlx::Error::RowNotFound);
        assert_eq!(row.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_error_message() {
        let error = FeedbackError::not_found("feedback");
        assert_eq!(error.message(), "feedback not found");

        let error = FeedbackError::handler(StatusCode::BAD_REQUEST, "Test message");
        assert!(error.message().contains("Test message"));
    }
}
