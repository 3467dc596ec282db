//! Result and error types for the core library

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::validation::Field;

/// Core library error type
///
/// Every failure a page workflow can hit collapses into one of these.
/// `Display` is the human-readable message shown to the user.
#[derive(Error, Debug)]
pub enum Error {
    /// A form field failed validation
    #[error("{message}")]
    Validation { field: Field, message: String },

    /// The request never produced an HTTP response
    #[error("{0}")]
    Network(String),

    /// The service answered with a non-success status
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The service answered 2xx but the body could not be decoded
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a validation error for a field
    pub fn validation(field: Field, msg: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: msg.into(),
        }
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// HTTP status of an API error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result with optional context (for `--json` output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub context: Option<HashMap<String, serde_json::Value>>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            context: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            context: None,
        }
    }

    /// Attach a context value
    pub fn with_context(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value);
        self
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => {
                let failed = Self::fail(e.to_string());
                match e {
                    Error::Validation { field, .. } => {
                        failed.with_context("field", serde_json::json!(field))
                    }
                    Error::Api { status, .. } => {
                        failed.with_context("status", serde_json::json!(status))
                    }
                    _ => failed,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_result_ok() {
        let result: OperationResult<i32> = OperationResult::ok(42);
        assert!(result.success);
        assert_eq!(result.data, Some(42));
        assert!(result.error.is_none());
    }

    #[test]
    fn test_operation_result_fail() {
        let result: OperationResult<i32> = OperationResult::fail("Something went wrong");
        assert!(!result.success);
        assert!(result.data.is_none());
        assert_eq!(result.error, Some("Something went wrong".to_string()));
    }

    #[test]
    fn test_from_api_error_keeps_status() {
        let err: Result<i32> = Err(Error::Api {
            status: 503,
            message: "HTTP error! status: 503".to_string(),
        });
        let result: OperationResult<i32> = err.into();
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("HTTP error! status: 503"));
        assert_eq!(result.context.unwrap()["status"], serde_json::json!(503));
    }

    #[test]
    fn test_validation_error_displays_message_only() {
        let err = Error::validation(Field::Email, "Please enter a valid email address");
        assert_eq!(err.to_string(), "Please enter a valid email address");
        assert!(err.status().is_none());
    }
}
