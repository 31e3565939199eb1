//! Uniform response envelope for the transport boundary.
//!
//! Every operation result is wrapped as `{success, message, data | errors}`.
//! Failures carry the stable code of their [`crate::error::ErrorKind`] and the HTTP status
//! a web adapter should use.

use crate::error::Classify;
use serde::{Deserialize, Serialize};
use std::fmt;

const INTERNAL_MESSAGE: &str = "an internal error occurred";

/// A single reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    /// Stable error code such as `ALREADY_DECIDED`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Summary message.
    pub message: String,
    /// Payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failures, empty on success.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ApiErrorDetail>,
    /// HTTP status for the transport adapter.
    #[serde(skip)]
    pub status: u16,
}

impl<T> ApiResponse<T> {
    /// Wraps a successful payload.
    #[must_use]
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: Vec::new(),
            status: 200,
        }
    }

    /// Wraps a classified failure.
    ///
    /// Internal failures are reported with a generic message so store
    /// details never reach clients.
    #[must_use]
    pub fn from_error<E>(error: &E) -> Self
    where
        E: Classify + fmt::Display,
    {
        let kind = error.kind();
        let message = if kind.is_internal() {
            tracing::error!(code = kind.code(), %error, "internal failure");
            INTERNAL_MESSAGE.to_owned()
        } else {
            error.to_string()
        };
        Self {
            success: false,
            message: message.clone(),
            data: None,
            errors: vec![ApiErrorDetail {
                code: kind.code().to_owned(),
                message,
            }],
            status: kind.http_status(),
        }
    }

    /// Converts an operation result into an envelope.
    #[must_use]
    pub fn from_result<E>(result: Result<T, E>, message: impl Into<String>) -> Self
    where
        E: Classify + fmt::Display,
    {
        match result {
            Ok(data) => Self::ok(data, message),
            Err(error) => Self::from_error(&error),
        }
    }

    /// Returns the classified kind of the first failure, if any.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.errors.first().map(|detail| detail.code.as_str())
    }
}
