//! API error types for handler operations
//!
//! Every failed request is answered with `{"error": <message>}` plus an
//! optional `"details"` string. Store faults carry the driver's message as
//! `details`; client errors usually carry none.
//!
//! # Example
//!
//! ```rust
//! use bookstore::handlers::{ApiError, ApiErrorKind, ApiOperation};
//!
//! let error = ApiError::invalid_id(ApiOperation::Get);
//! assert!(matches!(error.kind, ApiErrorKind::BadRequest));
//! assert_eq!(error.message, "Id not a valid Document Id");
//! ```

use std::fmt;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::books::BookValidationError;
use crate::store::StoreError;

/// Message for identifiers that are not 24 hex characters
pub const INVALID_ID_MESSAGE: &str = "Id not a valid Document Id";

/// Message for bodies that could not be read as JSON
pub const INVALID_JSON_MESSAGE: &str = "Request body is not valid JSON.";

/// Operation being performed when the API error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    /// Listing one page of books
    List,
    /// Getting a single book by ID
    Get,
    /// Creating a new book
    Create,
    /// Merging fields into a book
    Update,
    /// Deleting a book
    Delete,
}

impl fmt::Display for ApiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Get => write!(f, "get"),
            Self::Create => write!(f, "create"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

impl ApiOperation {
    /// Message returned when the store fails during this operation
    #[must_use]
    pub const fn fault_message(&self) -> &'static str {
        match self {
            Self::List | Self::Get => "Internal Server Error",
            Self::Create => "An error occurred while adding the book.",
            Self::Update => "An error occurred while updating the book.",
            Self::Delete => "An error occurred while deleting the book.",
        }
    }

    /// Message returned when no book has the requested identifier
    #[must_use]
    pub const fn not_found_message(&self) -> &'static str {
        match self {
            Self::Get => "Book not found",
            _ => "Book not found.",
        }
    }
}

/// Category of API error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    /// Malformed identifier, body or field set
    BadRequest,
    /// No book with the identifier
    NotFound,
    /// Body exceeds the configured limit
    PayloadTooLarge,
    /// Store fault while serving a request
    InternalError,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest => write!(f, "bad_request"),
            Self::NotFound => write!(f, "not_found"),
            Self::PayloadTooLarge => write!(f, "payload_too_large"),
            Self::InternalError => write!(f, "internal_error"),
        }
    }
}

impl ApiErrorKind {
    /// Get the HTTP status code for this error kind
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure is on the server side
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        matches!(self, Self::InternalError)
    }
}

/// Structured API error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// The operation being performed when the error occurred
    pub operation: ApiOperation,
    /// The category of error
    pub kind: ApiErrorKind,
    /// Message sent as `error`
    pub message: String,
    /// Optional text sent as `details`
    pub details: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(operation: ApiOperation, kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Identifier failed the 24-hex check
    pub fn invalid_id(operation: ApiOperation) -> Self {
        Self::new(operation, ApiErrorKind::BadRequest, INVALID_ID_MESSAGE)
    }

    /// No book with the requested identifier
    pub fn not_found(operation: ApiOperation) -> Self {
        Self::new(
            operation,
            ApiErrorKind::NotFound,
            operation.not_found_message(),
        )
    }

    /// Create a bad request error
    pub fn bad_request(operation: ApiOperation, message: impl Into<String>) -> Self {
        Self::new(operation, ApiErrorKind::BadRequest, message)
    }

    /// Body could not be extracted as JSON
    ///
    /// Oversized bodies keep their 413 status; every other rejection
    /// (syntax, wrong content type, unreadable body) becomes a 400.
    pub fn invalid_body(operation: ApiOperation, rejection: &JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Self::new(
                operation,
                ApiErrorKind::PayloadTooLarge,
                "Request body is too large.",
            );
        }
        Self::bad_request(operation, INVALID_JSON_MESSAGE).with_details(rejection.body_text())
    }

    /// Body failed validation
    pub fn validation(operation: ApiOperation, err: &BookValidationError) -> Self {
        Self::bad_request(operation, err.to_string())
    }

    /// Store fault during `operation`
    pub fn store_fault(operation: ApiOperation, err: &StoreError) -> Self {
        tracing::warn!(
            operation = %operation,
            store_operation = %err.operation,
            store_kind = %err.kind,
            retriable = err.is_retriable(),
            "Store fault: {}", err.message
        );

        Self::new(
            operation,
            ApiErrorKind::InternalError,
            operation.fault_message(),
        )
        .with_details(err.message.clone())
    }

    /// Attach a `details` string
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "API {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let Some(details) = &self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Response body for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Human-readable message
    pub error: String,
    /// Underlying cause, when there is one worth sending
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();

        if self.kind.is_server_error() {
            tracing::error!(
                operation = %self.operation,
                kind = %self.kind,
                details = ?self.details,
                "API error: {}", self.message
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                kind = %self.kind,
                "API error: {}", self.message
            );
        }

        let response = ApiErrorResponse {
            error: self.message,
            details: self.details,
        };

        (status, Json(response)).into_response()
    }
}
