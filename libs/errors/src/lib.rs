//! Unified error handling for FluxGrid services
//!
//! This module provides one error system shared by every crate in the
//! workspace, eliminating the need for service-specific error types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[cfg(feature = "axum-support")]
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

// ============================================================================
// ErrorInfo - API error response type
// ============================================================================

/// Standard error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code (HTTP status or custom)
    pub code: u16,
    /// Error message
    pub message: String,
    /// Detailed error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Field-specific errors for validation
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub field_errors: HashMap<String, Vec<String>>,
}

impl ErrorInfo {
    /// Create a new ErrorInfo with just a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: 500,
            message: message.into(),
            details: None,
            field_errors: HashMap::new(),
        }
    }

    /// Set the error code
    pub fn with_code(mut self, code: u16) -> Self {
        self.code = code;
        self
    }

    /// Add details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Add a field error
    pub fn add_field_error(mut self, field: impl Into<String>, error: impl Into<String>) -> Self {
        self.field_errors
            .entry(field.into())
            .or_default()
            .push(error.into());
        self
    }
}

// ============================================================================
// FluxGridError - Main error type
// ============================================================================

/// Main error type for all FluxGrid services
#[derive(Debug, Error)]
pub enum FluxGridError {
    // ======================================
    // Configuration Errors
    // ======================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid configuration: {field}: {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingConfig(String),

    // ======================================
    // Registry & Lookup Errors
    // ======================================
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Failed to parse {field}: {value:?}")]
    Parse { field: String, value: String },

    // ======================================
    // Synchronization Errors
    // ======================================
    #[error("Busy: {0}")]
    Busy(String),

    #[error("Timeout waiting for {0}")]
    Timeout(String),

    // ======================================
    // Serialization & IO Errors
    // ======================================
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ======================================
    // Catch-all
    // ======================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FluxGridError {
    /// Create a NotFound error for a named resource
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Create a Parse error recording the offending field and raw text
    pub fn parse(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Parse {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status code this error maps to
    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Parse { .. } | Self::InvalidConfig { .. } => 400,
            Self::Busy(_) => 409,
            Self::Timeout(_) => 504,
            Self::Configuration(_)
            | Self::MissingConfig(_)
            | Self::Serialization(_)
            | Self::Io(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Convert into the API error payload
    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo::new(self.to_string()).with_code(self.http_status())
    }
}

impl From<figment::Error> for FluxGridError {
    fn from(err: figment::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Result alias used throughout the workspace
pub type Result<T> = std::result::Result<T, FluxGridError>;

// ============================================================================
// Standard API Response Models
// ============================================================================

/// Standard success response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    /// Success indicator (always true)
    #[serde(default = "bool_true")]
    pub success: bool,
    /// Response data
    pub data: T,
    /// Additional metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl<T> SuccessResponse<T> {
    /// Create a new success response
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            metadata: HashMap::new(),
        }
    }

    /// Add metadata to the response
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Standard error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Success indicator (always false for errors)
    #[serde(default = "bool_false")]
    pub success: bool,
    /// Error information
    pub error: ErrorInfo,
}

fn bool_true() -> bool {
    true
}

fn bool_false() -> bool {
    false
}

// ============================================================================
// AppError - HTTP Error with proper status codes
// ============================================================================

/// Application error with HTTP status code
///
/// Implements IntoResponse for seamless integration with axum handlers.
#[cfg(feature = "axum-support")]
#[derive(Debug, Clone)]
pub struct AppError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error information
    pub error: ErrorInfo,
}

#[cfg(feature = "axum-support")]
impl AppError {
    /// Create a new error
    pub fn new(status: StatusCode, error: ErrorInfo) -> Self {
        Self { status, error }
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ErrorInfo::new(message).with_code(400),
        }
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: ErrorInfo::new(message).with_code(404),
        }
    }

    /// Create a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CONFLICT,
            error: ErrorInfo::new(message).with_code(409),
        }
    }

    /// Create a 500 Internal Server Error
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ErrorInfo::new(message).with_code(500),
        }
    }

    /// Add details to the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.error = self.error.with_details(details);
        self
    }
}

#[cfg(feature = "axum-support")]
impl From<FluxGridError> for AppError {
    fn from(err: FluxGridError) -> Self {
        let status = StatusCode::from_u16(err.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            error: err.to_error_info(),
        }
    }
}

#[cfg(feature = "axum-support")]
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                success: false,
                error: self.error,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_mapping() {
        assert_eq!(FluxGridError::not_found("point solar").http_status(), 404);
        assert_eq!(FluxGridError::parse("address", "abc").http_status(), 400);
        assert_eq!(FluxGridError::Busy("sync".into()).http_status(), 409);
        assert_eq!(FluxGridError::Timeout("apply".into()).http_status(), 504);
        assert_eq!(FluxGridError::Internal("boom".into()).http_status(), 500);
    }

    #[test]
    fn error_info_carries_code_and_message() {
        let info = FluxGridError::not_found("connection conn-rtu").to_error_info();
        assert_eq!(info.code, 404);
        assert!(info.message.contains("conn-rtu"));
    }

    #[test]
    fn error_info_serializes_without_empty_fields() {
        let info = ErrorInfo::new("bad input").with_code(400);
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["code"], 400);
        assert!(json.get("details").is_none());
        assert!(json.get("field_errors").is_none());
    }
}
