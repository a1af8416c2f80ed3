//! Error types for the MCP bridge.
//!
//! Every request-path failure is rendered as the uniform JSON error envelope
//! `{ "error": ..., "details"?: ... }`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

/// Main error type for the bridge.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Requested tool name is not in the registry.
    #[error("Unknown tool {0}")]
    UnknownTool(String),

    /// Tool is declared but has no backend route.
    #[error("Unsupported tool: {0}")]
    UnsupportedTool(String),

    /// Request body is not valid JSON.
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    /// Payload violates the tool's input schema (only when validation is enabled).
    #[error("Invalid input for tool {tool}: {details}")]
    InvalidInput { tool: String, details: String },

    /// Backend unreachable, timed out, or returned a non-JSON body.
    #[error("Mule call failed: {0}")]
    BackendUnavailable(String),

    /// Configuration errors (invalid base URL, tools file, schema)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Failure half of the invocation envelope.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl BridgeError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::UnknownTool(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedTool(_) | Self::InvalidBody(_) | Self::InvalidInput { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::BackendUnavailable(_) | Self::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn envelope(&self) -> ErrorEnvelope {
        let (error, details) = match self {
            Self::UnknownTool(name) => (format!("Unknown tool {name}"), None),
            Self::UnsupportedTool(_) => ("Unsupported tool".to_string(), None),
            Self::InvalidBody(msg) => ("Invalid JSON body".to_string(), Some(msg.clone())),
            Self::InvalidInput { tool, details } => (
                format!("Invalid input for tool {tool}"),
                Some(details.clone()),
            ),
            Self::BackendUnavailable(msg) => ("Mule call failed".to_string(), Some(msg.clone())),
            Self::Config(msg) => ("Configuration error".to_string(), Some(msg.clone())),
        };
        ErrorEnvelope { error, details }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.envelope())).into_response()
    }
}

impl From<serde_yaml::Error> for BridgeError {
    fn from(value: serde_yaml::Error) -> Self {
        Self::Config(value.to_string())
    }
}
