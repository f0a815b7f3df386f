//! Client error types

use std::collections::HashMap;

use serde_json::Value;
use shared::error::ErrorCode;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope
    #[error("API error {status} ({code:?}): {message}")]
    Api {
        status: u16,
        code: Option<ErrorCode>,
        message: String,
        details: Option<HashMap<String, Value>>,
    },

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session persistence failed
    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status of an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            ClientError::Api { code, .. } => *code,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Rejected state change (409)
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
