//! Unified error codes for the ordering platform
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 6xxx: Inventory errors
//! - 7xxx: Table errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Serialized as a bare `u16` so clients in any language can match on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Request body is well-formed JSON but does not match the expected shape
    UnprocessableBody = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Role lacks the capability for an order transition
    RoleForbidden = 2002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Target status is not a direct successor of the current status
    InvalidTransition = 4002,
    /// Order is completed or cancelled
    OrderTerminal = 4003,
    /// Items are locked once preparation starts
    OrderItemsLocked = 4004,
    /// Item list is empty or malformed
    InvalidOrderItems = 4005,
    /// Takeout flag and table number disagree
    TableTakeoutConflict = 4006,

    // ==================== 6xxx: Inventory ====================
    /// Inventory item not found
    InventoryItemNotFound = 6001,
    /// Inventory oracle unreachable
    LedgerUnavailable = 6002,

    // ==================== 7xxx: Table ====================
    /// Invalid table number
    InvalidTableNumber = 7001,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Storage error
    StorageError = 9002,
    /// Configuration error
    ConfigError = 9003,
    /// Network error
    NetworkError = 9004,
    /// Timeout
    TimeoutError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::UnprocessableBody => "Request body does not match the expected shape",
            ErrorCode::InvalidRequest => "Invalid request",

            ErrorCode::NotAuthenticated => "Authentication required",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",

            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleForbidden => "Role is not allowed to perform this action",

            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::InvalidTransition => "Invalid status transition",
            ErrorCode::OrderTerminal => "Order is already completed or cancelled",
            ErrorCode::OrderItemsLocked => "Order items can no longer be changed",
            ErrorCode::InvalidOrderItems => "Order items are invalid",
            ErrorCode::TableTakeoutConflict => {
                "An order is either takeout or seated at a table, not both"
            }

            ErrorCode::InventoryItemNotFound => "Inventory item not found",
            ErrorCode::LedgerUnavailable => "Inventory ledger is unavailable",

            ErrorCode::InvalidTableNumber => "Invalid table number",

            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StorageError => "Storage error",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::UnprocessableBody),
            5 => Ok(ErrorCode::InvalidRequest),

            1001 => Ok(ErrorCode::NotAuthenticated),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleForbidden),

            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::InvalidTransition),
            4003 => Ok(ErrorCode::OrderTerminal),
            4004 => Ok(ErrorCode::OrderItemsLocked),
            4005 => Ok(ErrorCode::InvalidOrderItems),
            4006 => Ok(ErrorCode::TableTakeoutConflict),

            6001 => Ok(ErrorCode::InventoryItemNotFound),
            6002 => Ok(ErrorCode::LedgerUnavailable),

            7001 => Ok(ErrorCode::InvalidTableNumber),

            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StorageError),
            9003 => Ok(ErrorCode::ConfigError),
            9004 => Ok(ErrorCode::NetworkError),
            9005 => Ok(ErrorCode::TimeoutError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
