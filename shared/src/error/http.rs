//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            // 404 Not Found
            Self::NotFound | Self::OrderNotFound | Self::InventoryItemNotFound => {
                StatusCode::NOT_FOUND
            }

            // 409 Conflict: the order is not in a state that allows the action
            Self::InvalidTransition | Self::OrderTerminal | Self::OrderItemsLocked => {
                StatusCode::CONFLICT
            }

            // 401 Unauthorized
            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }

            // 403 Forbidden
            Self::PermissionDenied | Self::RoleForbidden => StatusCode::FORBIDDEN,

            // 422 Unprocessable Entity
            Self::UnprocessableBody
            | Self::InvalidOrderItems
            | Self::TableTakeoutConflict
            | Self::InvalidTableNumber => {
                StatusCode::UNPROCESSABLE_ENTITY
            }

            // 503 Service Unavailable (transient errors, client can retry)
            Self::LedgerUnavailable | Self::NetworkError | Self::TimeoutError => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            Self::Unknown | Self::InternalError | Self::StorageError | Self::ConfigError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            Self::ValidationFailed | Self::InvalidRequest => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_errors() {
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::InvalidTransition.http_status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::OrderTerminal.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::InvalidOrderItems.http_status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_auth_and_permission() {
        assert_eq!(ErrorCode::RoleForbidden.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ErrorCode::TokenExpired.http_status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_transient_and_internal() {
        assert_eq!(
            ErrorCode::LedgerUnavailable.http_status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ErrorCode::StorageError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorCode::ValidationFailed.http_status(),
            StatusCode::BAD_REQUEST
        );
    }
}
