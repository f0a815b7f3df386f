use super::super::machine::TransitionError;
use super::super::storage::StorageError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

/// Manager errors
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<redb::CommitError> for ManagerError {
    fn from(err: redb::CommitError) -> Self {
        ManagerError::Storage(err.into())
    }
}

impl From<ManagerError> for AppError {
    fn from(err: ManagerError) -> Self {
        match err {
            ManagerError::Storage(e) => {
                tracing::error!(error = %e, "Order storage error");
                AppError::storage(e.to_string())
            }
            ManagerError::OrderNotFound(id) => AppError::order_not_found(id),
            ManagerError::InvalidTable(msg) => {
                AppError::with_message(ErrorCode::InvalidTableNumber, msg)
            }
            ManagerError::Transition(e) => {
                let message = e.to_string();
                match e {
                    TransitionError::Forbidden { role, action } => {
                        AppError::with_message(ErrorCode::RoleForbidden, message)
                            .with_detail("role", role.as_str())
                            .with_detail("action", action.as_str())
                    }
                    TransitionError::InvalidTransition { from, to } => {
                        AppError::invalid_transition(message)
                            .with_detail("from", from.as_str())
                            .with_detail("to", to.as_str())
                    }
                    TransitionError::Terminal { status } => {
                        AppError::with_message(ErrorCode::OrderTerminal, message)
                            .with_detail("status", status.as_str())
                    }
                    TransitionError::ItemsLocked { status } => {
                        AppError::with_message(ErrorCode::OrderItemsLocked, message)
                            .with_detail("status", status.as_str())
                    }
                    TransitionError::InvalidItems(_) => AppError::invalid_items(message),
                    TransitionError::TableConflict(_) => {
                        AppError::with_message(ErrorCode::TableTakeoutConflict, message)
                    }
                }
            }
        }
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;
