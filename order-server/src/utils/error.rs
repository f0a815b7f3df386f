//! 统一错误处理
//!
//! 错误类型统一定义在 `shared::error`，服务端与客户端共用同一套错误码：
//!
//! | 范围 | 分类 | 示例 |
//! |------|------|------|
//! | 0xxx | 通用 | 2 ValidationFailed |
//! | 1xxx | 认证 | 1001 NotAuthenticated |
//! | 2xxx | 权限 | 2002 RoleForbidden |
//! | 4xxx | 订单 | 4002 InvalidTransition |
//! | 6xxx | 库存 | 6002 LedgerUnavailable |
//! | 9xxx | 系统 | 9002 StorageError |
//!
//! ```ignore
//! Err(AppError::order_not_found(id))
//! ```

pub use shared::error::{ApiResponse, AppError, ErrorCategory, ErrorCode};

pub use super::result::AppResult;
