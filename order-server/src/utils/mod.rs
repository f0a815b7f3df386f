//! 工具模块 - 通用工具函数和类型
//!
//! # 内容
//!
//! - [`AppError`] - 应用错误类型 (from shared::error)
//! - [`ApiResponse`] - API 响应结构 (from shared::error)
//! - [`logger`] - 日志初始化

pub mod error;
pub mod logger;
pub mod result;

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
