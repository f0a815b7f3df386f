//! 认证授权模块
//!
//! - [`JwtService`] - JWT 令牌校验
//! - [`CurrentUser`] - 当前调用者，作为 axum 提取器使用
//! - [`permissions`] - 角色能力表

pub mod extractor;
pub mod jwt;
pub mod permissions;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use permissions::{Action, can, capabilities};
