//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`orders`] - 订单生命周期、厨房队列、服务看板
//! - [`inventory`] - 库存准入检查与库存管理
//! - [`tables`] - 服务员桌台分配

pub mod extract;

pub mod health;
pub mod inventory;
pub mod orders;
pub mod tables;

pub use extract::AppJson;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
