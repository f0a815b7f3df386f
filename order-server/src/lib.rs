//! Order Server - 餐厅订单生命周期引擎
//!
//! # 架构概述
//!
//! - **订单** (`orders`): 状态机、redb 存储、唯一写入者 `OrdersManager`、投影
//! - **库存** (`inventory`): 准入检查、库存表、后台扣减 worker
//! - **认证** (`auth`): JWT 校验与角色能力表
//! - **HTTP API** (`api`): RESTful 接口
//!
//! # 模块结构
//!
//! ```text
//! order-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── auth/          # JWT 认证、能力表
//! ├── orders/        # 状态机、存储、投影、超时巡检
//! ├── inventory/     # 准入、库存表、扣减队列
//! ├── api/           # HTTP 路由和处理器
//! ├── routes/        # 中间件组装
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod inventory;
pub mod orders;
pub mod routes;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{OrderStorage, OrdersManager};
pub use routes::{OneshotRouter, build_app};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 设置运行环境
///
/// 1. 加载 `.env` (如果存在)
/// 2. 读取配置
/// 3. 创建工作目录结构
/// 4. 初始化日志 (写入 work_dir/logs)
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_dir = config.log_dir();
    init_logger_with_file(
        Some(config.log_level.as_str()),
        config.log_json,
        config.is_production().then_some(log_dir.as_path()),
    );
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
   ____          __
  / __ \_______/ /__  _____
 / / / / ___/ __  / _ \/ ___/
/ /_/ / /  / /_/ /  __/ /
\____/_/   \__,_/\___/_/
    "#
    );
}
