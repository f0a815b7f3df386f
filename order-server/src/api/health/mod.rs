//! 健康检查路由
//!
//! # 路由列表
//!
//! | 路径 | 方法 | 说明 | 认证 |
//! |------|------|------|------|
//! | /health | GET | 简单健康检查 | 无 |
//! | /health/detailed | GET | 存储、扣减死信、后台任务、运行时间 | 无 |
//!
//! # 响应示例
//!
//! ```json
//! {
//!   "status": "ok",
//!   "version": "0.1.0"
//! }
//! ```

use std::time::Instant;

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;
use crate::core::tasks::TaskStatus;
use crate::orders::storage::StorageStats;

/// 健康检查路由 - 公共路由 (无需认证)
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/detailed", get(detailed_health))
}

/// 简单健康检查响应
#[derive(Serialize)]
pub struct HealthResponse {
    /// 状态 (ok | error)
    status: &'static str,
    /// 版本号
    version: &'static str,
}

/// 详细健康检查响应
#[derive(Serialize)]
pub struct DetailedHealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    /// 运行时间 (秒)
    uptime_seconds: u64,
    /// 各组件检查结果
    checks: HealthChecks,
}

/// 健康检查详情
#[derive(Serialize)]
pub struct HealthChecks {
    /// 订单存储检查
    storage: CheckResult,
    /// 存储计数 (检查成功时)
    #[serde(skip_serializing_if = "Option::is_none")]
    storage_stats: Option<StorageStats>,
    /// 库存扣减 (死信表为空时 ok)
    deductions: CheckResult,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dead_letters: Vec<DeadLetterSummary>,
    /// 后台任务
    background_tasks: CheckResult,
    tasks: Vec<NamedTask>,
}

/// 进入死信表的扣减，需要人工核对库存
#[derive(Serialize)]
pub struct DeadLetterSummary {
    order_id: String,
    failed_at: i64,
    last_error: String,
}

#[derive(Serialize)]
pub struct NamedTask {
    name: String,
    #[serde(flatten)]
    status: TaskStatus,
}

/// 单项检查结果
#[derive(Serialize)]
pub struct CheckResult {
    /// 状态 (ok | error)
    status: &'static str,
    /// 延迟 (毫秒)
    latency_ms: Option<u64>,
    /// 错误信息
    message: Option<String>,
}

impl CheckResult {
    fn ok() -> Self {
        Self {
            status: "ok",
            latency_ms: None,
            message: None,
        }
    }

    fn ok_with_latency(latency_ms: u64) -> Self {
        Self {
            status: "ok",
            latency_ms: Some(latency_ms),
            message: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            latency_ms: None,
            message: Some(message.into()),
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// GET /health - 简单健康检查
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /health/detailed - 详细健康检查
pub async fn detailed_health(State(state): State<ServerState>) -> Json<DetailedHealthResponse> {
    let start = Instant::now();
    let (storage, storage_stats) = match state.storage.get_stats() {
        Ok(stats) => (
            CheckResult::ok_with_latency(start.elapsed().as_millis() as u64),
            Some(stats),
        ),
        Err(e) => (CheckResult::error(e.to_string()), None),
    };

    let (deductions, dead_letters) = match state.storage.get_dead_letters() {
        Ok(entries) if entries.is_empty() => (CheckResult::ok(), Vec::new()),
        Ok(entries) => (
            CheckResult::error(format!(
                "{} stock deduction(s) gave up after retries",
                entries.len()
            )),
            entries
                .into_iter()
                .map(|e| DeadLetterSummary {
                    order_id: e.deduction.order_id,
                    failed_at: e.failed_at,
                    last_error: e.last_error,
                })
                .collect(),
        ),
        Err(e) => (CheckResult::error(e.to_string()), Vec::new()),
    };

    let failed = state.tasks.failed_count();
    let background_tasks = if failed == 0 {
        CheckResult::ok()
    } else {
        CheckResult::error(format!("{} background task(s) stopped unexpectedly", failed))
    };
    let tasks = state
        .tasks
        .snapshot()
        .into_iter()
        .map(|(name, status)| NamedTask { name, status })
        .collect();

    let status = if storage.is_ok() && deductions.is_ok() && background_tasks.is_ok() {
        "ok"
    } else {
        "degraded"
    };

    Json(DetailedHealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.uptime_seconds(),
        checks: HealthChecks {
            storage,
            storage_stats,
            deductions,
            dead_letters,
            background_tasks,
            tasks,
        },
    })
}
