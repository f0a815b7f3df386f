//! 后台任务管理
//!
//! 统一管理后台任务的注册、启动和关闭。
//!
//! | 任务 | 类型 | 说明 |
//! |------|------|------|
//! | `deduction_worker` | [`TaskKind::Worker`] | 库存扣减队列处理 |
//! | `overdue_sweep` | [`TaskKind::Periodic`] | 超时订单优先级提升 |

use dashmap::DashMap;
use futures::FutureExt;
use serde::Serialize;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 任务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// 长期后台工作者
    Worker,
    /// 定时任务
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Worker => write!(f, "Worker"),
            TaskKind::Periodic => write!(f, "Periodic"),
        }
    }
}

/// 任务运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Running,
    /// 收到关闭信号后正常退出
    Stopped,
    /// 未收到关闭信号就退出了
    Exited,
    Panicked,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskStatus {
    pub kind: TaskKind,
    pub state: TaskState,
    pub started_at: i64,
}

/// 任务状态表，供健康检查读取
#[derive(Debug, Clone, Default)]
pub struct TaskMonitor {
    states: Arc<DashMap<&'static str, TaskStatus>>,
}

impl TaskMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(&self, name: &'static str, kind: TaskKind, state: TaskState) {
        self.states
            .entry(name)
            .and_modify(|s| s.state = state)
            .or_insert_with(|| TaskStatus {
                kind,
                state,
                started_at: shared::util::now_millis(),
            });
    }

    /// 所有任务状态 (按名称排序)
    pub fn snapshot(&self) -> Vec<(String, TaskStatus)> {
        let mut all: Vec<(String, TaskStatus)> = self
            .states
            .iter()
            .map(|e| (e.key().to_string(), e.value().clone()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }

    /// 异常退出的任务数量
    pub fn failed_count(&self) -> usize {
        self.states
            .iter()
            .filter(|e| matches!(e.value().state, TaskState::Exited | TaskState::Panicked))
            .count()
    }
}

struct RegisteredTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// 后台任务管理器
///
/// ```ignore
/// let mut tasks = BackgroundTasks::new(state.tasks.clone());
/// let token = tasks.shutdown_token();
/// tasks.spawn("deduction_worker", TaskKind::Worker, async move {
///     worker.run(token).await;
/// });
/// tasks.shutdown(Duration::from_secs(10)).await;
/// ```
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
    monitor: TaskMonitor,
}

impl BackgroundTasks {
    pub fn new(monitor: TaskMonitor) -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
            monitor,
        }
    }

    /// 获取取消令牌（任务内部监听 shutdown 信号）
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 注册并启动一个后台任务
    ///
    /// 任务会被包装以捕获 panic，退出状态写入 [`TaskMonitor`]。
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let monitor = self.monitor.clone();
        let token = self.shutdown.clone();
        monitor.set(name, kind, TaskState::Running);

        let wrapped_future = async move {
            let result = AssertUnwindSafe(future).catch_unwind().await;
            match result {
                Ok(()) if token.is_cancelled() => {
                    monitor.set(name, kind, TaskState::Stopped);
                }
                Ok(()) => {
                    tracing::warn!(task = %name, kind = %kind, "Background task completed unexpectedly");
                    monitor.set(name, kind, TaskState::Exited);
                }
                Err(panic_info) => {
                    let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    tracing::error!(
                        task = %name,
                        kind = %kind,
                        panic = %panic_msg,
                        "Background task panicked"
                    );
                    monitor.set(name, kind, TaskState::Panicked);
                }
            }
        };

        let handle = tokio::spawn(wrapped_future);
        tracing::debug!(task = %name, kind = %kind, "Registered background task");
        self.tasks.push(RegisteredTask { name, handle });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn log_summary(&self) {
        let names: Vec<&str> = self.tasks.iter().map(|t| t.name).collect();
        tracing::info!(count = self.tasks.len(), tasks = ?names, "Background tasks registered");
    }

    /// Graceful shutdown - 取消所有任务并等待完成，超时后中止
    pub async fn shutdown(self, timeout: Duration) {
        tracing::info!("Shutting down {} background tasks...", self.tasks.len());
        self.shutdown.cancel();

        for task in self.tasks {
            let abort = task.handle.abort_handle();
            match tokio::time::timeout(timeout, task.handle).await {
                Ok(Ok(())) => tracing::debug!(task = %task.name, "Task completed"),
                Ok(Err(e)) => tracing::error!(task = %task.name, error = ?e, "Task failed"),
                Err(_) => {
                    tracing::warn!(task = %task.name, "Task did not stop in time, aborting");
                    abort.abort();
                }
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_task_reports_stopped() {
        let monitor = TaskMonitor::new();
        let mut tasks = BackgroundTasks::new(monitor.clone());
        let token = tasks.shutdown_token();
        tasks.spawn("waiter", TaskKind::Worker, async move {
            token.cancelled().await;
        });
        assert_eq!(tasks.len(), 1);

        tasks.shutdown(Duration::from_secs(1)).await;
        let snapshot = monitor.snapshot();
        assert_eq!(snapshot[0].1.state, TaskState::Stopped);
        assert_eq!(monitor.failed_count(), 0);
    }

    #[tokio::test]
    async fn test_panicking_task_is_recorded() {
        let monitor = TaskMonitor::new();
        let mut tasks = BackgroundTasks::new(monitor.clone());
        tasks.spawn("boom", TaskKind::Periodic, async {
            panic!("boom");
        });

        for _ in 0..50 {
            if monitor.failed_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(monitor.failed_count(), 1);
        tasks.shutdown(Duration::from_secs(1)).await;
    }
}
