//! Overdue sweep - 超时订单优先级巡检
//!
//! 定期把已超时的活跃订单持久化提升到至少 `high`，
//! 使存储中的优先级无需等待下一次状态变更即可收敛。

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::OrdersManager;

pub struct OverdueSweep {
    manager: Arc<OrdersManager>,
    interval: Duration,
}

impl OverdueSweep {
    pub fn new(manager: Arc<OrdersManager>) -> Self {
        let secs = manager.timing().overdue_sweep_secs.max(1);
        Self {
            manager,
            interval: Duration::from_secs(secs),
        }
    }

    /// Run until the shutdown token is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Overdue sweep started");
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("Overdue sweep stopped");
                    break;
                }
                _ = ticker.tick() => self.sweep_once(),
            }
        }
    }

    fn sweep_once(&self) {
        match self.manager.promote_overdue(shared::util::now_millis()) {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "Promoted overdue orders"),
            Err(e) => tracing::error!(error = %e, "Overdue sweep failed"),
        }
    }
}
