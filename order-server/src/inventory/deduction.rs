//! Deduction worker - 库存扣减队列处理
//!
//! 订单创建时在同一事务中写入 `pending_deductions`，本 worker 负责把扣减
//! 应用到库存账本。扣减失败不会回滚订单，只会重试：
//!
//! - 每行单独记录 `applied`，重试时跳过已扣减的行
//! - 指数退避: `base * 2^retry_count`，上限 [`RETRY_MAX_DELAY_SECS`]
//! - 超过最大重试次数后移入死信表，启动时恢复到待处理队列
//!
//! Note: redb operations are synchronous.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::ledger::{InventoryLedger, LedgerError};
use crate::core::DeductionConfig;
use crate::orders::storage::{OrderStorage, PendingDeduction};

const RETRY_BASE_DELAY_SECS: u64 = 5;
const RETRY_MAX_DELAY_SECS: u64 = 300;

/// Result of one processing attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Completed,
    Failed,
    DeadLettered,
    Skipped,
}

pub struct DeductionWorker {
    storage: OrderStorage,
    ledger: Arc<dyn InventoryLedger>,
    config: DeductionConfig,
}

impl DeductionWorker {
    pub fn new(
        storage: OrderStorage,
        ledger: Arc<dyn InventoryLedger>,
        config: DeductionConfig,
    ) -> Self {
        Self {
            storage,
            ledger,
            config,
        }
    }

    /// Run until the shutdown token is cancelled
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(
            scan_secs = self.config.retry_secs,
            max_retries = self.config.max_retries,
            "DeductionWorker started"
        );

        // Recover dead letter entries (previously failed deductions) back to pending queue
        match self.storage.recover_dead_letters() {
            Ok(0) => {}
            Ok(n) => tracing::info!(count = n, "Recovered dead letter deductions to pending queue"),
            Err(e) => tracing::error!(error = %e, "Failed to recover dead letter deductions"),
        }

        let mut scan_interval =
            tokio::time::interval(Duration::from_secs(self.config.retry_secs.max(1)));

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!("DeductionWorker stopped");
                    break;
                }
                _ = scan_interval.tick() => {
                    self.process_pending_queue(shared::util::now_millis()).await;
                }
            }
        }
    }

    /// Process every queued deduction that is due
    pub async fn process_pending_queue(&self, now: i64) -> Vec<Attempt> {
        let pending = match self.storage.get_pending_deductions() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "Failed to get pending deductions");
                return Vec::new();
            }
        };

        if pending.is_empty() {
            return Vec::new();
        }
        tracing::debug!(count = pending.len(), "Processing pending deduction queue");

        let mut attempts = Vec::with_capacity(pending.len());
        for entry in pending {
            attempts.push(self.process_entry(entry, now).await);
        }
        attempts
    }

    /// Whether the backoff window of a failed entry has passed
    fn is_due(&self, entry: &PendingDeduction, now: i64) -> bool {
        let Some(last_attempt) = entry.last_attempt_at else {
            return true;
        };
        // Exponential backoff: delay = base * 2^retry_count, capped at max
        let delay_secs = RETRY_BASE_DELAY_SECS
            .saturating_mul(2u64.saturating_pow(entry.retry_count))
            .min(RETRY_MAX_DELAY_SECS);
        now >= last_attempt + (delay_secs as i64 * 1000)
    }

    async fn process_entry(&self, mut entry: PendingDeduction, now: i64) -> Attempt {
        if entry.retry_count >= self.config.max_retries {
            let error = entry.last_error.clone().unwrap_or_else(|| "Unknown error".to_string());
            tracing::error!(
                deduction_id = %entry.deduction_id,
                order_id = %entry.order_id,
                retry_count = entry.retry_count,
                last_error = %error,
                "Max retry count exceeded, moving to dead letter queue"
            );
            if let Err(e) = self.storage.move_to_dead_letter(&entry, &error) {
                tracing::error!(deduction_id = %entry.deduction_id, error = %e, "Failed to move deduction to dead letter queue");
            }
            return Attempt::DeadLettered;
        }
        if !self.is_due(&entry, now) {
            return Attempt::Skipped;
        }

        let mut last_error = None;
        for line in entry.lines.iter_mut().filter(|l| !l.applied) {
            match self.ledger.deduct(&line.menu_item_id, line.quantity).await {
                Ok(level) => {
                    line.applied = true;
                    tracing::debug!(
                        order_id = %entry.order_id,
                        menu_item_id = %line.menu_item_id,
                        quantity = line.quantity,
                        on_hand = level.on_hand,
                        "Stock deducted"
                    );
                }
                // not tracked by the ledger, nothing to deduct
                Err(LedgerError::UnknownItem(id)) => {
                    line.applied = true;
                    tracing::warn!(order_id = %entry.order_id, menu_item_id = %id, "Deduction skipped for untracked item");
                }
                Err(e) => {
                    tracing::warn!(
                        order_id = %entry.order_id,
                        menu_item_id = %line.menu_item_id,
                        error = %e,
                        "Stock deduction failed"
                    );
                    last_error = Some(e.to_string());
                }
            }
        }

        match last_error {
            None => {
                if let Err(e) = self.storage.complete_deduction(&entry.deduction_id) {
                    tracing::error!(deduction_id = %entry.deduction_id, error = %e, "Failed to complete deduction");
                    return Attempt::Failed;
                }
                tracing::info!(order_id = %entry.order_id, lines = entry.lines.len(), "Deduction applied");
                Attempt::Completed
            }
            Some(error) => {
                entry.retry_count += 1;
                entry.last_error = Some(error);
                entry.last_attempt_at = Some(now);
                if let Err(e) = self.storage.update_pending_deduction(&entry) {
                    tracing::error!(deduction_id = %entry.deduction_id, error = %e, "Failed to record deduction failure");
                }
                Attempt::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::ledger::{LedgerResult, StockLedger};
    use async_trait::async_trait;
    use shared::inventory::{StockLevel, StockUpdate};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Wraps a real ledger and fails one item while `broken` is set
    struct FlakyLedger {
        inner: StockLedger,
        broken_item: &'static str,
        broken: AtomicBool,
    }

    #[async_trait]
    impl InventoryLedger for FlakyLedger {
        async fn stock_level(&self, menu_item_id: &str) -> LedgerResult<StockLevel> {
            self.inner.stock_level(menu_item_id).await
        }

        async fn deduct(&self, menu_item_id: &str, quantity: u32) -> LedgerResult<StockLevel> {
            if menu_item_id == self.broken_item && self.broken.load(Ordering::SeqCst) {
                return Err(LedgerError::Unreachable("ledger offline".into()));
            }
            self.inner.deduct(menu_item_id, quantity).await
        }
    }

    fn setup(broken: bool) -> (OrderStorage, StockLedger, Arc<FlakyLedger>) {
        let storage = OrderStorage::open_in_memory().unwrap();
        let stock = StockLedger::new(storage.database()).unwrap();
        for (id, on_hand) in [("fries", 10), ("cola", 10)] {
            stock
                .set_level(
                    id,
                    StockUpdate {
                        name: id.to_string(),
                        on_hand,
                        low_stock_threshold: 2,
                    },
                )
                .unwrap();
        }
        let flaky = Arc::new(FlakyLedger {
            inner: stock.clone(),
            broken_item: "cola",
            broken: AtomicBool::new(broken),
        });
        (storage, stock, flaky)
    }

    fn enqueue(storage: &OrderStorage, items: Vec<(&str, u32)>) {
        let deduction = PendingDeduction::new(
            "order-1",
            items.into_iter().map(|(id, q)| (id.to_string(), q)),
        );
        let txn = storage.begin_write().unwrap();
        storage.queue_deduction_txn(&txn, &deduction).unwrap();
        txn.commit().unwrap();
    }

    fn config(max_retries: u32) -> DeductionConfig {
        DeductionConfig {
            retry_secs: 1,
            max_retries,
        }
    }

    #[tokio::test]
    async fn test_applies_and_completes() {
        let (storage, stock, ledger) = setup(false);
        enqueue(&storage, vec![("fries", 2), ("cola", 1), ("mystery", 1)]);
        let worker = DeductionWorker::new(storage.clone(), ledger, config(3));

        assert_eq!(worker.process_pending_queue(0).await, vec![Attempt::Completed]);
        assert!(storage.get_pending_deductions().unwrap().is_empty());
        assert_eq!(stock.get_level("fries").unwrap().unwrap().on_hand, 8);
        assert_eq!(stock.get_level("cola").unwrap().unwrap().on_hand, 9);
    }

    #[tokio::test]
    async fn test_partial_failure_never_double_applies() {
        let (storage, stock, ledger) = setup(true);
        enqueue(&storage, vec![("fries", 2), ("cola", 1)]);
        let worker = DeductionWorker::new(storage.clone(), ledger.clone(), config(5));

        assert_eq!(worker.process_pending_queue(0).await, vec![Attempt::Failed]);
        let pending = storage.get_pending_deductions().unwrap();
        assert_eq!(pending[0].retry_count, 1);
        assert!(pending[0].lines[0].applied);
        assert!(!pending[0].lines[1].applied);

        // still inside the backoff window
        assert_eq!(worker.process_pending_queue(1_000).await, vec![Attempt::Skipped]);

        ledger.broken.store(false, Ordering::SeqCst);
        assert_eq!(
            worker.process_pending_queue(60_000).await,
            vec![Attempt::Completed]
        );
        assert_eq!(stock.get_level("fries").unwrap().unwrap().on_hand, 8);
        assert_eq!(stock.get_level("cola").unwrap().unwrap().on_hand, 9);
    }

    #[tokio::test]
    async fn test_exhausted_retries_go_to_dead_letter_and_recover() {
        let (storage, _stock, ledger) = setup(true);
        enqueue(&storage, vec![("cola", 1)]);
        let worker = DeductionWorker::new(storage.clone(), ledger, config(1));

        assert_eq!(worker.process_pending_queue(0).await, vec![Attempt::Failed]);
        assert_eq!(
            worker.process_pending_queue(3_600_000).await,
            vec![Attempt::DeadLettered]
        );
        assert!(storage.get_pending_deductions().unwrap().is_empty());
        assert_eq!(storage.get_dead_letters().unwrap().len(), 1);

        assert_eq!(storage.recover_dead_letters().unwrap(), 1);
        assert_eq!(storage.get_pending_deductions().unwrap().len(), 1);
    }
}
