//! Inventory admission - 下单前库存准入检查
//!
//! 结果仅供参考，从不阻止下单：
//!
//! | 情况 | 结果 |
//! |------|------|
//! | 单个商品查询失败 | 该商品标记为不可用，其余商品照常检查 |
//! | 全部查询因账本不可达失败 | 降级为"有货、无延迟" |
//! | 整体检查超时 | 降级为"有货、无延迟" |
//!
//! 检查从不修改库存，扣减由 [`super::deduction`] 在订单创建后异步完成。

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use shared::inventory::{DelayEstimate, InventoryCheckResult, ItemRequest, StockLevel};

use super::ledger::{InventoryLedger, LedgerError};
use crate::core::AdmissionConfig;

/// Admission result plus whether it was degraded to optimistic defaults
#[derive(Debug, Clone, PartialEq)]
pub struct AdmissionOutcome {
    pub result: InventoryCheckResult,
    pub degraded: bool,
}

impl AdmissionOutcome {
    fn degraded() -> Self {
        Self {
            result: InventoryCheckResult::assume_available(),
            degraded: true,
        }
    }
}

/// Per-line outcome of a ledger lookup
enum LineCheck {
    Ok { name: String, low_stock: bool, short: bool },
    Failed { menu_item_id: String, error: LedgerError },
}

#[derive(Clone)]
pub struct Admission {
    ledger: Arc<dyn InventoryLedger>,
    config: AdmissionConfig,
}

impl std::fmt::Debug for Admission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Admission")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Admission {
    pub fn new(ledger: Arc<dyn InventoryLedger>, config: AdmissionConfig) -> Self {
        Self { ledger, config }
    }

    /// Check availability of `items` given the current kitchen load
    pub async fn check(&self, items: &[ItemRequest], kitchen_load: usize) -> AdmissionOutcome {
        let lines = aggregate(items);
        let timeout = Duration::from_millis(self.config.timeout_ms);

        let lookups = join_all(lines.iter().map(|line| self.check_line(line)));
        let checks = match tokio::time::timeout(timeout, lookups).await {
            Ok(checks) => checks,
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.config.timeout_ms,
                    lines = lines.len(),
                    "Admission check timed out, assuming available"
                );
                return AdmissionOutcome::degraded();
            }
        };

        let all_unreachable = !checks.is_empty()
            && checks.iter().all(|c| {
                matches!(c, LineCheck::Failed { error, .. } if error.is_unreachable())
            });
        if all_unreachable {
            tracing::warn!(lines = checks.len(), "Inventory ledger unreachable, assuming available");
            return AdmissionOutcome::degraded();
        }

        let mut result = InventoryCheckResult {
            available: true,
            unavailable_items: Vec::new(),
            low_stock_warnings: Vec::new(),
            estimated_delay_minutes: 0,
            delay_reason: String::new(),
        };
        for check in checks {
            match check {
                LineCheck::Ok {
                    name,
                    low_stock,
                    short,
                } => {
                    if short {
                        result.available = false;
                        result.unavailable_items.push(name);
                    } else if low_stock {
                        result.low_stock_warnings.push(name);
                    }
                }
                LineCheck::Failed {
                    menu_item_id,
                    error,
                } => {
                    tracing::debug!(menu_item_id = %menu_item_id, error = %error, "Admission lookup failed");
                    result.available = false;
                    result.unavailable_items.push(menu_item_id);
                }
            }
        }

        let delay = self.delay_for(kitchen_load, &result.low_stock_warnings);
        result.estimated_delay_minutes = delay.estimated_delay_minutes;
        result.delay_reason = delay.delay_reason;

        AdmissionOutcome {
            result,
            degraded: false,
        }
    }

    /// Delay estimate only; degrades to zero delay like [`Self::check`]
    pub async fn estimate_delay(&self, items: &[ItemRequest], kitchen_load: usize) -> (DelayEstimate, bool) {
        let outcome = self.check(items, kitchen_load).await;
        (
            DelayEstimate {
                estimated_delay_minutes: outcome.result.estimated_delay_minutes,
                delay_reason: outcome.result.delay_reason,
            },
            outcome.degraded,
        )
    }

    async fn check_line(&self, line: &ItemRequest) -> LineCheck {
        match self.ledger.stock_level(&line.menu_item_id).await {
            Ok(level) => classify(&level, line.quantity),
            Err(error) => LineCheck::Failed {
                menu_item_id: line.menu_item_id.clone(),
                error,
            },
        }
    }

    /// Kitchen load over capacity plus restock time for low-stock lines
    fn delay_for(&self, kitchen_load: usize, low_stock: &[String]) -> DelayEstimate {
        let capacity = self.config.kitchen_capacity as usize;
        let over = u32::try_from(kitchen_load.saturating_sub(capacity)).unwrap_or(u32::MAX);
        let load_delay = over.saturating_mul(self.config.load_delay_per_order_minutes);
        let restock_count = u32::try_from(low_stock.len()).unwrap_or(u32::MAX);
        let restock_delay = restock_count.saturating_mul(self.config.restock_delay_minutes);

        let mut reasons = Vec::new();
        if load_delay > 0 {
            reasons.push(format!("High kitchen volume ({kitchen_load} active orders)"));
        }
        if restock_delay > 0 {
            reasons.push(format!("Restocking low items: {}", low_stock.join(", ")));
        }

        DelayEstimate {
            estimated_delay_minutes: load_delay.saturating_add(restock_delay),
            delay_reason: reasons.join("; "),
        }
    }
}

fn classify(level: &StockLevel, quantity: u32) -> LineCheck {
    let short = quantity > level.on_hand;
    let low_stock = !short && level.on_hand - quantity <= level.low_stock_threshold;
    LineCheck::Ok {
        name: level.name.clone(),
        low_stock,
        short,
    }
}

/// Merge duplicate menu items, keeping first-seen order
fn aggregate(items: &[ItemRequest]) -> Vec<ItemRequest> {
    let mut lines: Vec<ItemRequest> = Vec::new();
    for item in items {
        match lines.iter_mut().find(|l| l.menu_item_id == item.menu_item_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(item.quantity),
            None => lines.push(item.clone()),
        }
    }
    lines
}
