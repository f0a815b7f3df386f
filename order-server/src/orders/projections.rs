//! Read-only projections over the order store
//!
//! | Projection | Filter | Order |
//! |------------|--------|-------|
//! | kitchen queue | `pending` / `confirmed` / `preparing` | effective priority desc, `created_at` asc |
//! | customer tracker | single id | - |
//! | server dashboard | requested tables, non-terminal | table asc, `created_at` asc |
//! | kitchen stats | queue orders + orders completed today | - |
//!
//! Each function is pure over the snapshot it is given and keeps no state,
//! so two evaluations of the same snapshot are identical.

use shared::order::{
    KitchenQueue, KitchenQueueEntry, KitchenStats, Order, OrderStatus, OrderTracker,
    ServerDashboard, TableOrders,
};

const MINUTE_MS: i64 = 60_000;

/// Sorted kitchen queue
pub fn kitchen_queue(orders: Vec<Order>, now: i64, overdue_margin_ms: i64) -> KitchenQueue {
    let mut entries: Vec<KitchenQueueEntry> = orders
        .into_iter()
        .filter(|o| o.status.is_kitchen_active())
        .map(|order| KitchenQueueEntry {
            overdue: order.is_overdue(now, overdue_margin_ms),
            effective_priority: order.effective_priority(now, overdue_margin_ms),
            estimated_completion: order.estimated_completion(),
            elapsed_minutes: order.elapsed_minutes(now),
            order,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.effective_priority
            .cmp(&a.effective_priority)
            .then(a.order.created_at.cmp(&b.order.created_at))
            .then_with(|| a.order.id.cmp(&b.order.id))
    });

    KitchenQueue {
        entries,
        generated_at: now,
    }
}

/// Kitchen display figures
///
/// `active` is any order snapshot (non-queue orders are ignored); `completed`
/// holds the orders completed since `day_start`.
pub fn kitchen_stats(
    active: &[Order],
    completed: &[Order],
    day_start: i64,
    now: i64,
    overdue_margin_ms: i64,
) -> KitchenStats {
    let queue: Vec<&Order> = active
        .iter()
        .filter(|o| o.status.is_kitchen_active())
        .collect();
    let current_wait_minutes = queue
        .iter()
        .filter(|o| o.kitchen_started_at.is_none())
        .map(|o| o.elapsed_minutes(now))
        .max()
        .unwrap_or(0);

    let today: Vec<&Order> = completed
        .iter()
        .filter(|o| o.completed_at.is_some_and(|at| at >= day_start))
        .collect();
    // (prep minutes, ready by estimate) for orders that went through the kitchen
    let timed: Vec<(f64, bool)> = today
        .iter()
        .filter_map(|o| {
            let started = o.kitchen_started_at?;
            let ready = o.ready_at?;
            Some((
                (ready - started) as f64 / MINUTE_MS as f64,
                ready <= o.estimated_completion(),
            ))
        })
        .collect();
    let (average_prep_minutes, on_time_rate) = if timed.is_empty() {
        (None, None)
    } else {
        let n = timed.len() as f64;
        let prep = timed.iter().map(|(m, _)| m).sum::<f64>() / n;
        let on_time = timed.iter().filter(|(_, ok)| *ok).count() as f64 * 100.0 / n;
        (Some(prep), Some(on_time))
    };

    KitchenStats {
        active_orders: queue.len(),
        pending_orders: queue
            .iter()
            .filter(|o| o.status == OrderStatus::Pending)
            .count(),
        pending_items: queue.iter().map(|o| o.item_count()).sum(),
        overdue_orders: queue
            .iter()
            .filter(|o| o.is_overdue(now, overdue_margin_ms))
            .count(),
        completed_today: today.len(),
        average_prep_minutes,
        on_time_rate,
        current_wait_minutes,
        generated_at: now,
    }
}

/// Customer tracker view of one order
pub fn tracker(order: Order, now: i64) -> OrderTracker {
    OrderTracker {
        progress_percentage: order.status.progress_percentage(),
        status_message: order.status.customer_message().to_string(),
        estimated_time: estimated_time(&order, now),
        estimated_completion: order.estimated_completion(),
        order,
    }
}

/// Human readable time left for the customer tracker
pub fn estimated_time(order: &Order, now: i64) -> String {
    match order.status {
        OrderStatus::Pending => "5-10 minutes".to_string(),
        OrderStatus::Confirmed => "15-25 minutes".to_string(),
        OrderStatus::Preparing => match order.kitchen_started_at {
            Some(_) => {
                let remaining = (order.estimated_completion() - now).max(0);
                // round up so "0 minutes" only shows once the estimate has passed
                let minutes = (remaining + MINUTE_MS - 1) / MINUTE_MS;
                format!("{minutes} minutes")
            }
            None => "10-20 minutes".to_string(),
        },
        OrderStatus::Ready => "Ready now!".to_string(),
        OrderStatus::Completed => "Completed".to_string(),
        OrderStatus::Cancelled => "Cancelled".to_string(),
    }
}

/// Non-terminal orders on the given tables, grouped per table
///
/// Every requested table appears, even without orders.
pub fn server_dashboard(orders: Vec<Order>, tables: &[u32], now: i64) -> ServerDashboard {
    let mut tables: Vec<u32> = tables.to_vec();
    tables.sort_unstable();
    tables.dedup();

    let mut groups: Vec<TableOrders> = tables
        .into_iter()
        .map(|table_number| TableOrders {
            table_number,
            orders: Vec::new(),
        })
        .collect();

    for order in orders {
        if order.status.is_terminal() {
            continue;
        }
        let Some(table) = order.table_number else {
            continue;
        };
        if let Ok(idx) = groups.binary_search_by_key(&table, |g| g.table_number) {
            groups[idx].orders.push(order);
        }
    }
    for group in &mut groups {
        group
            .orders
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    }

    ServerDashboard {
        tables: groups,
        generated_at: now,
    }
}

/// Parse a `tables=1,2,3` query value
pub fn parse_tables(raw: &str) -> Result<Vec<u32>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<u32>() {
            Ok(0) | Err(_) => Err(format!("invalid table number '{s}'")),
            Ok(n) => Ok(n),
        })
        .collect()
}
