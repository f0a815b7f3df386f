//! OrdersManager - the single writer of the order store
//!
//! Every mutation runs inside one redb write transaction:
//!
//! ```text
//! mutate(order_id, op)
//!     ├─ 1. Begin write transaction (writers are serialized)
//!     ├─ 2. Load the current order
//!     ├─ 3. Validate + apply via the state machine
//!     ├─ 4. Persist order (and any stock deduction)
//!     └─ 5. Commit; on any error the transaction is dropped untouched
//! ```

mod error;
pub use error::*;

use super::machine::{self, Actor, Estimates};
use super::storage::{OrderStorage, PendingDeduction};
use crate::auth::permissions::{self, Action};
use crate::core::OrderTimingConfig;
use redb::WriteTransaction;
use shared::models::Role;
use shared::order::{
    Order, OrderItem, OrderStatus, PlaceOrderRequest, Priority, TableAssignment,
};
use shared::util::{day_key, now_millis};

/// Order lifecycle engine over [`OrderStorage`]
pub struct OrdersManager {
    storage: OrderStorage,
    timing: OrderTimingConfig,
}

impl std::fmt::Debug for OrdersManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrdersManager")
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

impl OrdersManager {
    pub fn new(storage: OrderStorage, timing: OrderTimingConfig) -> Self {
        Self { storage, timing }
    }

    pub fn storage(&self) -> &OrderStorage {
        &self.storage
    }

    pub fn timing(&self) -> &OrderTimingConfig {
        &self.timing
    }

    pub fn overdue_margin_ms(&self) -> i64 {
        self.timing.overdue_margin_ms()
    }

    // ========== Placement ==========

    /// Create a `pending` order and queue its stock deduction
    ///
    /// `admission_delay_minutes` is the advisory delay reported by the
    /// admission check; it only shifts the initial estimate.
    pub fn place_order(
        &self,
        req: PlaceOrderRequest,
        actor: &Actor,
        admission_delay_minutes: u32,
    ) -> ManagerResult<Order> {
        self.place_order_at(req, actor, admission_delay_minutes, now_millis())
    }

    pub(crate) fn place_order_at(
        &self,
        req: PlaceOrderRequest,
        actor: &Actor,
        admission_delay_minutes: u32,
        now: i64,
    ) -> ManagerResult<Order> {
        machine::validate_placement(&req, actor)?;

        let day = day_key(now);
        let txn = self.storage.begin_write()?;
        let seq = self.storage.next_order_number_txn(&txn, &day)?;
        let order = machine::place(
            uuid::Uuid::new_v4().to_string(),
            format!("ORD-{day}-{seq:04}"),
            req,
            actor,
            Estimates {
                base_estimate_minutes: self.timing.base_estimate_minutes,
                preparation_minutes: self.timing.preparation_minutes,
                admission_delay_minutes,
            },
            now,
        )?;
        self.storage.store_order_txn(&txn, &order)?;
        self.queue_deduction(&txn, &order.id, &order.items)?;
        txn.commit()?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            items = order.items.len(),
            table = ?order.table_number,
            takeout = order.is_takeout,
            "Order placed"
        );
        Ok(order)
    }

    fn queue_deduction(
        &self,
        txn: &WriteTransaction,
        order_id: &str,
        items: &[OrderItem],
    ) -> ManagerResult<()> {
        let deduction = PendingDeduction::new(
            order_id,
            items
                .iter()
                .map(|i| (i.menu_item_id.clone(), i.quantity)),
        );
        self.storage.queue_deduction_txn(txn, &deduction)?;
        Ok(())
    }

    // ========== Reads ==========

    pub fn get_order(&self, order_id: &str) -> ManagerResult<Order> {
        self.storage
            .get_order(order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))
    }

    /// Get an order as seen by `actor`
    ///
    /// Roles without `ViewAnyOrder` only see orders they placed; anything else
    /// reports not found, the same as a missing id.
    pub fn get_order_for(&self, order_id: &str, actor: &Actor) -> ManagerResult<Order> {
        let order = self.get_order(order_id)?;
        if is_visible_to(&order, actor) {
            Ok(order)
        } else {
            Err(ManagerError::OrderNotFound(order_id.to_string()))
        }
    }

    /// All non-terminal orders
    pub fn active_orders(&self) -> ManagerResult<Vec<Order>> {
        Ok(self.storage.get_active_orders()?)
    }

    /// Orders completed at or after `since`
    pub fn completed_since(&self, since: i64) -> ManagerResult<Vec<Order>> {
        Ok(self.storage.get_orders_completed_since(since)?)
    }

    /// Number of orders currently on the kitchen queue
    pub fn kitchen_load(&self) -> ManagerResult<usize> {
        Ok(self
            .active_orders()?
            .iter()
            .filter(|o| o.status.is_kitchen_active())
            .count())
    }

    // ========== Mutations ==========

    fn mutate<F>(&self, order_id: &str, op: F) -> ManagerResult<Order>
    where
        F: FnOnce(&mut Order, &WriteTransaction) -> ManagerResult<()>,
    {
        let txn = self.storage.begin_write()?;
        let mut order = self
            .storage
            .get_order_txn(&txn, order_id)?
            .ok_or_else(|| ManagerError::OrderNotFound(order_id.to_string()))?;
        op(&mut order, &txn)?;
        self.storage.store_order_txn(&txn, &order)?;
        txn.commit()?;
        Ok(order)
    }

    /// Move an order to `target`
    pub fn transition(
        &self,
        order_id: &str,
        target: OrderStatus,
        actor: &Actor,
        reason: Option<String>,
    ) -> ManagerResult<Order> {
        self.transition_at(order_id, target, actor, reason, now_millis())
    }

    pub(crate) fn transition_at(
        &self,
        order_id: &str,
        target: OrderStatus,
        actor: &Actor,
        reason: Option<String>,
        now: i64,
    ) -> ManagerResult<Order> {
        let margin = self.overdue_margin_ms();
        let result = self.mutate(order_id, |order, _| {
            ensure_visible(order, actor)?;
            let from = order.status;
            machine::apply_transition(order, target, actor, reason, now, margin)?;
            tracing::info!(
                order_id = %order.id,
                from = %from,
                to = %target,
                actor = %actor.id,
                role = %actor.role,
                "Order status changed"
            );
            Ok(())
        });
        if let Err(ManagerError::Transition(e)) = &result {
            tracing::warn!(order_id = %order_id, to = %target, role = %actor.role, error = %e, "Transition rejected");
        }
        result
    }

    /// Manually set the stored priority
    pub fn set_priority(
        &self,
        order_id: &str,
        priority: Priority,
        actor: &Actor,
    ) -> ManagerResult<Order> {
        let now = now_millis();
        let margin = self.overdue_margin_ms();
        self.mutate(order_id, |order, _| {
            ensure_visible(order, actor)?;
            machine::set_priority(order, priority, actor, now, margin)?;
            tracing::info!(order_id = %order.id, priority = %priority.as_str(), actor = %actor.id, "Order priority changed");
            Ok(())
        })
    }

    /// Append lines to an order that has not reached the kitchen
    ///
    /// The appended lines get their own stock deduction in the same transaction.
    pub fn append_items(
        &self,
        order_id: &str,
        items: Vec<OrderItem>,
        actor: &Actor,
    ) -> ManagerResult<Order> {
        let now = now_millis();
        self.mutate(order_id, |order, txn| {
            ensure_visible(order, actor)?;
            let lines: Vec<(String, u32)> = items
                .iter()
                .map(|i| (i.menu_item_id.clone(), i.quantity))
                .collect();
            machine::append_items(order, items, actor, now)?;
            let deduction = PendingDeduction::new(&order.id, lines);
            self.storage.queue_deduction_txn(txn, &deduction)?;
            tracing::info!(order_id = %order.id, lines = deduction.lines.len(), "Items appended");
            Ok(())
        })
    }

    /// Persist overdue promotions for every active order
    ///
    /// Returns the number of orders whose stored priority changed.
    pub fn promote_overdue(&self, now: i64) -> ManagerResult<usize> {
        let margin = self.overdue_margin_ms();
        let ids = self.storage.get_active_order_ids()?;

        let txn = self.storage.begin_write()?;
        let mut promoted = 0;
        for id in ids {
            let Some(mut order) = self.storage.get_order_txn(&txn, &id)? else {
                continue;
            };
            if machine::promote_if_overdue(&mut order, now, margin) {
                self.storage.store_order_txn(&txn, &order)?;
                tracing::info!(order_id = %order.id, priority = %order.priority.as_str(), "Overdue order promoted");
                promoted += 1;
            }
        }
        txn.commit()?;
        Ok(promoted)
    }

    // ========== Table Assignments ==========

    /// Tables assigned to a staff member (empty when never assigned)
    pub fn assignment(&self, staff_id: &str) -> ManagerResult<TableAssignment> {
        Ok(self
            .storage
            .get_assignment(staff_id)?
            .unwrap_or_else(|| TableAssignment {
                staff_id: staff_id.to_string(),
                tables: Vec::new(),
                updated_at: 0,
            }))
    }

    /// Replace a staff member's assignment; tables are de-duplicated and sorted
    pub fn assign_tables(&self, staff_id: &str, mut tables: Vec<u32>) -> ManagerResult<TableAssignment> {
        if tables.contains(&0) {
            return Err(ManagerError::InvalidTable(
                "table number must be positive".to_string(),
            ));
        }
        tables.sort_unstable();
        tables.dedup();
        let assignment = TableAssignment {
            staff_id: staff_id.to_string(),
            tables,
            updated_at: now_millis(),
        };
        self.storage.store_assignment(&assignment)?;
        tracing::info!(staff_id = %staff_id, tables = ?assignment.tables, "Table assignment updated");
        Ok(assignment)
    }
}

fn is_visible_to(order: &Order, actor: &Actor) -> bool {
    if permissions::can(actor.role, Action::ViewAnyOrder) {
        return true;
    }
    permissions::can(actor.role, Action::ViewOwnOrder)
        && actor.role == Role::Customer
        && order.customer_id.as_deref() == Some(actor.id.as_str())
}

/// Orders the actor may not see are reported missing, before any capability check
fn ensure_visible(order: &Order, actor: &Actor) -> ManagerResult<()> {
    if is_visible_to(order, actor) {
        Ok(())
    } else {
        Err(ManagerError::OrderNotFound(order.id.clone()))
    }
}

#[cfg(test)]
mod tests;
