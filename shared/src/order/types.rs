//! Order aggregate

use super::status::{OrderStatus, Priority};
use crate::models::Role;
use serde::{Deserialize, Serialize};

const MINUTE_MS: i64 = 60_000;

/// One line of an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub menu_item_id: String,
    pub quantity: u32,
    pub unit_price: f64,
    /// Display name captured at placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

/// Audit record of one applied transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor_role: Role,
    pub actor_id: String,
    pub at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Canonical order record
///
/// Timestamps are UTC milliseconds. Each progress timestamp is written exactly
/// once, by the transition into the matching status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: String,
    /// Human readable number, e.g. `ORD-20250101-0007`
    pub order_number: String,
    pub status: OrderStatus,
    pub priority: Priority,
    pub items: Vec<OrderItem>,
    pub is_takeout: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kitchen_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,

    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kitchen_started_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    /// Last mutation of any kind
    pub updated_at: i64,

    /// Estimate from placement until completion, before the kitchen starts
    pub base_estimate_minutes: u32,
    /// Estimate from kitchen start until completion
    pub preparation_minutes: u32,
    /// Advisory delay reported by admission at placement
    #[serde(default)]
    pub admission_delay_minutes: u32,

    #[serde(default)]
    pub status_history: Vec<StatusChange>,
}

impl Order {
    pub fn total(&self) -> f64 {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Units across all lines
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Estimated completion time (millis)
    ///
    /// Once the kitchen starts: `kitchen_started_at + preparation`.
    /// Before that: `created_at + base_estimate + admission_delay`.
    pub fn estimated_completion(&self) -> i64 {
        match self.kitchen_started_at {
            Some(started) => started + i64::from(self.preparation_minutes) * MINUTE_MS,
            None => {
                self.created_at
                    + (i64::from(self.base_estimate_minutes)
                        + i64::from(self.admission_delay_minutes))
                        * MINUTE_MS
            }
        }
    }

    /// Non-terminal and past its estimated completion by more than `margin_ms`
    pub fn is_overdue(&self, now: i64, margin_ms: i64) -> bool {
        !self.status.is_terminal() && now > self.estimated_completion() + margin_ms
    }

    /// Stored priority, raised to the overdue floor when overdue
    pub fn effective_priority(&self, now: i64, margin_ms: i64) -> Priority {
        if self.is_overdue(now, margin_ms) {
            self.priority.promoted_to(Priority::OVERDUE_FLOOR)
        } else {
            self.priority
        }
    }

    /// Latest progress timestamp (the one the status was entered at)
    pub fn last_transition_at(&self) -> i64 {
        [
            self.cancelled_at,
            self.completed_at,
            self.ready_at,
            self.kitchen_started_at,
            self.confirmed_at,
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(self.created_at)
    }

    /// Timestamp slot written by the transition into `status`
    pub fn timestamp_for(&self, status: OrderStatus) -> Option<i64> {
        match status {
            OrderStatus::Pending => Some(self.created_at),
            OrderStatus::Confirmed => self.confirmed_at,
            OrderStatus::Preparing => self.kitchen_started_at,
            OrderStatus::Ready => self.ready_at,
            OrderStatus::Completed => self.completed_at,
            OrderStatus::Cancelled => self.cancelled_at,
        }
    }

    pub fn elapsed_minutes(&self, now: i64) -> i64 {
        (now - self.created_at).max(0) / MINUTE_MS
    }

    /// Minutes until the estimate, floored at zero
    pub fn remaining_minutes(&self, now: i64) -> i64 {
        (self.estimated_completion() - now).max(0) / MINUTE_MS
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn order_at(created_at: i64) -> Order {
        Order {
            id: "order-1".to_string(),
            order_number: "ORD-20250101-0001".to_string(),
            status: OrderStatus::Pending,
            priority: Priority::Normal,
            items: vec![OrderItem {
                menu_item_id: "burger".to_string(),
                quantity: 2,
                unit_price: 8.5,
                name: Some("Burger".to_string()),
            }],
            is_takeout: false,
            table_number: Some(4),
            kitchen_notes: None,
            customer_id: None,
            customer_name: None,
            created_at,
            confirmed_at: None,
            kitchen_started_at: None,
            ready_at: None,
            completed_at: None,
            cancelled_at: None,
            cancel_reason: None,
            updated_at: created_at,
            base_estimate_minutes: 20,
            preparation_minutes: 15,
            admission_delay_minutes: 5,
            status_history: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::order_at;
    use super::*;

    #[test]
    fn test_estimate_before_kitchen_start() {
        let order = order_at(0);
        assert_eq!(order.estimated_completion(), 25 * MINUTE_MS);
    }

    #[test]
    fn test_estimate_after_kitchen_start() {
        let mut order = order_at(0);
        order.status = OrderStatus::Preparing;
        order.kitchen_started_at = Some(10 * MINUTE_MS);
        assert_eq!(order.estimated_completion(), 25 * MINUTE_MS);
        order.kitchen_started_at = Some(30 * MINUTE_MS);
        assert_eq!(order.estimated_completion(), 45 * MINUTE_MS);
    }

    #[test]
    fn test_overdue_respects_margin_and_terminal() {
        let mut order = order_at(0);
        let estimate = order.estimated_completion();
        assert!(!order.is_overdue(estimate, 0));
        assert!(order.is_overdue(estimate + 1, 0));
        assert!(!order.is_overdue(estimate + 1, 5 * MINUTE_MS));

        order.status = OrderStatus::Completed;
        assert!(!order.is_overdue(estimate + MINUTE_MS, 0));
    }

    #[test]
    fn test_effective_priority_never_demotes() {
        let mut order = order_at(0);
        let late = order.estimated_completion() + MINUTE_MS;
        assert_eq!(order.effective_priority(late, 0), Priority::High);
        order.priority = Priority::Urgent;
        assert_eq!(order.effective_priority(late, 0), Priority::Urgent);
        order.priority = Priority::Low;
        assert_eq!(order.effective_priority(0, 0), Priority::Low);
    }

    #[test]
    fn test_totals() {
        let order = order_at(0);
        assert_eq!(order.total(), 17.0);
        assert_eq!(order.item_count(), 2);
    }
}
