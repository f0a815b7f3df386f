//! Order status and priority
//!
//! 状态流转表（初始 `pending`，终态 `completed` / `cancelled`）:
//!
//! | From        | To                          |
//! |-------------|-----------------------------|
//! | `pending`   | `confirmed`, `cancelled`    |
//! | `confirmed` | `preparing`, `cancelled`    |
//! | `preparing` | `ready`, `cancelled`        |
//! | `ready`     | `completed`                 |

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    #[serde(alias = "served")]
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    /// Direct successors of this status
    pub const fn successors(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Preparing, OrderStatus::Cancelled],
            OrderStatus::Preparing => &[OrderStatus::Ready, OrderStatus::Cancelled],
            OrderStatus::Ready => &[OrderStatus::Completed],
            OrderStatus::Completed | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        self.successors().contains(&target)
    }

    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Statuses shown on the kitchen queue
    pub const fn is_kitchen_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Confirmed | OrderStatus::Preparing
        )
    }

    /// Items may only be appended before the kitchen starts
    pub const fn accepts_items(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    /// Fixed milestone shown by the customer tracker
    pub const fn progress_percentage(&self) -> u8 {
        match self {
            OrderStatus::Pending => 10,
            OrderStatus::Confirmed => 25,
            OrderStatus::Preparing => 60,
            OrderStatus::Ready => 90,
            OrderStatus::Completed => 100,
            OrderStatus::Cancelled => 0,
        }
    }

    pub const fn customer_message(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Order received and being reviewed",
            OrderStatus::Confirmed => "Order confirmed and sent to kitchen",
            OrderStatus::Preparing => "Chef is preparing your order",
            OrderStatus::Ready => "Order is ready for pickup/serving",
            OrderStatus::Completed => "Order completed successfully",
            OrderStatus::Cancelled => "Order has been cancelled",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order priority
///
/// Declaration order defines the ranking: `Low < Normal < High < Urgent`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    /// Minimum priority of an overdue order
    pub const OVERDUE_FLOOR: Priority = Priority::High;

    /// Promote to at least `floor`, never demote
    pub fn promoted_to(self, floor: Priority) -> Priority {
        self.max(floor)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
