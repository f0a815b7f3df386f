//! Read-only projections served to the polling clients

use super::status::Priority;
use super::types::Order;
use serde::{Deserialize, Serialize};

/// Kitchen queue row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KitchenQueueEntry {
    pub order: Order,
    pub overdue: bool,
    /// Stored priority raised to `high` when overdue
    pub effective_priority: Priority,
    pub estimated_completion: i64,
    pub elapsed_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KitchenQueue {
    pub entries: Vec<KitchenQueueEntry>,
    pub generated_at: i64,
}

/// Kitchen display header figures
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KitchenStats {
    /// Orders on the kitchen queue
    pub active_orders: usize,
    /// Queue orders not yet confirmed
    pub pending_orders: usize,
    /// Units across all queue orders
    pub pending_items: u64,
    pub overdue_orders: usize,
    /// Orders completed since the start of the UTC day
    pub completed_today: usize,
    /// Mean kitchen start to ready time of today's completed orders (minutes)
    pub average_prep_minutes: Option<f64>,
    /// Percentage of today's completed orders that were ready by their estimate
    pub on_time_rate: Option<f64>,
    /// Age of the oldest order the kitchen has not started (minutes)
    pub current_wait_minutes: i64,
    pub generated_at: i64,
}

/// Customer tracker view of a single order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderTracker {
    pub order: Order,
    pub progress_percentage: u8,
    pub status_message: String,
    /// e.g. "15-25 minutes", "Ready now!"
    pub estimated_time: String,
    pub estimated_completion: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableOrders {
    pub table_number: u32,
    pub orders: Vec<Order>,
}

/// Server dashboard: non-terminal orders on the requested tables
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerDashboard {
    pub tables: Vec<TableOrders>,
    pub generated_at: i64,
}

impl ServerDashboard {
    pub fn orders(&self) -> impl Iterator<Item = &Order> {
        self.tables.iter().flat_map(|t| t.orders.iter())
    }
}

/// Staff member's table assignment
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TableAssignment {
    pub staff_id: String,
    pub tables: Vec<u32>,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignTablesRequest {
    pub tables: Vec<u32>,
}
