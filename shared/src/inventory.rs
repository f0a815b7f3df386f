//! Inventory admission and stock types

use serde::{Deserialize, Serialize};

/// One requested line of an admission check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemRequest {
    pub menu_item_id: String,
    pub quantity: u32,
}

/// Body of `POST /inventory/check-availability` and `POST /inventory/estimate-delay`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryCheckRequest {
    pub items: Vec<ItemRequest>,
}

/// Advisory admission result, computed fresh per request and never stored
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryCheckResult {
    pub available: bool,
    pub unavailable_items: Vec<String>,
    pub low_stock_warnings: Vec<String>,
    pub estimated_delay_minutes: u32,
    pub delay_reason: String,
}

impl InventoryCheckResult {
    /// Optimistic default used when the ledger cannot be consulted
    pub fn assume_available() -> Self {
        Self {
            available: true,
            unavailable_items: Vec::new(),
            low_stock_warnings: Vec::new(),
            estimated_delay_minutes: 0,
            delay_reason: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelayEstimate {
    pub estimated_delay_minutes: u32,
    pub delay_reason: String,
}

/// Stock record of one menu item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockLevel {
    pub menu_item_id: String,
    pub name: String,
    pub on_hand: u32,
    pub low_stock_threshold: u32,
    #[serde(default)]
    pub updated_at: i64,
}

/// Body of `PUT /inventory/items/{menu_item_id}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockUpdate {
    pub name: String,
    pub on_hand: u32,
    pub low_stock_threshold: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    OutOfStock,
    LowStock,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InventoryAlert {
    pub menu_item_id: String,
    pub name: String,
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub on_hand: u32,
    pub low_stock_threshold: u32,
}

impl InventoryAlert {
    /// Alert for a stock record, if any
    ///
    /// Out of stock at zero; low stock at or below the threshold, `high`
    /// severity once at or below half of it.
    pub fn for_level(level: &StockLevel) -> Option<Self> {
        let (kind, severity) = if level.on_hand == 0 {
            (AlertKind::OutOfStock, AlertSeverity::High)
        } else if level.on_hand <= level.low_stock_threshold {
            let severity = if level.on_hand * 2 <= level.low_stock_threshold {
                AlertSeverity::High
            } else {
                AlertSeverity::Medium
            };
            (AlertKind::LowStock, severity)
        } else {
            return None;
        };
        Some(Self {
            menu_item_id: level.menu_item_id.clone(),
            name: level.name.clone(),
            kind,
            severity,
            on_hand: level.on_hand,
            low_stock_threshold: level.low_stock_threshold,
        })
    }
}
