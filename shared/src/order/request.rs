//! Request and response bodies of the order API

use super::status::{OrderStatus, Priority};
use super::types::{Order, OrderItem};
use crate::inventory::InventoryCheckResult;
use serde::{Deserialize, Serialize};

/// `POST /orders`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub is_takeout: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "notes")]
    pub kitchen_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
}

/// `POST /orders` response: the created order plus the advisory admission result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlaceOrderResponse {
    pub order: Order,
    pub inventory: InventoryCheckResult,
    /// Set when the inventory oracle could not be reached
    #[serde(default)]
    pub admission_degraded: bool,
}

/// `PATCH /orders/{id}`: exactly one of `status` / `priority`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UpdateOrderRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Only meaningful with `status = cancelled`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UpdateOrderRequest {
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn cancel(reason: impl Into<String>) -> Self {
        Self {
            status: Some(OrderStatus::Cancelled),
            reason: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn priority(priority: Priority) -> Self {
        Self {
            priority: Some(priority),
            ..Default::default()
        }
    }
}

/// `POST /orders/{id}/items`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppendItemsRequest {
    pub items: Vec<OrderItem>,
}

/// `GET /orders/server_dashboard` query
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardQuery {
    /// Comma separated table numbers; defaults to the caller's assignments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<String>,
}
