//! Order domain types
//!
//! - [`OrderStatus`] / [`Priority`]: lifecycle enums and the transition table
//! - [`Order`]: the canonical aggregate stored by the server
//! - request bodies and projection views exchanged over HTTP

pub mod request;
pub mod status;
pub mod types;
pub mod view;

pub use request::{
    AppendItemsRequest, DashboardQuery, PlaceOrderRequest, PlaceOrderResponse, UpdateOrderRequest,
};
pub use status::{OrderStatus, Priority};
pub use types::{Order, OrderItem, StatusChange};
pub use view::{
    AssignTablesRequest, KitchenQueue, KitchenQueueEntry, KitchenStats, OrderTracker, ServerDashboard,
    TableAssignment, TableOrders,
};
