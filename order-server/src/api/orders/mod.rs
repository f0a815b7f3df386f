//! Order API 模块
//!
//! | 路径 | 方法 | 说明 | 能力 |
//! |------|------|------|------|
//! | /orders | POST | 准入检查后下单 | PlaceOrder |
//! | /orders/kitchen_queue | GET | 厨房队列 | ViewKitchenQueue |
//! | /orders/kitchen_stats | GET | 厨房统计 | ViewKitchenQueue |
//! | /orders/server_dashboard | GET | 服务看板 | ViewServerDashboard |
//! | /orders/{id} | GET | 顾客追踪视图 | ViewOwnOrder / ViewAnyOrder |
//! | /orders/{id} | PATCH | 状态迁移或调整优先级 | 视目标状态而定 |
//! | /orders/{id}/history | GET | 状态变更记录 | ViewOwnOrder / ViewAnyOrder |
//! | /orders/{id}/items | POST | 追加菜品 | AppendItems |

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/orders", post(handler::place))
        .route("/orders/kitchen_queue", get(handler::kitchen_queue))
        .route("/orders/kitchen_stats", get(handler::kitchen_stats))
        .route("/orders/server_dashboard", get(handler::server_dashboard))
        .route("/orders/{id}", get(handler::get_by_id).patch(handler::update))
        .route("/orders/{id}/history", get(handler::history))
        .route("/orders/{id}/items", post(handler::append_items))
}
