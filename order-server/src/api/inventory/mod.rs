//! Inventory API 模块
//!
//! | 路径 | 方法 | 说明 | 能力 |
//! |------|------|------|------|
//! | /inventory/check-availability | POST | 库存准入检查 | CheckInventory |
//! | /inventory/estimate-delay | POST | 仅返回预计延迟 | CheckInventory |
//! | /inventory/items | GET | 库存列表 | ManageInventory |
//! | /inventory/items/{menu_item_id} | PUT | 设置库存 | ManageInventory |
//! | /inventory/alerts | GET | 缺货 / 低库存告警 | ManageInventory |

mod handler;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/inventory", routes())
}

fn routes() -> Router<ServerState> {
    let check_routes = Router::new()
        .route("/check-availability", post(handler::check_availability))
        .route("/estimate-delay", post(handler::estimate_delay));

    let manage_routes = Router::new()
        .route("/items", get(handler::list))
        .route("/items/{menu_item_id}", put(handler::set_level))
        .route("/alerts", get(handler::alerts));

    check_routes.merge(manage_routes)
}
