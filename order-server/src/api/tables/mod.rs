//! Table Assignment API 模块
//!
//! 服务看板默认展示调用者被分配的桌台。

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route(
        "/tables/assignments",
        get(handler::get_assignment).put(handler::assign),
    )
}
