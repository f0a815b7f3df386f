//! Order API Handlers
//!
//! 角色判定全部交给 [`CurrentUser`] 和状态机，handler 只负责组装参数和投影。

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::api::AppJson;
use crate::auth::{Action, CurrentUser};
use crate::core::ServerState;
use crate::orders::{Actor, projections};
use crate::utils::{AppError, AppResult};
use shared::inventory::ItemRequest;
use shared::order::{
    AppendItemsRequest, DashboardQuery, KitchenQueue, KitchenStats, Order, OrderTracker,
    PlaceOrderRequest, PlaceOrderResponse, ServerDashboard, StatusChange, UpdateOrderRequest,
};
use shared::util::{now_millis, start_of_day};

/// POST /orders - 准入检查后创建订单
///
/// 准入结果仅作参考：缺货不阻止下单，只影响返回的提示和初始预计时间。
pub async fn place(
    State(state): State<ServerState>,
    user: CurrentUser,
    AppJson(payload): AppJson<PlaceOrderRequest>,
) -> AppResult<(StatusCode, Json<PlaceOrderResponse>)> {
    user.require(Action::PlaceOrder)?;

    let items: Vec<ItemRequest> = payload
        .items
        .iter()
        .map(|i| ItemRequest {
            menu_item_id: i.menu_item_id.clone(),
            quantity: i.quantity,
        })
        .collect();
    let load = state.orders.kitchen_load()?;
    let outcome = state.admission.check(&items, load).await;
    if outcome.degraded {
        tracing::warn!(user = %user.id, "AdmissionDegraded: inventory ledger unreachable, assuming available");
    }

    let order = state.orders.place_order(
        payload,
        &Actor::from(&user),
        outcome.result.estimated_delay_minutes,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(PlaceOrderResponse {
            order,
            inventory: outcome.result,
            admission_degraded: outcome.degraded,
        }),
    ))
}

/// GET /orders/{id} - 顾客追踪视图
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderTracker>> {
    let order = state.orders.get_order_for(&id, &Actor::from(&user))?;
    Ok(Json(projections::tracker(order, now_millis())))
}

/// GET /orders/{id}/history - 状态变更记录
pub async fn history(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<StatusChange>>> {
    let order = state.orders.get_order_for(&id, &Actor::from(&user))?;
    Ok(Json(order.status_history))
}

/// GET /orders/kitchen_queue - 厨房队列
pub async fn kitchen_queue(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<KitchenQueue>> {
    user.require(Action::ViewKitchenQueue)?;
    let orders = state.orders.active_orders()?;
    Ok(Json(projections::kitchen_queue(
        orders,
        now_millis(),
        state.orders.overdue_margin_ms(),
    )))
}

/// GET /orders/kitchen_stats - 厨房统计 (队列规模、今日完成、平均制作时间)
pub async fn kitchen_stats(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<KitchenStats>> {
    user.require(Action::ViewKitchenQueue)?;
    let now = now_millis();
    let day_start = start_of_day(now);
    let active = state.orders.active_orders()?;
    let completed = state.orders.completed_since(day_start)?;
    Ok(Json(projections::kitchen_stats(
        &active,
        &completed,
        day_start,
        now,
        state.orders.overdue_margin_ms(),
    )))
}

/// GET /orders/server_dashboard?tables=1,2 - 服务看板
///
/// 未指定 `tables` 时使用调用者自己的桌台分配。
pub async fn server_dashboard(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<ServerDashboard>> {
    user.require(Action::ViewServerDashboard)?;

    let tables = match query.tables.as_deref() {
        Some(raw) => projections::parse_tables(raw).map_err(AppError::validation)?,
        None => state.orders.assignment(&user.id)?.tables,
    };
    let orders = state.orders.active_orders()?;
    Ok(Json(projections::server_dashboard(
        orders,
        &tables,
        now_millis(),
    )))
}

/// PATCH /orders/{id} - 状态迁移或调整优先级
///
/// 请求体必须且只能包含 `status` 或 `priority` 之一。
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateOrderRequest>,
) -> AppResult<Json<Order>> {
    let actor = Actor::from(&user);
    let order = match (payload.status, payload.priority) {
        (Some(status), None) => state
            .orders
            .transition(&id, status, &actor, payload.reason)?,
        (None, Some(priority)) => state.orders.set_priority(&id, priority, &actor)?,
        (Some(_), Some(_)) => {
            return Err(AppError::validation(
                "Provide either status or priority, not both",
            ));
        }
        (None, None) => return Err(AppError::validation("Provide status or priority")),
    };
    Ok(Json(order))
}

/// POST /orders/{id}/items - 追加菜品 (制作开始前)
pub async fn append_items(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<AppendItemsRequest>,
) -> AppResult<Json<Order>> {
    let order = state
        .orders
        .append_items(&id, payload.items, &Actor::from(&user))?;
    Ok(Json(order))
}
