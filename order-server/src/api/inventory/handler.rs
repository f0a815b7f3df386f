//! Inventory API Handlers

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::AppJson;
use crate::auth::{Action, CurrentUser};
use crate::core::ServerState;
use crate::orders::machine::MAX_ITEM_QUANTITY;
use crate::utils::{AppError, AppResult};
use shared::inventory::{
    DelayEstimate, InventoryAlert, InventoryCheckRequest, InventoryCheckResult, ItemRequest,
    StockLevel, StockUpdate,
};

fn validate_lines(items: &[ItemRequest]) -> AppResult<()> {
    if items.is_empty() {
        return Err(AppError::invalid_items("At least one item is required"));
    }
    if let Some(line) = items
        .iter()
        .find(|i| {
            i.menu_item_id.trim().is_empty() || i.quantity == 0 || i.quantity > MAX_ITEM_QUANTITY
        })
    {
        return Err(AppError::invalid_items(format!(
            "Invalid line '{}': menu item id and a quantity of 1..={} are required",
            line.menu_item_id, MAX_ITEM_QUANTITY
        ))
        .with_detail("menu_item_id", line.menu_item_id.clone()));
    }
    Ok(())
}

/// POST /inventory/check-availability - 库存准入检查
pub async fn check_availability(
    State(state): State<ServerState>,
    user: CurrentUser,
    AppJson(payload): AppJson<InventoryCheckRequest>,
) -> AppResult<Json<InventoryCheckResult>> {
    user.require(Action::CheckInventory)?;
    validate_lines(&payload.items)?;

    let load = state.orders.kitchen_load()?;
    let outcome = state.admission.check(&payload.items, load).await;
    if outcome.degraded {
        tracing::warn!("AdmissionDegraded: availability check answered optimistically");
    }
    Ok(Json(outcome.result))
}

/// POST /inventory/estimate-delay - 预计延迟
pub async fn estimate_delay(
    State(state): State<ServerState>,
    user: CurrentUser,
    AppJson(payload): AppJson<InventoryCheckRequest>,
) -> AppResult<Json<DelayEstimate>> {
    user.require(Action::CheckInventory)?;
    validate_lines(&payload.items)?;

    let load = state.orders.kitchen_load()?;
    let (estimate, degraded) = state.admission.estimate_delay(&payload.items, load).await;
    if degraded {
        tracing::warn!("AdmissionDegraded: delay estimate answered optimistically");
    }
    Ok(Json(estimate))
}

/// GET /inventory/items - 库存列表
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<StockLevel>>> {
    user.require(Action::ManageInventory)?;
    Ok(Json(state.stock.list()?))
}

/// PUT /inventory/items/{menu_item_id} - 设置库存
pub async fn set_level(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(menu_item_id): Path<String>,
    AppJson(payload): AppJson<StockUpdate>,
) -> AppResult<Json<StockLevel>> {
    user.require(Action::ManageInventory)?;
    if menu_item_id.trim().is_empty() {
        return Err(AppError::validation("menu_item_id must not be empty"));
    }

    let level = state.stock.set_level(&menu_item_id, payload)?;
    tracing::info!(
        menu_item_id = %level.menu_item_id,
        on_hand = level.on_hand,
        threshold = level.low_stock_threshold,
        user = %user.id,
        "Stock level set"
    );
    Ok(Json(level))
}

/// GET /inventory/alerts - 缺货 / 低库存告警
pub async fn alerts(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<InventoryAlert>>> {
    user.require(Action::ManageInventory)?;
    Ok(Json(state.stock.alerts()?))
}
