//! Table Assignment API Handlers

use axum::{Json, extract::State};

use crate::api::AppJson;
use crate::auth::{Action, CurrentUser};
use crate::core::ServerState;
use crate::utils::AppResult;
use shared::order::{AssignTablesRequest, TableAssignment};

/// GET /tables/assignments - 当前用户的桌台分配
pub async fn get_assignment(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<TableAssignment>> {
    user.require(Action::AssignTables)?;
    Ok(Json(state.orders.assignment(&user.id)?))
}

/// PUT /tables/assignments - 替换当前用户的桌台分配
pub async fn assign(
    State(state): State<ServerState>,
    user: CurrentUser,
    AppJson(payload): AppJson<AssignTablesRequest>,
) -> AppResult<Json<TableAssignment>> {
    user.require(Action::AssignTables)?;
    let assignment = state.orders.assign_tables(&user.id, payload.tables)?;
    tracing::info!(user = %user.id, tables = ?assignment.tables, "Tables assigned");
    Ok(Json(assignment))
}
