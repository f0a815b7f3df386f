//! Capability Definitions
//!
//! 角色 → 可执行动作 的唯一查找表。状态机的 Forbidden 判定和各 handler
//! 的访问控制都从这里读取，不在别处重复判断角色。
//!
//! | 角色 | 能力 |
//! |------|------|
//! | customer | 下单、追加菜品、查看自己的订单、查询库存 |
//! | kitchen | 确认、开始制作、出餐、完成、取消、调整优先级、厨房队列、库存管理 |
//! | service | 下单、追加菜品、完成、取消、调整优先级、厨房队列、服务看板、分配桌台 |
//! | admin | 全部 |

use serde::Serialize;
use shared::models::Role;
use shared::order::OrderStatus;

/// 可授权的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    PlaceOrder,
    AppendItems,
    ViewOwnOrder,
    ViewAnyOrder,
    ConfirmOrder,
    StartPreparing,
    MarkReady,
    CompleteOrder,
    CancelOrder,
    SetPriority,
    ViewKitchenQueue,
    ViewServerDashboard,
    AssignTables,
    CheckInventory,
    ManageInventory,
}

impl Action {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Action::PlaceOrder => "place_order",
            Action::AppendItems => "append_items",
            Action::ViewOwnOrder => "view_own_order",
            Action::ViewAnyOrder => "view_any_order",
            Action::ConfirmOrder => "confirm_order",
            Action::StartPreparing => "start_preparing",
            Action::MarkReady => "mark_ready",
            Action::CompleteOrder => "complete_order",
            Action::CancelOrder => "cancel_order",
            Action::SetPriority => "set_priority",
            Action::ViewKitchenQueue => "view_kitchen_queue",
            Action::ViewServerDashboard => "view_server_dashboard",
            Action::AssignTables => "assign_tables",
            Action::CheckInventory => "check_inventory",
            Action::ManageInventory => "manage_inventory",
        }
    }
}

const CUSTOMER: &[Action] = &[
    Action::PlaceOrder,
    Action::AppendItems,
    Action::ViewOwnOrder,
    Action::CheckInventory,
];

const KITCHEN: &[Action] = &[
    Action::ConfirmOrder,
    Action::StartPreparing,
    Action::MarkReady,
    Action::CompleteOrder,
    Action::CancelOrder,
    Action::SetPriority,
    Action::ViewAnyOrder,
    Action::ViewKitchenQueue,
    Action::CheckInventory,
    Action::ManageInventory,
];

const SERVICE: &[Action] = &[
    Action::PlaceOrder,
    Action::AppendItems,
    Action::CompleteOrder,
    Action::CancelOrder,
    Action::SetPriority,
    Action::ViewAnyOrder,
    Action::ViewKitchenQueue,
    Action::ViewServerDashboard,
    Action::AssignTables,
    Action::CheckInventory,
];

const ADMIN: &[Action] = &[
    Action::PlaceOrder,
    Action::AppendItems,
    Action::ViewOwnOrder,
    Action::ViewAnyOrder,
    Action::ConfirmOrder,
    Action::StartPreparing,
    Action::MarkReady,
    Action::CompleteOrder,
    Action::CancelOrder,
    Action::SetPriority,
    Action::ViewKitchenQueue,
    Action::ViewServerDashboard,
    Action::AssignTables,
    Action::CheckInventory,
    Action::ManageInventory,
];

/// Capability set of a role
pub const fn capabilities(role: Role) -> &'static [Action] {
    match role {
        Role::Customer => CUSTOMER,
        Role::Kitchen => KITCHEN,
        Role::Service => SERVICE,
        Role::Admin => ADMIN,
    }
}

pub fn can(role: Role, action: Action) -> bool {
    capabilities(role).contains(&action)
}

/// Action required to move an order into `target`
///
/// `pending` is only entered by placement, never by a transition.
pub const fn required_for_status(target: OrderStatus) -> Option<Action> {
    match target {
        OrderStatus::Pending => None,
        OrderStatus::Confirmed => Some(Action::ConfirmOrder),
        OrderStatus::Preparing => Some(Action::StartPreparing),
        OrderStatus::Ready => Some(Action::MarkReady),
        OrderStatus::Completed => Some(Action::CompleteOrder),
        OrderStatus::Cancelled => Some(Action::CancelOrder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kitchen_drives_the_kitchen_edges() {
        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ] {
            let action = required_for_status(status).unwrap();
            assert!(can(Role::Kitchen, action));
            assert!(!can(Role::Service, action));
            assert!(!can(Role::Customer, action));
        }
    }

    #[test]
    fn test_completion_and_cancellation() {
        assert!(can(Role::Kitchen, Action::CompleteOrder));
        assert!(can(Role::Service, Action::CompleteOrder));
        assert!(!can(Role::Customer, Action::CompleteOrder));

        for role in [Role::Kitchen, Role::Service, Role::Admin] {
            assert!(can(role, Action::CancelOrder));
        }
        assert!(!can(Role::Customer, Action::CancelOrder));
    }

    #[test]
    fn test_admin_has_every_action() {
        for role in [Role::Customer, Role::Kitchen, Role::Service] {
            for action in capabilities(role) {
                assert!(can(Role::Admin, *action), "admin lacks {:?}", action);
            }
        }
    }

    #[test]
    fn test_pending_is_not_reachable_by_transition() {
        assert!(required_for_status(OrderStatus::Pending).is_none());
    }
}
