//! Order state machine
//!
//! Pure functions over a single [`Order`]. Every operation validates first and
//! mutates only after all checks pass, so a rejected call leaves the order
//! untouched. Persistence and atomicity live in [`super::manager`].
//!
//! | Check order | Failure |
//! |-------------|---------|
//! | capability of the actor's role | [`TransitionError::Forbidden`] |
//! | edge in the transition table | [`TransitionError::InvalidTransition`] |

use std::collections::HashMap;

use shared::models::Role;
use shared::order::{
    Order, OrderItem, OrderStatus, PlaceOrderRequest, Priority, StatusChange,
};
use thiserror::Error;

use crate::auth::permissions::{self, Action};
use crate::auth::CurrentUser;

/// Longest accepted kitchen note
pub const MAX_NOTE_LEN: usize = 500;

/// Most units of one menu item a single request may carry, across all its lines
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// Who is acting on an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    /// Internal actor used by background tasks
    pub fn system() -> Self {
        Self::new("system", Role::Admin)
    }
}

impl From<&CurrentUser> for Actor {
    fn from(user: &CurrentUser) -> Self {
        Self::new(user.id.clone(), user.role)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("role '{role}' lacks capability '{}'", action.as_str())]
    Forbidden { role: Role, action: Action },

    #[error("cannot move order from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("order is {status} and accepts no further changes")]
    Terminal { status: OrderStatus },

    #[error("items cannot change once the order is {status}")]
    ItemsLocked { status: OrderStatus },

    #[error("{0}")]
    InvalidItems(String),

    #[error("{0}")]
    TableConflict(String),
}

/// Estimates applied to a new order
#[derive(Debug, Clone, Copy)]
pub struct Estimates {
    pub base_estimate_minutes: u32,
    pub preparation_minutes: u32,
    pub admission_delay_minutes: u32,
}

fn require(actor: &Actor, action: Action) -> Result<(), TransitionError> {
    if permissions::can(actor.role, action) {
        Ok(())
    } else {
        Err(TransitionError::Forbidden {
            role: actor.role,
            action,
        })
    }
}

/// Validate a list of order lines
///
/// Non-empty, every line names a menu item, orders at least one unit and has
/// a finite non-negative price. Lines for the same menu item together stay
/// within [`MAX_ITEM_QUANTITY`].
pub fn validate_items(items: &[OrderItem]) -> Result<(), TransitionError> {
    if items.is_empty() {
        return Err(TransitionError::InvalidItems(
            "order must contain at least one item".to_string(),
        ));
    }
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for (idx, item) in items.iter().enumerate() {
        if item.menu_item_id.trim().is_empty() {
            return Err(TransitionError::InvalidItems(format!(
                "item {idx}: menu_item_id is empty"
            )));
        }
        if item.quantity == 0 {
            return Err(TransitionError::InvalidItems(format!(
                "item {idx} ({}): quantity must be positive",
                item.menu_item_id
            )));
        }
        if !item.unit_price.is_finite() || item.unit_price < 0.0 {
            return Err(TransitionError::InvalidItems(format!(
                "item {idx} ({}): unit_price must be a non-negative number",
                item.menu_item_id
            )));
        }
        let total = totals.entry(item.menu_item_id.as_str()).or_default();
        *total += u64::from(item.quantity);
        if *total > u64::from(MAX_ITEM_QUANTITY) {
            return Err(TransitionError::InvalidItems(format!(
                "item {idx} ({}): at most {MAX_ITEM_QUANTITY} units per menu item",
                item.menu_item_id
            )));
        }
    }
    Ok(())
}

/// Validate a placement request without creating anything
pub fn validate_placement(
    req: &PlaceOrderRequest,
    actor: &Actor,
) -> Result<(), TransitionError> {
    require(actor, Action::PlaceOrder)?;
    validate_items(&req.items)?;
    match (req.is_takeout, req.table_number) {
        (true, Some(_)) => Err(TransitionError::TableConflict(
            "takeout orders cannot carry a table number".to_string(),
        )),
        (false, None) => Err(TransitionError::TableConflict(
            "dine-in orders require a table number".to_string(),
        )),
        (false, Some(0)) => Err(TransitionError::TableConflict(
            "table number must be positive".to_string(),
        )),
        _ => Ok(()),
    }?;
    if let Some(notes) = &req.kitchen_notes
        && notes.chars().count() > MAX_NOTE_LEN
    {
        return Err(TransitionError::InvalidItems(format!(
            "kitchen notes exceed {MAX_NOTE_LEN} characters"
        )));
    }
    Ok(())
}

/// Build a new `pending` order from a validated request
pub fn place(
    id: String,
    order_number: String,
    req: PlaceOrderRequest,
    actor: &Actor,
    estimates: Estimates,
    now: i64,
) -> Result<Order, TransitionError> {
    validate_placement(&req, actor)?;
    let kitchen_notes = req
        .kitchen_notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(Order {
        id,
        order_number,
        status: OrderStatus::Pending,
        priority: Priority::Normal,
        items: req.items,
        is_takeout: req.is_takeout,
        table_number: if req.is_takeout { None } else { req.table_number },
        kitchen_notes,
        customer_id: (actor.role == Role::Customer).then(|| actor.id.clone()),
        customer_name: req.customer_name,
        created_at: now,
        confirmed_at: None,
        kitchen_started_at: None,
        ready_at: None,
        completed_at: None,
        cancelled_at: None,
        cancel_reason: None,
        updated_at: now,
        base_estimate_minutes: estimates.base_estimate_minutes,
        preparation_minutes: estimates.preparation_minutes,
        admission_delay_minutes: estimates.admission_delay_minutes,
        status_history: Vec::new(),
    })
}

/// Apply a status transition
///
/// The new timestamp is never earlier than the previous one, so progress
/// timestamps stay monotonic even if the clock steps backwards.
pub fn apply_transition(
    order: &mut Order,
    target: OrderStatus,
    actor: &Actor,
    reason: Option<String>,
    now: i64,
    overdue_margin_ms: i64,
) -> Result<(), TransitionError> {
    match permissions::required_for_status(target) {
        Some(action) => require(actor, action)?,
        None => {
            return Err(TransitionError::InvalidTransition {
                from: order.status,
                to: target,
            });
        }
    }
    if !order.status.can_transition_to(target) {
        return Err(TransitionError::InvalidTransition {
            from: order.status,
            to: target,
        });
    }

    let at = now.max(order.last_transition_at());
    match target {
        OrderStatus::Confirmed => order.confirmed_at = Some(at),
        OrderStatus::Preparing => order.kitchen_started_at = Some(at),
        OrderStatus::Ready => order.ready_at = Some(at),
        OrderStatus::Completed => order.completed_at = Some(at),
        OrderStatus::Cancelled => {
            order.cancelled_at = Some(at);
            order.cancel_reason = reason.clone().filter(|r| !r.trim().is_empty());
        }
        OrderStatus::Pending => {}
    }

    order.status_history.push(StatusChange {
        from: order.status,
        to: target,
        actor_role: actor.role,
        actor_id: actor.id.clone(),
        at,
        reason,
    });
    order.status = target;
    order.updated_at = at.max(order.updated_at);

    promote_if_overdue(order, now, overdue_margin_ms);
    Ok(())
}

/// Manually set the stored priority
pub fn set_priority(
    order: &mut Order,
    priority: Priority,
    actor: &Actor,
    now: i64,
    overdue_margin_ms: i64,
) -> Result<(), TransitionError> {
    require(actor, Action::SetPriority)?;
    if order.status.is_terminal() {
        return Err(TransitionError::Terminal {
            status: order.status,
        });
    }
    order.priority = priority;
    order.updated_at = now.max(order.updated_at);
    promote_if_overdue(order, now, overdue_margin_ms);
    Ok(())
}

/// Append lines to an order that has not reached the kitchen yet
pub fn append_items(
    order: &mut Order,
    items: Vec<OrderItem>,
    actor: &Actor,
    now: i64,
) -> Result<(), TransitionError> {
    require(actor, Action::AppendItems)?;
    validate_items(&items)?;
    if !order.status.accepts_items() {
        return Err(TransitionError::ItemsLocked {
            status: order.status,
        });
    }
    order.items.extend(items);
    order.updated_at = now.max(order.updated_at);
    Ok(())
}

/// Raise an overdue order to at least `high`; never demotes
///
/// Returns whether the stored priority changed.
pub fn promote_if_overdue(order: &mut Order, now: i64, overdue_margin_ms: i64) -> bool {
    if !order.is_overdue(now, overdue_margin_ms) {
        return false;
    }
    let promoted = order.priority.promoted_to(Priority::OVERDUE_FLOOR);
    if promoted == order.priority {
        return false;
    }
    order.priority = promoted;
    order.updated_at = now.max(order.updated_at);
    true
}
