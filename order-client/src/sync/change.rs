//! Snapshot diffing
//!
//! A [`Snapshot`] remembers `order id → (status, updated_at)` of the last
//! rendered projection. Diffing a fresh projection against it yields a
//! [`ChangeSet`].

use std::collections::BTreeMap;

use shared::order::{KitchenQueue, Order, OrderStatus, OrderTracker, ServerDashboard};

/// Projection whose orders can be tracked between polls
pub trait Tracked {
    fn tracked_orders(&self) -> Vec<&Order>;
}

impl Tracked for KitchenQueue {
    fn tracked_orders(&self) -> Vec<&Order> {
        self.entries.iter().map(|e| &e.order).collect()
    }
}

impl Tracked for OrderTracker {
    fn tracked_orders(&self) -> Vec<&Order> {
        vec![&self.order]
    }
}

impl Tracked for ServerDashboard {
    fn tracked_orders(&self) -> Vec<&Order> {
        self.orders().collect()
    }
}

impl Tracked for Vec<Order> {
    fn tracked_orders(&self) -> Vec<&Order> {
        self.iter().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Seen {
    status: OrderStatus,
    updated_at: i64,
}

/// Last successfully rendered state of a projection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    orders: BTreeMap<String, Seen>,
}

impl Snapshot {
    pub fn of<P: Tracked + ?Sized>(projection: &P) -> Self {
        let orders = projection
            .tracked_orders()
            .into_iter()
            .map(|o| {
                (
                    o.id.clone(),
                    Seen {
                        status: o.status,
                        updated_at: o.updated_at,
                    },
                )
            })
            .collect();
        Self { orders }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn contains(&self, order_id: &str) -> bool {
        self.orders.contains_key(order_id)
    }

    /// Changes from this snapshot to `projection`
    pub fn diff<P: Tracked + ?Sized>(&self, projection: &P) -> ChangeSet {
        let current = projection.tracked_orders();
        let mut changes = ChangeSet::default();

        for order in &current {
            match self.orders.get(&order.id) {
                None => changes.added.push((*order).clone()),
                Some(seen) if seen.status != order.status => {
                    changes.status_changes.push(StatusDelta {
                        order_id: order.id.clone(),
                        from: seen.status,
                        to: order.status,
                    });
                    changes.updated.push((*order).clone());
                }
                Some(seen) if seen.updated_at != order.updated_at => {
                    changes.updated.push((*order).clone());
                }
                Some(_) => {}
            }
        }

        changes.removed = self
            .orders
            .keys()
            .filter(|id| !current.iter().any(|o| &o.id == *id))
            .cloned()
            .collect();
        changes
    }
}

/// Status move of one order between two polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusDelta {
    pub order_id: String,
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Difference between the last rendered snapshot and a fresh projection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Orders not present in the previous snapshot
    pub added: Vec<Order>,
    /// Ids that dropped out of the projection's filter
    pub removed: Vec<String>,
    /// Orders whose status or `updated_at` changed
    pub updated: Vec<Order>,
    pub status_changes: Vec<StatusDelta>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    /// Number of orders touched
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.updated.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fixtures::order;

    #[test]
    fn test_first_diff_adds_everything() {
        let current = vec![
            order("a", OrderStatus::Pending, 1),
            order("b", OrderStatus::Confirmed, 1),
        ];
        let changes = Snapshot::default().diff(&current);
        assert_eq!(changes.added.len(), 2);
        assert!(changes.removed.is_empty());
        assert!(changes.status_changes.is_empty());
    }

    #[test]
    fn test_diff_detects_status_removal_and_touch() {
        let before = vec![
            order("a", OrderStatus::Pending, 1),
            order("b", OrderStatus::Confirmed, 1),
            order("c", OrderStatus::Preparing, 1),
        ];
        let snapshot = Snapshot::of(&before);

        let after = vec![
            order("a", OrderStatus::Confirmed, 2),
            order("c", OrderStatus::Preparing, 5),
            order("d", OrderStatus::Pending, 5),
        ];
        let changes = snapshot.diff(&after);

        assert_eq!(changes.added.len(), 1);
        assert_eq!(changes.added[0].id, "d");
        assert_eq!(changes.removed, vec!["b".to_string()]);
        assert_eq!(
            changes.status_changes,
            vec![StatusDelta {
                order_id: "a".to_string(),
                from: OrderStatus::Pending,
                to: OrderStatus::Confirmed,
            }]
        );
        // "c" changed priority only: updated, no status delta
        assert_eq!(changes.updated.len(), 2);
        assert_eq!(changes.len(), 4);
    }

    #[test]
    fn test_identical_projection_yields_empty_change_set() {
        let current = vec![order("a", OrderStatus::Ready, 9)];
        let snapshot = Snapshot::of(&current);
        let first = snapshot.diff(&current);
        let second = snapshot.diff(&current);
        assert!(first.is_empty());
        assert_eq!(first, second);
        assert_eq!(first.len(), 0);
    }
}
