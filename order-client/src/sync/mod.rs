//! Polling Synchronizer
//!
//! One [`Poller`] per consuming view, parameterized by interval and
//! [`ProjectionSource`]. Each cycle diffs the fresh projection against the
//! last rendered [`Snapshot`] and hands the [`ChangeSet`] to a [`ChangeSink`].
//!
//! | View | Source | Default interval |
//! |------|--------|------------------|
//! | customer tracker | [`TrackerSource`] | 3s |
//! | kitchen queue | [`KitchenQueueSource`] | 15s |
//! | server dashboard | [`DashboardSource`] | 30s |

mod change;
mod poller;
mod sources;

pub use change::{ChangeSet, Snapshot, StatusDelta, Tracked};
pub use poller::{
    ChangeSink, DEFAULT_STALE_AFTER, PollControl, PollOutcome, Poller, ProjectionSource,
};
pub use sources::{DashboardSource, KitchenQueueSource, TrackerSource};

use crate::{OrderClient, PollIntervals};

/// Poller for the customer tracker of one order
pub fn tracker_poller<K>(
    client: OrderClient,
    order_id: impl Into<String>,
    intervals: &PollIntervals,
    sink: K,
) -> Poller<TrackerSource, K>
where
    K: ChangeSink<shared::order::OrderTracker>,
{
    Poller::new(
        "customer_tracker",
        TrackerSource::new(client, order_id),
        sink,
        intervals.customer,
    )
}

pub fn kitchen_poller<K>(
    client: OrderClient,
    intervals: &PollIntervals,
    sink: K,
) -> Poller<KitchenQueueSource, K>
where
    K: ChangeSink<shared::order::KitchenQueue>,
{
    Poller::new(
        "kitchen_queue",
        KitchenQueueSource::new(client),
        sink,
        intervals.kitchen,
    )
}

pub fn dashboard_poller<K>(
    client: OrderClient,
    tables: Option<Vec<u32>>,
    intervals: &PollIntervals,
    sink: K,
) -> Poller<DashboardSource, K>
where
    K: ChangeSink<shared::order::ServerDashboard>,
{
    Poller::new(
        "server_dashboard",
        DashboardSource::new(client, tables),
        sink,
        intervals.server,
    )
}
