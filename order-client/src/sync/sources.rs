//! Projection sources backed by [`OrderClient`]

use async_trait::async_trait;
use shared::order::{KitchenQueue, OrderTracker, ServerDashboard};

use super::poller::ProjectionSource;
use crate::{ClientResult, OrderClient};

/// `GET /orders/kitchen_queue`
#[derive(Debug, Clone)]
pub struct KitchenQueueSource {
    client: OrderClient,
}

impl KitchenQueueSource {
    pub fn new(client: OrderClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProjectionSource for KitchenQueueSource {
    type Projection = KitchenQueue;

    async fn fetch(&self) -> ClientResult<KitchenQueue> {
        self.client.kitchen_queue().await
    }
}

/// `GET /orders/{id}` for one customer order
#[derive(Debug, Clone)]
pub struct TrackerSource {
    client: OrderClient,
    order_id: String,
}

impl TrackerSource {
    pub fn new(client: OrderClient, order_id: impl Into<String>) -> Self {
        Self {
            client,
            order_id: order_id.into(),
        }
    }
}

#[async_trait]
impl ProjectionSource for TrackerSource {
    type Projection = OrderTracker;

    async fn fetch(&self) -> ClientResult<OrderTracker> {
        self.client.get_order(&self.order_id).await
    }
}

/// `GET /orders/server_dashboard`; no tables means the caller's assignment
#[derive(Debug, Clone)]
pub struct DashboardSource {
    client: OrderClient,
    tables: Option<Vec<u32>>,
}

impl DashboardSource {
    pub fn new(client: OrderClient, tables: Option<Vec<u32>>) -> Self {
        Self { client, tables }
    }
}

#[async_trait]
impl ProjectionSource for DashboardSource {
    type Projection = ServerDashboard;

    async fn fetch(&self) -> ClientResult<ServerDashboard> {
        self.client.server_dashboard(self.tables.as_deref()).await
    }
}
