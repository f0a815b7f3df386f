//! HTTP 客户端 - 订单服务 REST API
//!
//! 成功响应直接是 JSON 数据；失败响应是 [`ApiResponse`] 错误信封，
//! 解析为 [`ClientError::Api`]。

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::error::{ApiResponse, ErrorCode};
use shared::inventory::{
    DelayEstimate, InventoryAlert, InventoryCheckRequest, InventoryCheckResult, ItemRequest,
    StockLevel, StockUpdate,
};
use shared::order::{
    AppendItemsRequest, AssignTablesRequest, KitchenQueue, KitchenStats, Order, OrderItem,
    OrderStatus, OrderTracker, PlaceOrderRequest, PlaceOrderResponse, Priority, ServerDashboard,
    StatusChange, TableAssignment, UpdateOrderRequest,
};

use crate::{ClientConfig, ClientError, ClientResult};

/// 订单服务 HTTP 客户端
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct OrderClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl OrderClient {
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// 获取基础 URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let req = self.client.request(method, url);
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ClientResult<T> {
        let response = req.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await?;
        // 尝试解析为 API 错误响应
        match serde_json::from_str::<ApiResponse<()>>(&text) {
            Ok(body) => Err(ClientError::Api {
                status: status.as_u16(),
                code: body.code.and_then(|c| ErrorCode::try_from(c).ok()),
                message: body.message,
                details: body.details,
            }),
            Err(_) => Err(ClientError::Api {
                status: status.as_u16(),
                code: None,
                message: text,
                details: None,
            }),
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn with_body<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        self.send(self.request(method, path).json(body)).await
    }

    // ========== Orders ==========

    /// POST /orders
    pub async fn place_order(&self, req: &PlaceOrderRequest) -> ClientResult<PlaceOrderResponse> {
        self.with_body(Method::POST, "/orders", req).await
    }

    /// GET /orders/{id} - 顾客追踪视图
    pub async fn get_order(&self, order_id: &str) -> ClientResult<OrderTracker> {
        self.get(&format!("/orders/{}", order_id)).await
    }

    pub async fn order_history(&self, order_id: &str) -> ClientResult<Vec<StatusChange>> {
        self.get(&format!("/orders/{}/history", order_id)).await
    }

    pub async fn kitchen_queue(&self) -> ClientResult<KitchenQueue> {
        self.get("/orders/kitchen_queue").await
    }

    pub async fn kitchen_stats(&self) -> ClientResult<KitchenStats> {
        self.get("/orders/kitchen_stats").await
    }

    /// GET /orders/server_dashboard; `None` uses the caller's own assignment
    pub async fn server_dashboard(&self, tables: Option<&[u32]>) -> ClientResult<ServerDashboard> {
        match tables {
            Some(tables) => {
                let list = tables
                    .iter()
                    .map(|t| t.to_string())
                    .collect::<Vec<_>>()
                    .join(",");
                self.send(
                    self.request(Method::GET, "/orders/server_dashboard")
                        .query(&[("tables", list)]),
                )
                .await
            }
            None => self.get("/orders/server_dashboard").await,
        }
    }

    pub async fn update_order(
        &self,
        order_id: &str,
        req: &UpdateOrderRequest,
    ) -> ClientResult<Order> {
        self.with_body(Method::PATCH, &format!("/orders/{}", order_id), req)
            .await
    }

    pub async fn set_status(&self, order_id: &str, status: OrderStatus) -> ClientResult<Order> {
        self.update_order(order_id, &UpdateOrderRequest::status(status))
            .await
    }

    pub async fn cancel(&self, order_id: &str, reason: impl Into<String>) -> ClientResult<Order> {
        self.update_order(order_id, &UpdateOrderRequest::cancel(reason))
            .await
    }

    pub async fn set_priority(&self, order_id: &str, priority: Priority) -> ClientResult<Order> {
        self.update_order(order_id, &UpdateOrderRequest::priority(priority))
            .await
    }

    pub async fn append_items(&self, order_id: &str, items: Vec<OrderItem>) -> ClientResult<Order> {
        self.with_body(
            Method::POST,
            &format!("/orders/{}/items", order_id),
            &AppendItemsRequest { items },
        )
        .await
    }

    // ========== Inventory ==========

    pub async fn check_availability(
        &self,
        items: Vec<ItemRequest>,
    ) -> ClientResult<InventoryCheckResult> {
        self.with_body(
            Method::POST,
            "/inventory/check-availability",
            &InventoryCheckRequest { items },
        )
        .await
    }

    pub async fn estimate_delay(&self, items: Vec<ItemRequest>) -> ClientResult<DelayEstimate> {
        self.with_body(
            Method::POST,
            "/inventory/estimate-delay",
            &InventoryCheckRequest { items },
        )
        .await
    }

    pub async fn stock_levels(&self) -> ClientResult<Vec<StockLevel>> {
        self.get("/inventory/items").await
    }

    pub async fn set_stock(&self, menu_item_id: &str, update: &StockUpdate) -> ClientResult<StockLevel> {
        self.with_body(
            Method::PUT,
            &format!("/inventory/items/{}", menu_item_id),
            update,
        )
        .await
    }

    pub async fn inventory_alerts(&self) -> ClientResult<Vec<InventoryAlert>> {
        self.get("/inventory/alerts").await
    }

    // ========== Tables ==========

    pub async fn table_assignment(&self) -> ClientResult<TableAssignment> {
        self.get("/tables/assignments").await
    }

    pub async fn assign_tables(&self, tables: Vec<u32>) -> ClientResult<TableAssignment> {
        self.with_body(
            Method::PUT,
            "/tables/assignments",
            &AssignTablesRequest { tables },
        )
        .await
    }

    // ========== Health ==========

    pub async fn health(&self) -> ClientResult<serde_json::Value> {
        self.get("/health").await
    }
}
