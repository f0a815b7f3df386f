//! HTTP 端到端测试
//!
//! 通过 OneshotRouter 在进程内驱动完整路由 (含中间件)，
//! 使用临时工作目录和 JwtService 签发的令牌。

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};

use order_server::inventory::ledger::LedgerResult;
use order_server::inventory::{DeductionWorker, InventoryLedger, LedgerError};
use order_server::orders::storage::PendingDeduction;
use order_server::{Config, OneshotRouter, ServerState, build_app};
use shared::inventory::{StockLevel, StockUpdate};
use shared::models::Role;
use shared::util::now_millis;

struct TestApp {
    state: ServerState,
    _dir: tempfile::TempDir,
}

impl TestApp {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0);
        let state = ServerState::initialize(&config).unwrap();
        Self { state, _dir: dir }
    }

    fn token(&self, id: &str, role: Role) -> String {
        self.state
            .jwt_service
            .generate_token(id, id, role)
            .unwrap()
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = build_app(&self.state)
            .oneshot_with(&self.state, request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}

fn stock(name: &str, on_hand: u32, threshold: u32) -> StockUpdate {
    StockUpdate {
        name: name.to_string(),
        on_hand,
        low_stock_threshold: threshold,
    }
}

fn order_body(menu_item_id: &str, quantity: u32) -> Value {
    json!({
        "items": [{ "menu_item_id": menu_item_id, "quantity": quantity, "unit_price": 9.5 }],
        "table_number": 4
    })
}

/// Ledger whose backing service is down
struct OfflineLedger;

#[async_trait]
impl InventoryLedger for OfflineLedger {
    async fn stock_level(&self, _menu_item_id: &str) -> LedgerResult<StockLevel> {
        Err(LedgerError::Unreachable("connection refused".to_string()))
    }

    async fn deduct(&self, _menu_item_id: &str, _quantity: u32) -> LedgerResult<StockLevel> {
        Err(LedgerError::Unreachable("connection refused".to_string()))
    }
}

#[tokio::test]
async fn test_placement_is_never_blocked_by_inventory() {
    let app = TestApp::new();
    app.state.stock.set_level("A", stock("Burger", 1, 0)).unwrap();
    let customer = app.token("cust-1", Role::Customer);

    // Short on stock: created, flagged unavailable
    let (status, body) = app
        .call("POST", "/orders", Some(&customer), Some(order_body("A", 5)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["inventory"]["available"], false);
    assert_eq!(body["inventory"]["unavailable_items"], json!(["Burger"]));
    assert_eq!(body["admission_degraded"], false);

    // Unknown to the ledger: created, flagged by menu item id
    let (status, body) = app
        .call("POST", "/orders", Some(&customer), Some(order_body("mystery", 1)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["inventory"]["available"], false);
    assert_eq!(body["inventory"]["unavailable_items"], json!(["mystery"]));
    assert_eq!(body["admission_degraded"], false);

    // Ledger down: created with optimistic defaults
    let TestApp { state, _dir } = app;
    let app = TestApp {
        state: state.with_ledger(Arc::new(OfflineLedger)),
        _dir,
    };
    let (status, body) = app
        .call("POST", "/orders", Some(&customer), Some(order_body("A", 5)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["admission_degraded"], true);
    assert_eq!(body["inventory"]["available"], true);
    assert_eq!(body["inventory"]["estimated_delay_minutes"], 0);

    let (_, body) = app.call("GET", "/health/detailed", None, None).await;
    assert_eq!(body["checks"]["storage_stats"]["active_order_count"], 3);
}

#[tokio::test]
async fn test_full_lifecycle_over_http() {
    let app = TestApp::new();
    app.state.stock.set_level("A", stock("Burger", 10, 3)).unwrap();
    let customer = app.token("cust-1", Role::Customer);
    let kitchen = app.token("chef-1", Role::Kitchen);

    let (status, body) = app
        .call("POST", "/orders", Some(&customer), Some(order_body("A", 2)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["inventory"]["available"], true);
    assert_eq!(body["admission_degraded"], false);
    let id = body["order"]["id"].as_str().unwrap().to_string();
    assert!(
        body["order"]["order_number"]
            .as_str()
            .unwrap()
            .starts_with("ORD-")
    );

    // Stock deduction is applied by the worker, not by placement
    assert_eq!(app.state.stock.get_level("A").unwrap().unwrap().on_hand, 10);
    DeductionWorker::new(
        app.state.storage.clone(),
        app.state.ledger.clone(),
        app.state.config.deduction.clone(),
    )
    .process_pending_queue(now_millis())
    .await;
    assert_eq!(app.state.stock.get_level("A").unwrap().unwrap().on_hand, 8);

    let uri = format!("/orders/{}", id);
    for target in ["confirmed", "preparing", "ready", "completed"] {
        let (status, body) = app
            .call("PATCH", &uri, Some(&kitchen), Some(json!({ "status": target })))
            .await;
        assert_eq!(status, StatusCode::OK, "transition to {}", target);
        assert_eq!(body["status"], target);
    }

    let (status, body) = app.call("GET", &uri, Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress_percentage"], 100);
    assert!(body["order"]["confirmed_at"].is_i64());
    assert!(body["order"]["kitchen_started_at"].is_i64());
    assert!(body["order"]["ready_at"].is_i64());
    assert!(body["order"]["completed_at"].is_i64());

    // Terminal: any further transition is rejected
    let (status, body) = app
        .call("PATCH", &uri, Some(&kitchen), Some(json!({ "status": "cancelled" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4002);

    let (status, body) = app
        .call("GET", &format!("{}/history", uri), Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_error_statuses() {
    let app = TestApp::new();
    let customer = app.token("cust-1", Role::Customer);
    let other = app.token("cust-2", Role::Customer);
    let kitchen = app.token("chef-1", Role::Kitchen);

    // 401 without a token
    let (status, body) = app.call("GET", "/orders/kitchen_queue", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1001);

    // 404 unknown order
    let (status, _) = app
        .call("GET", "/orders/does-not-exist", Some(&kitchen), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 422 empty item list
    let (status, body) = app
        .call("POST", "/orders", Some(&customer), Some(json!({ "items": [], "is_takeout": true })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 4005);

    // 422 malformed line
    let (status, _) = app
        .call(
            "POST",
            "/orders",
            Some(&customer),
            Some(json!({ "items": [{ "menu_item_id": "A", "quantity": -1 }] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (_, body) = app
        .call("POST", "/orders", Some(&customer), Some(order_body("A", 1)))
        .await;
    let uri = format!("/orders/{}", body["order"]["id"].as_str().unwrap());

    // 403 customer cannot confirm, order unchanged
    let (status, body) = app
        .call("PATCH", &uri, Some(&customer), Some(json!({ "status": "confirmed" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2002);

    // 409 skipping a step
    let (status, _) = app
        .call("PATCH", &uri, Some(&kitchen), Some(json!({ "status": "ready" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // 400 both status and priority
    let (status, _) = app
        .call(
            "PATCH",
            &uri,
            Some(&kitchen),
            Some(json!({ "status": "confirmed", "priority": "high" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Another customer cannot see the order
    let (status, _) = app.call("GET", &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, body) = app
        .call("PATCH", &uri, Some(&other), Some(json!({ "status": "cancelled" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);

    // 422 quantity above the per-item cap, even when split across lines
    let (status, body) = app
        .call(
            "POST",
            "/orders",
            Some(&customer),
            Some(json!({
                "items": [
                    { "menu_item_id": "A", "quantity": 3_000_000_000u32, "unit_price": 1.0 },
                    { "menu_item_id": "A", "quantity": 3_000_000_000u32, "unit_price": 1.0 }
                ],
                "table_number": 4
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 4005);

    let (status, body) = app.call("GET", &uri, Some(&customer), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["order"]["status"], "pending");
    assert_eq!(body["estimated_time"], "5-10 minutes");
}

#[tokio::test]
async fn test_kitchen_queue_and_dashboard() {
    let app = TestApp::new();
    let customer = app.token("cust-1", Role::Customer);
    let kitchen = app.token("chef-1", Role::Kitchen);
    let service = app.token("srv-1", Role::Service);

    app.call("POST", "/orders", Some(&customer), Some(order_body("A", 1)))
        .await;
    let (_, body) = app
        .call("POST", "/orders", Some(&customer), Some(order_body("B", 1)))
        .await;
    let second = body["order"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(
            "PATCH",
            &format!("/orders/{}", second),
            Some(&kitchen),
            Some(json!({ "priority": "urgent" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .call("GET", "/orders/kitchen_queue", Some(&kitchen), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["order"]["id"], second.as_str());

    let (status, _) = app
        .call("GET", "/orders/kitchen_queue", Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call("GET", "/orders/kitchen_stats", Some(&kitchen), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active_orders"], 2);
    assert_eq!(body["pending_items"], 2);
    assert_eq!(body["completed_today"], 0);
    assert!(body["average_prep_minutes"].is_null());
    let (status, _) = app
        .call("GET", "/orders/kitchen_stats", Some(&customer), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Dashboard defaults to the caller's assignment
    let (status, body) = app
        .call("PUT", "/tables/assignments", Some(&service), Some(json!({ "tables": [4, 2, 4] })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tables"], json!([2, 4]));

    let (status, body) = app
        .call("GET", "/orders/server_dashboard", Some(&service), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let tables = body["tables"].as_array().unwrap();
    assert_eq!(tables.len(), 2);
    let table4 = tables.iter().find(|t| t["table_number"] == 4).unwrap();
    assert_eq!(table4["orders"].as_array().unwrap().len(), 2);

    let (status, _) = app
        .call("GET", "/orders/server_dashboard?tables=x", Some(&service), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_inventory_endpoints() {
    let app = TestApp::new();
    let customer = app.token("cust-1", Role::Customer);
    let kitchen = app.token("chef-1", Role::Kitchen);

    let (status, _) = app
        .call(
            "PUT",
            "/inventory/items/A",
            Some(&customer),
            Some(json!({ "name": "Burger", "on_hand": 5, "low_stock_threshold": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            "PUT",
            "/inventory/items/A",
            Some(&kitchen),
            Some(json!({ "name": "Burger", "on_hand": 5, "low_stock_threshold": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["on_hand"], 5);

    let check = json!({ "items": [{ "menu_item_id": "A", "quantity": 5 }] });
    let (status, body) = app
        .call("POST", "/inventory/check-availability", Some(&customer), Some(check.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["available"], true);
    assert_eq!(body["low_stock_warnings"].as_array().unwrap().len(), 1);

    let (status, body) = app
        .call("POST", "/inventory/estimate-delay", Some(&customer), Some(check))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["estimated_delay_minutes"].as_u64().unwrap() > 0);

    let (status, body) = app.call("GET", "/inventory/alerts", Some(&kitchen), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["kind"], "low_stock");
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();

    let (status, body) = app.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app.call("GET", "/health/detailed", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["checks"]["storage"]["status"], "ok");
    assert_eq!(body["checks"]["storage_stats"]["order_count"], 0);
    assert_eq!(body["checks"]["deductions"]["status"], "ok");
    assert!(body["checks"]["dead_letters"].is_null());

    // A deduction that gave up shows up until it is recovered
    let deduction = PendingDeduction::new("order-1", [("A".to_string(), 2)]);
    let txn = app.state.storage.begin_write().unwrap();
    app.state.storage.queue_deduction_txn(&txn, &deduction).unwrap();
    txn.commit().unwrap();
    app.state
        .storage
        .move_to_dead_letter(&deduction, "ledger down")
        .unwrap();

    let (_, body) = app.call("GET", "/health/detailed", None, None).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["deductions"]["status"], "error");
    assert_eq!(body["checks"]["dead_letters"][0]["order_id"], "order-1");
    assert_eq!(body["checks"]["dead_letters"][0]["last_error"], "ledger down");
}
