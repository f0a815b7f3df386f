// order-client/tests/client_integration.rs
// 集成测试 - 在随机端口启动 order-server，通过真实 HTTP 调用

use std::time::Duration;

use order_client::sync::{ChangeSet, ChangeSink, PollOutcome, kitchen_poller};
use order_client::{
    ClientConfig, MemorySessionStore, OrderClient, PollIntervals, Session,
};
use order_server::{Config, ServerState, build_app};
use shared::error::ErrorCode;
use shared::models::Role;
use shared::order::{KitchenQueue, OrderItem, OrderStatus};

struct TestServer {
    state: ServerState,
    base_url: String,
    _dir: tempfile::TempDir,
}

async fn start_server() -> TestServer {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::with_overrides(dir.path().to_string_lossy().to_string(), 0);
    let state = ServerState::initialize(&config).unwrap();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_app(&state).with_state(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        state,
        base_url: format!("http://{}", addr),
        _dir: dir,
    }
}

impl TestServer {
    fn client(&self, id: &str, role: Role) -> OrderClient {
        let token = self.state.jwt_service.generate_token(id, id, role).unwrap();
        OrderClient::new(&ClientConfig::new(&self.base_url).with_token(token)).unwrap()
    }
}

fn burger(quantity: u32) -> OrderItem {
    OrderItem {
        menu_item_id: "burger".to_string(),
        quantity,
        unit_price: 8.5,
        name: Some("Burger".to_string()),
    }
}

#[derive(Default)]
struct CollectingSink {
    batches: Vec<ChangeSet>,
}

impl ChangeSink<KitchenQueue> for CollectingSink {
    fn apply(&mut self, changes: &ChangeSet, _projection: &KitchenQueue) -> anyhow::Result<()> {
        self.batches.push(changes.clone());
        Ok(())
    }
}

#[tokio::test]
async fn test_place_and_track_through_session() {
    let server = start_server().await;
    let customer = server.client("cust-1", Role::Customer);
    let kitchen = server.client("chef-1", Role::Kitchen);

    let mut session = Session::open(MemorySessionStore::new()).unwrap();
    session.add_to_cart(burger(2)).unwrap();
    session.select_table(6).unwrap();

    let placed = customer
        .place_order(&session.context().to_order_request(None))
        .await
        .unwrap();
    assert_eq!(placed.order.status, OrderStatus::Pending);
    session.record_order(placed.order.id.clone()).unwrap();

    kitchen
        .set_status(&placed.order.id, OrderStatus::Confirmed)
        .await
        .unwrap();

    let tracker = session
        .revalidate_last_order(&customer)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tracker.order.status, OrderStatus::Confirmed);
    assert_eq!(tracker.progress_percentage, 25);

    // Skipping a step is rejected with a specific code
    let err = kitchen
        .set_status(&placed.order.id, OrderStatus::Ready)
        .await
        .unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.code(), Some(ErrorCode::InvalidTransition));
}

#[tokio::test]
async fn test_stale_last_order_is_forgotten() {
    let server = start_server().await;
    let customer = server.client("cust-1", Role::Customer);

    let store = MemorySessionStore::new();
    let mut session = Session::open(store.clone()).unwrap();
    session.record_order("no-such-order").unwrap();

    let tracker = session.revalidate_last_order(&customer).await.unwrap();
    assert!(tracker.is_none());
    assert_eq!(store.stored().unwrap().last_order_id, None);
}

#[tokio::test]
async fn test_kitchen_poller_sees_new_and_moved_orders() {
    let server = start_server().await;
    let customer = server.client("cust-1", Role::Customer);
    let kitchen = server.client("chef-1", Role::Kitchen);

    let mut poller = kitchen_poller(
        kitchen.clone(),
        &PollIntervals::default(),
        CollectingSink::default(),
    );
    assert_eq!(poller.interval(), Duration::from_secs(15));

    // Empty queue still renders once
    assert_eq!(poller.tick().await, PollOutcome::Applied { changes: 0 });
    assert_eq!(poller.tick().await, PollOutcome::Unchanged);

    let placed = customer
        .place_order(&shared::order::PlaceOrderRequest {
            items: vec![burger(1)],
            is_takeout: true,
            table_number: None,
            kitchen_notes: None,
            customer_name: None,
        })
        .await
        .unwrap();
    assert_eq!(poller.tick().await, PollOutcome::Applied { changes: 1 });

    kitchen
        .set_status(&placed.order.id, OrderStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(poller.tick().await, PollOutcome::Applied { changes: 1 });
    let last = poller.sink().batches.last().unwrap();
    assert_eq!(last.status_changes[0].from, OrderStatus::Pending);
    assert_eq!(last.status_changes[0].to, OrderStatus::Confirmed);

    kitchen.cancel(&placed.order.id, "out of buns").await.unwrap();
    assert_eq!(poller.tick().await, PollOutcome::Applied { changes: 1 });
    let last = poller.sink().batches.last().unwrap();
    assert_eq!(last.removed, vec![placed.order.id.clone()]);
}

#[tokio::test]
async fn test_customer_cannot_read_kitchen_queue() {
    let server = start_server().await;
    let customer = server.client("cust-1", Role::Customer);

    let err = customer.kitchen_queue().await.unwrap_err();
    assert!(err.is_forbidden());

    let health = customer.health().await.unwrap();
    assert_eq!(health["status"], "ok");
}
