use super::*;
use super::super::machine::TransitionError;

mod test_core;

const MINUTE: i64 = 60_000;

fn create_test_manager() -> OrdersManager {
    let storage = OrderStorage::open_in_memory().unwrap();
    OrdersManager::new(storage, OrderTimingConfig::default())
}

fn customer(id: &str) -> Actor {
    Actor::new(id, Role::Customer)
}

fn kitchen() -> Actor {
    Actor::new("chef-1", Role::Kitchen)
}

fn service() -> Actor {
    Actor::new("srv-1", Role::Service)
}

fn item(id: &str, quantity: u32) -> OrderItem {
    OrderItem {
        menu_item_id: id.to_string(),
        quantity,
        unit_price: 6.5,
        name: None,
    }
}

fn dine_in(table: u32, items: Vec<OrderItem>) -> PlaceOrderRequest {
    PlaceOrderRequest {
        items,
        is_takeout: false,
        table_number: Some(table),
        kitchen_notes: None,
        customer_name: Some("Dana".to_string()),
    }
}

fn place(manager: &OrdersManager, actor: &Actor, table: u32) -> Order {
    manager
        .place_order(dine_in(table, vec![item("burger", 2)]), actor, 0)
        .unwrap()
}
