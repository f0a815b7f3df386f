use super::*;

#[test]
fn test_place_order_persists_and_numbers() {
    let manager = create_test_manager();
    let first = place(&manager, &customer("c1"), 1);
    let second = place(&manager, &customer("c1"), 2);

    assert_eq!(first.status, OrderStatus::Pending);
    assert!(first.order_number.starts_with("ORD-"));
    assert!(first.order_number.ends_with("-0001"));
    assert!(second.order_number.ends_with("-0002"));

    let stored = manager.get_order(&first.id).unwrap();
    assert_eq!(stored, first);
    assert_eq!(manager.active_orders().unwrap().len(), 2);
}

#[test]
fn test_order_number_resets_per_day() {
    let manager = create_test_manager();
    let day1 = 1_735_689_600_000; // 2025-01-01T00:00:00Z
    let a = manager
        .place_order_at(dine_in(1, vec![item("tea", 1)]), &customer("c1"), 0, day1)
        .unwrap();
    let b = manager
        .place_order_at(
            dine_in(1, vec![item("tea", 1)]),
            &customer("c1"),
            0,
            day1 + 24 * 60 * MINUTE,
        )
        .unwrap();
    assert_eq!(a.order_number, "ORD-20250101-0001");
    assert_eq!(b.order_number, "ORD-20250102-0001");
}

#[test]
fn test_place_order_queues_deduction() {
    let manager = create_test_manager();
    let order = manager
        .place_order(
            dine_in(3, vec![item("fries", 1), item("cola", 2), item("fries", 2)]),
            &customer("c1"),
            0,
        )
        .unwrap();

    let pending = manager.storage().get_pending_deductions().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].order_id, order.id);
    let fries = pending[0]
        .lines
        .iter()
        .find(|l| l.menu_item_id == "fries")
        .unwrap();
    assert_eq!(fries.quantity, 3);
}

#[test]
fn test_rejected_placement_leaves_no_trace() {
    let manager = create_test_manager();
    let err = manager
        .place_order(dine_in(3, vec![]), &customer("c1"), 0)
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Transition(TransitionError::InvalidItems(_))
    ));
    assert!(manager.active_orders().unwrap().is_empty());
    assert!(manager.storage().get_pending_deductions().unwrap().is_empty());
}

#[test]
fn test_oversized_duplicate_lines_are_rejected() {
    let manager = create_test_manager();
    let err = manager
        .place_order(
            dine_in(1, vec![item("burger", 3_000_000_000), item("burger", 3_000_000_000)]),
            &customer("c1"),
            0,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Transition(TransitionError::InvalidItems(_))
    ));
    assert!(manager.active_orders().unwrap().is_empty());
    assert!(manager.storage().get_pending_deductions().unwrap().is_empty());

    let order = place(&manager, &customer("c1"), 1);
    let err = manager
        .append_items(
            &order.id,
            vec![item("cola", 3_000_000_000), item("cola", 3_000_000_000)],
            &customer("c1"),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Transition(TransitionError::InvalidItems(_))
    ));
    assert_eq!(manager.get_order(&order.id).unwrap().items.len(), 1);
    assert_eq!(manager.storage().get_pending_deductions().unwrap().len(), 1);
}

#[test]
fn test_unknown_order_is_not_found() {
    let manager = create_test_manager();
    assert!(matches!(
        manager.get_order("missing"),
        Err(ManagerError::OrderNotFound(_))
    ));
    assert!(matches!(
        manager.transition("missing", OrderStatus::Confirmed, &kitchen(), None),
        Err(ManagerError::OrderNotFound(_))
    ));
}

#[test]
fn test_customers_only_see_their_own_orders() {
    let manager = create_test_manager();
    let order = place(&manager, &customer("c1"), 1);

    assert!(manager.get_order_for(&order.id, &customer("c1")).is_ok());
    assert!(matches!(
        manager.get_order_for(&order.id, &customer("c2")),
        Err(ManagerError::OrderNotFound(_))
    ));
    assert!(manager.get_order_for(&order.id, &kitchen()).is_ok());

    assert!(matches!(
        manager.append_items(&order.id, vec![item("cola", 1)], &customer("c2")),
        Err(ManagerError::OrderNotFound(_))
    ));

    // someone else's order looks missing; one's own order reports the missing capability
    assert!(matches!(
        manager.transition(&order.id, OrderStatus::Cancelled, &customer("c2"), None),
        Err(ManagerError::OrderNotFound(_))
    ));
    assert!(matches!(
        manager.set_priority(&order.id, Priority::Urgent, &customer("c2")),
        Err(ManagerError::OrderNotFound(_))
    ));
    assert!(matches!(
        manager.transition(&order.id, OrderStatus::Cancelled, &customer("c1"), None),
        Err(ManagerError::Transition(TransitionError::Forbidden { .. }))
    ));
    assert!(matches!(
        manager.set_priority(&order.id, Priority::Urgent, &customer("c1")),
        Err(ManagerError::Transition(TransitionError::Forbidden { .. }))
    ));
}

#[test]
fn test_rejected_transition_is_not_persisted() {
    let manager = create_test_manager();
    let order = place(&manager, &customer("c1"), 1);

    let err = manager
        .transition(&order.id, OrderStatus::Ready, &kitchen(), None)
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Transition(TransitionError::InvalidTransition { .. })
    ));
    assert_eq!(manager.get_order(&order.id).unwrap(), order);
}

#[test]
fn test_append_items_queues_second_deduction() {
    let manager = create_test_manager();
    let order = place(&manager, &customer("c1"), 1);
    let updated = manager
        .append_items(&order.id, vec![item("cola", 1)], &customer("c1"))
        .unwrap();
    assert_eq!(updated.items.len(), 2);
    assert_eq!(manager.storage().get_pending_deductions().unwrap().len(), 2);

    manager
        .transition(&order.id, OrderStatus::Confirmed, &kitchen(), None)
        .unwrap();
    manager
        .transition(&order.id, OrderStatus::Preparing, &kitchen(), None)
        .unwrap();
    let err = manager
        .append_items(&order.id, vec![item("cola", 1)], &customer("c1"))
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Transition(TransitionError::ItemsLocked { .. })
    ));
    assert_eq!(manager.storage().get_pending_deductions().unwrap().len(), 2);
}

#[test]
fn test_table_assignments() {
    let manager = create_test_manager();
    assert!(manager.assignment("srv-1").unwrap().tables.is_empty());
    let assignment = manager.assign_tables("srv-1", vec![4, 2, 4]).unwrap();
    assert_eq!(assignment.tables, vec![2, 4]);
    assert_eq!(manager.assignment("srv-1").unwrap().tables, vec![2, 4]);
    assert!(matches!(
        manager.assign_tables("srv-1", vec![0]),
        Err(ManagerError::InvalidTable(_))
    ));
}

#[test]
fn test_kitchen_load_counts_kitchen_statuses() {
    let manager = create_test_manager();
    let a = place(&manager, &customer("c1"), 1);
    place(&manager, &customer("c1"), 2);
    assert_eq!(manager.kitchen_load().unwrap(), 2);

    manager
        .transition(&a.id, OrderStatus::Cancelled, &service(), Some("duplicate".into()))
        .unwrap();
    assert_eq!(manager.kitchen_load().unwrap(), 1);
}
