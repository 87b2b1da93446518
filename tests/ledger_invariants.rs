mod common;

use common::{funded_child, setup_memory_env, total_of};
use starjar::{
    core::services::ServiceError,
    ledger::{ActivityCategory, ActivityLog, EntryMode},
};

#[test]
fn mixed_edits_keep_totals_equal_to_history() {
    let (manager, _) = setup_memory_env();
    let alice = funded_child(&manager, "Alice", 0);
    let bob = funded_child(&manager, "Bob", 0);

    let mut ids = Vec::new();
    for (index, points) in [12, 7, -3, 25, -10, 4].into_iter().enumerate() {
        let owner = if index % 2 == 0 { alice } else { bob };
        let entry = ActivityLog::new(owner, format!("entry {index}"), points, ActivityCategory::Other);
        ids.push(manager.add_entry(entry).unwrap());
    }

    let ledger = manager.snapshot().unwrap();
    let mut edited = ledger.log(ids[1]).unwrap().clone();
    edited.points = 30;
    edited.child_id = alice;
    manager.update_entry(edited).unwrap();

    let mut edited = ledger.log(ids[4]).unwrap().clone();
    edited.points = -1;
    manager.update_entry(edited).unwrap();

    manager.delete_entry(ids[3]).unwrap();
    manager.delete_entry(ids[0]).unwrap();

    let ledger = manager.snapshot().unwrap();
    for child in &ledger.children {
        assert_eq!(Some(child.total_points), ledger.balance_of(child.id), "{}", child.name);
    }
    assert_eq!(total_of(&manager, alice), 30 - 3 - 1);
    assert_eq!(total_of(&manager, bob), 4);
    assert!(manager.verify().unwrap().is_empty());
}

#[test]
fn deleting_a_child_leaves_no_orphans() {
    let (manager, _) = setup_memory_env();
    let alice = funded_child(&manager, "Alice", 100);
    let bob = funded_child(&manager, "Bob", 40);
    manager
        .create_investment(&starjar::core::services::NewInvestment {
            child_id: alice,
            bank_id: "cbank".into(),
            amount: 60,
            months: 6,
        })
        .unwrap();

    let removal = manager.remove_child(alice).unwrap();
    assert_eq!(removal.logs_removed, 2);
    assert_eq!(removal.investments_removed, 1);

    let ledger = manager.snapshot().unwrap();
    assert!(ledger.logs.iter().all(|log| log.child_id == bob));
    assert!(ledger.investments.is_empty());
    assert!(manager.verify().unwrap().is_empty());
}

#[test]
fn missing_entities_are_reported_and_change_nothing() {
    let (manager, _) = setup_memory_env();
    let alice = funded_child(&manager, "Alice", 10);
    let before = manager.snapshot().unwrap();

    let ghost = ActivityLog::new(alice, "ghost", 5, ActivityCategory::Chore);
    assert!(manager.update_entry(ghost.clone()).unwrap_err().is_not_found());
    assert!(manager.delete_entry(ghost.id).unwrap_err().is_not_found());
    assert!(manager.remove_child(uuid::Uuid::new_v4()).unwrap_err().is_not_found());

    assert_eq!(manager.snapshot().unwrap(), before);
}

#[test]
fn redemption_larger_than_balance_is_refused() {
    let (manager, _) = setup_memory_env();
    let alice = funded_child(&manager, "Alice", 20);
    let err = manager
        .record_activity(alice, "Video game", 21, EntryMode::Redeem, None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));

    let entry = manager
        .record_activity(alice, "Sticker", 20, EntryMode::Redeem, None)
        .unwrap();
    assert_eq!(entry.points, -20);
    assert_eq!(entry.category, ActivityCategory::Redemption);
    assert_eq!(total_of(&manager, alice), 0);
}

#[test]
fn child_order_is_persisted() {
    let (manager, _) = setup_memory_env();
    let alice = funded_child(&manager, "Alice", 0);
    let bob = funded_child(&manager, "Bob", 0);
    let carol = funded_child(&manager, "Carol", 0);

    manager.move_child(carol, 0).unwrap();
    manager.move_child(alice, 1).unwrap();

    let order: Vec<_> = manager
        .snapshot()
        .unwrap()
        .children
        .iter()
        .map(|child| child.id)
        .collect();
    assert_eq!(order, vec![carol, alice, bob]);
}

#[test]
fn totals_past_the_integer_range_are_rejected() {
    let (manager, _) = setup_memory_env();
    let alice = funded_child(&manager, "Alice", 0);
    manager
        .record_activity(alice, "Jackpot", i64::MAX, EntryMode::Earn, None)
        .unwrap();
    let before = manager.snapshot().unwrap();

    let err = manager
        .record_activity(alice, "One more", 1, EntryMode::Earn, None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));
    assert_eq!(manager.snapshot().unwrap(), before);
    assert_eq!(total_of(&manager, alice), i64::MAX);
}

#[test]
fn smallest_integer_cannot_be_redeemed() {
    let (manager, _) = setup_memory_env();
    let alice = funded_child(&manager, "Alice", 20);
    let before = manager.snapshot().unwrap();

    let err = manager
        .record_activity(alice, "Everything", i64::MIN, EntryMode::Redeem, None)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Invalid(_)));
    assert_eq!(manager.snapshot().unwrap(), before);
}
