mod common;

use chrono::Duration;
use common::{funded_child, setup_json_env, total_of};
use starjar::{
    config::Config,
    core::services::NewInvestment,
    init,
    ledger::{ActivityCategory, EntryMode},
};

#[test]
fn family_month_smoke() {
    init();

    let (manager, clock, _store, config_manager) = setup_json_env();
    config_manager.save(&Config::default()).unwrap();

    let maya = funded_child(&manager, "Maya", 0);
    manager
        .record_activity(maya, "Fed the cat", 30, EntryMode::Earn, None)
        .unwrap();
    manager
        .record_activity(maya, "Kind to sister", 20, EntryMode::Earn, Some(ActivityCategory::Behavior))
        .unwrap();
    manager
        .create_investment(&NewInvestment {
            child_id: maya,
            bank_id: "mbank".into(),
            amount: 40,
            months: 1,
        })
        .unwrap();
    assert_eq!(total_of(&manager, maya), 10);

    clock.advance(Duration::days(30));
    let settled = manager.reconcile().unwrap();
    assert_eq!(settled.len(), 1);
    // 40 * 2.5% / 12 rounds up to one point
    assert_eq!(total_of(&manager, maya), 51);
    assert!(manager.verify().unwrap().is_empty());
}
