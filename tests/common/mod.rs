#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc, sync::Mutex};

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use starjar::{
    config::ConfigManager,
    core::{FixedClock, LedgerManager},
    ledger::{Child, EntryMode},
    storage::{JsonStore, MemoryStore},
};
use tempfile::TempDir;
use uuid::Uuid;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}

pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates an isolated manager over a JSON store with a controllable clock.
pub fn setup_json_env() -> (LedgerManager, Arc<FixedClock>, JsonStore, ConfigManager) {
    let base = temp_base();
    let store = JsonStore::new(base.join("data"), Some(3)).expect("create json store");
    let clock = Arc::new(FixedClock::new(start_time()));
    let manager = LedgerManager::with_clock(Box::new(store.clone()), clock.clone());
    let config_manager =
        ConfigManager::with_base_dir(base).expect("create config manager for temp dir");
    (manager, clock, store, config_manager)
}

pub fn setup_memory_env() -> (LedgerManager, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(start_time()));
    let manager = LedgerManager::with_clock(Box::new(MemoryStore::new()), clock.clone());
    (manager, clock)
}

/// Adds a child and awards them `points`.
pub fn funded_child(manager: &LedgerManager, name: &str, points: i64) -> Uuid {
    let id = manager.add_child(Child::new(name)).expect("add child");
    if points > 0 {
        manager
            .record_activity(id, "Starting balance", points, EntryMode::Earn, None)
            .expect("fund child");
    }
    id
}

pub fn total_of(manager: &LedgerManager, child: Uuid) -> i64 {
    manager
        .snapshot()
        .expect("snapshot")
        .child(child)
        .expect("child present")
        .total_points
}
