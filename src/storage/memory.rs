use std::{
    collections::BTreeMap,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    errors::LedgerError,
    ledger::{ActivityLog, Child, Investment, Ledger},
};

use super::{Result, StateStore};

#[derive(Debug, Default, Clone)]
struct MemoryState {
    ledger: Ledger,
    bank_rates: BTreeMap<String, f64>,
    api_key: Option<String>,
}

/// Volatile store used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                ledger,
                ..MemoryState::default()
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|_| LedgerError::Persistence("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|_| LedgerError::Persistence("memory store lock poisoned".into()))
    }
}

impl StateStore for MemoryStore {
    fn children(&self) -> Result<Vec<Child>> {
        Ok(self.read()?.ledger.children.clone())
    }

    fn save_children(&self, children: &[Child]) -> Result<()> {
        self.write()?.ledger.children = children.to_vec();
        Ok(())
    }

    fn logs(&self) -> Result<Vec<ActivityLog>> {
        Ok(self.read()?.ledger.logs.clone())
    }

    fn save_logs(&self, logs: &[ActivityLog]) -> Result<()> {
        self.write()?.ledger.logs = logs.to_vec();
        Ok(())
    }

    fn investments(&self) -> Result<Vec<Investment>> {
        Ok(self.read()?.ledger.investments.clone())
    }

    fn save_investments(&self, investments: &[Investment]) -> Result<()> {
        self.write()?.ledger.investments = investments.to_vec();
        Ok(())
    }

    fn bank_rates(&self) -> Result<BTreeMap<String, f64>> {
        Ok(self.read()?.bank_rates.clone())
    }

    fn save_bank_rates(&self, rates: &BTreeMap<String, f64>) -> Result<()> {
        self.write()?.bank_rates = rates.clone();
        Ok(())
    }

    fn api_key(&self) -> Result<Option<String>> {
        Ok(self.read()?.api_key.clone())
    }

    fn save_api_key(&self, key: Option<&str>) -> Result<()> {
        self.write()?.api_key = key.map(str::to_string);
        Ok(())
    }

    fn load_ledger(&self) -> Result<Ledger> {
        Ok(self.read()?.ledger.clone())
    }

    fn commit(&self, ledger: &Ledger) -> Result<()> {
        self.write()?.ledger = ledger.clone();
        Ok(())
    }
}
