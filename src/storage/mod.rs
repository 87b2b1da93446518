//! Persistence seam for the ledger collections.
//!
//! Every collection is stored under its own key, mirroring the browser storage
//! layout the data was first kept in. Services never touch a store directly;
//! [`crate::core::ledger_manager::LedgerManager`] loads a [`Ledger`] snapshot,
//! mutates a copy, and hands it back through [`StateStore::commit`].

pub mod json_backend;
pub mod memory;

use std::{collections::BTreeMap, path::PathBuf};

use crate::{
    errors::LedgerError,
    ledger::{ActivityLog, Child, Investment, Ledger},
};

pub use json_backend::{BackupInfo, JsonStore};
pub use memory::MemoryStore;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Keys of the persisted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Children,
    Logs,
    Investments,
    BankRates,
    ApiKey,
}

impl StoreKey {
    pub const ALL: [StoreKey; 5] = [
        StoreKey::Children,
        StoreKey::Logs,
        StoreKey::Investments,
        StoreKey::BankRates,
        StoreKey::ApiKey,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Children => "starjar_kids",
            StoreKey::Logs => "starjar_logs",
            StoreKey::Investments => "starjar_investments",
            StoreKey::BankRates => "starjar_bank_rates",
            StoreKey::ApiKey => "starjar_api_key",
        }
    }
}

/// Get/set access to each persisted collection.
pub trait StateStore: Send + Sync {
    fn children(&self) -> Result<Vec<Child>>;
    fn save_children(&self, children: &[Child]) -> Result<()>;
    fn logs(&self) -> Result<Vec<ActivityLog>>;
    fn save_logs(&self, logs: &[ActivityLog]) -> Result<()>;
    fn investments(&self) -> Result<Vec<Investment>>;
    fn save_investments(&self, investments: &[Investment]) -> Result<()>;
    fn bank_rates(&self) -> Result<BTreeMap<String, f64>>;
    fn save_bank_rates(&self, rates: &BTreeMap<String, f64>) -> Result<()>;
    fn api_key(&self) -> Result<Option<String>>;
    fn save_api_key(&self, key: Option<&str>) -> Result<()>;

    fn load_ledger(&self) -> Result<Ledger> {
        Ok(Ledger {
            children: self.children()?,
            logs: self.logs()?,
            investments: self.investments()?,
        })
    }

    /// Writes the three ledger collections. Backends that can stage writes
    /// should override this so a failure leaves the previous state intact.
    fn commit(&self, ledger: &Ledger) -> Result<()> {
        self.save_children(&ledger.children)?;
        self.save_logs(&ledger.logs)?;
        self.save_investments(&ledger.investments)?;
        Ok(())
    }

    /// Stores a snapshot of `ledger` outside the live collections, if supported.
    fn backup(&self, _ledger: &Ledger, _note: Option<&str>) -> Result<Option<PathBuf>> {
        Ok(None)
    }
}
