//! Business rules and the transactional facade over storage.

pub mod clock;
pub mod ledger_manager;
pub mod services;
pub mod transfer;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ledger_manager::LedgerManager;
