//! Ledger domain models and persistence-friendly types.

pub mod activity;
pub mod bank;
pub mod child;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod investment;

pub use activity::{ActivityCategory, ActivityLog, EntryMode};
pub use bank::{default_banks, is_known_bank, Bank};
pub use child::Child;
pub use investment::{
    maturity_date, projected_interest, Investment, InvestmentStatus, DAYS_PER_MONTH,
    MAX_TERM_MONTHS, TERM_CHOICES,
};
pub use ledger::Ledger;
