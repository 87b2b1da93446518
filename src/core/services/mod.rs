pub mod activity_service;
pub mod bank_service;
pub mod child_service;
pub mod history_service;
pub mod investment_service;

pub use activity_service::ActivityService;
pub use bank_service::BankService;
pub use child_service::{ChildRemoval, ChildService};
pub use history_service::{HistoryService, MonthGroup};
pub use investment_service::{InvestmentService, NewInvestment, Settlement, SettlementKind};

use uuid::Uuid;

use crate::errors::LedgerError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Invalid(String),
    #[error("Import rejected: {0}")]
    ImportRejected(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

/// Rejection for a change that would push a child's total out of range.
pub(crate) fn out_of_range(child_id: Uuid) -> ServiceError {
    ServiceError::Invalid(format!(
        "Points for child {} would leave the supported range",
        child_id
    ))
}
