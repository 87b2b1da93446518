//! Fixed-deposit lifecycle: opening, early withdrawal and maturity crediting.
//!
//! Every state change is paired with an activity log entry so the child's
//! balance stays the sum of its log. Opening posts a debit of the principal,
//! withdrawal credits the principal back, and maturity credits principal plus
//! the interest promised when the deposit opened.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::ledger::{ActivityCategory, ActivityLog, Bank, Investment, Ledger, MAX_TERM_MONTHS};

use super::{out_of_range, ServiceError, ServiceResult};

/// Parameters for opening a deposit.
#[derive(Debug, Clone)]
pub struct NewInvestment {
    pub child_id: Uuid,
    pub bank_id: String,
    pub amount: i64,
    pub months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementKind {
    Matured,
    Withdrawn,
}

/// Outcome of closing a deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub investment_id: Uuid,
    pub child_id: Uuid,
    pub credited: i64,
    pub entry_id: Uuid,
    pub kind: SettlementKind,
}

pub struct InvestmentService;

impl InvestmentService {
    /// Opens a deposit at the bank's current rate and debits the principal.
    pub fn create(
        ledger: &mut Ledger,
        banks: &[Bank],
        request: &NewInvestment,
        now: DateTime<Utc>,
    ) -> ServiceResult<Uuid> {
        let bank = banks
            .iter()
            .find(|bank| bank.id == request.bank_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Bank `{}`", request.bank_id)))?;
        let child = ledger
            .child(request.child_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Child {}", request.child_id)))?;
        if request.amount <= 0 {
            return Err(ServiceError::Invalid(
                "Deposit amount must be positive".into(),
            ));
        }
        if request.months == 0 || request.months > MAX_TERM_MONTHS {
            return Err(ServiceError::Invalid(format!(
                "Deposit term must be between 1 and {} months",
                MAX_TERM_MONTHS
            )));
        }
        if request.amount > child.total_points {
            return Err(ServiceError::Invalid(format!(
                "{} only has {} points, cannot deposit {}",
                child.name, child.total_points, request.amount
            )));
        }

        let investment = Investment::open(
            request.child_id,
            bank.id.clone(),
            request.amount,
            bank.rate,
            request.months,
            now,
        )
        .ok_or_else(|| ServiceError::Invalid("Deposit would mature past the calendar".into()))?;
        let debit = ActivityLog::new(
            request.child_id,
            format!("Fixed deposit at {} ({} mo)", bank.name, request.months),
            -request.amount,
            ActivityCategory::Investment,
        )
        .at(now);

        let id = investment.id;
        tracing::info!(
            investment = %id,
            bank = %bank.id,
            principal = investment.principal,
            projected = investment.projected_return,
            "deposit opened"
        );
        ledger
            .post_entry(debit)
            .ok_or_else(|| out_of_range(request.child_id))?;
        ledger.investments.push(investment);
        Ok(id)
    }

    /// Closes an active deposit early, crediting only the principal.
    pub fn withdraw(
        ledger: &mut Ledger,
        banks: &[Bank],
        id: Uuid,
        now: DateTime<Utc>,
    ) -> ServiceResult<Settlement> {
        let investment = ledger
            .investment(id)
            .ok_or_else(|| ServiceError::NotFound(format!("Investment {}", id)))?;
        if !investment.is_active() {
            return Err(ServiceError::Invalid(format!(
                "Investment {} is already {}",
                id,
                investment.status.as_str()
            )));
        }
        let child_id = investment.child_id;
        let credited = investment.principal;
        let credit = ActivityLog::new(
            child_id,
            format!("Early withdrawal from {}", bank_name(banks, &investment.bank_id)),
            credited,
            ActivityCategory::Investment,
        )
        .at(now);

        let entry_id = ledger
            .post_entry(credit)
            .ok_or_else(|| out_of_range(child_id))?;
        if let Some(investment) = ledger.investment_mut(id) {
            investment.withdraw_early();
        }
        tracing::info!(investment = %id, credited, "deposit withdrawn early");
        Ok(Settlement {
            investment_id: id,
            child_id,
            credited,
            entry_id,
            kind: SettlementKind::Withdrawn,
        })
    }

    /// Completes every active deposit whose maturity date has passed.
    ///
    /// Completed deposits are skipped on later calls, so each pays out once.
    /// A deposit whose payout cannot be credited stays active and is logged.
    pub fn settle_matured(
        ledger: &mut Ledger,
        banks: &[Bank],
        now: DateTime<Utc>,
    ) -> Vec<Settlement> {
        let due: Vec<Uuid> = ledger
            .investments
            .iter()
            .filter(|investment| investment.is_active() && investment.is_mature_at(now))
            .map(|investment| investment.id)
            .collect();

        let mut settlements = Vec::with_capacity(due.len());
        for investment_id in due {
            match Self::credit_maturity(ledger, banks, investment_id, now) {
                Some(settlement) => {
                    tracing::info!(
                        investment = %investment_id,
                        credited = settlement.credited,
                        "deposit matured"
                    );
                    settlements.push(settlement);
                }
                None => tracing::warn!(
                    investment = %investment_id,
                    "matured deposit could not be credited; left active"
                ),
            }
        }
        settlements
    }

    fn credit_maturity(
        ledger: &mut Ledger,
        banks: &[Bank],
        investment_id: Uuid,
        now: DateTime<Utc>,
    ) -> Option<Settlement> {
        let investment = ledger.investment(investment_id)?;
        let child_id = investment.child_id;
        let credited = investment.maturity_payout()?;
        let credit = ActivityLog::new(
            child_id,
            format!(
                "Fixed deposit matured at {} (+{} interest)",
                bank_name(banks, &investment.bank_id),
                investment.projected_return
            ),
            credited,
            ActivityCategory::Investment,
        )
        .at(now);

        let entry_id = ledger.post_entry(credit)?;
        ledger.investment_mut(investment_id)?.mature();
        Some(Settlement {
            investment_id,
            child_id,
            credited,
            entry_id,
            kind: SettlementKind::Matured,
        })
    }

    /// A child's deposits, active first and then by maturity date.
    pub fn list(ledger: &Ledger, child_id: Uuid) -> Vec<&Investment> {
        let mut investments: Vec<&Investment> = ledger.investments_for(child_id).collect();
        investments.sort_by(|a, b| {
            b.is_active()
                .cmp(&a.is_active())
                .then(a.maturity_date.cmp(&b.maturity_date))
        });
        investments
    }

    /// Points currently locked in active deposits.
    pub fn locked_points(ledger: &Ledger, child_id: Uuid) -> i64 {
        ledger
            .investments_for(child_id)
            .filter(|inv| inv.is_active())
            .fold(0i64, |sum, inv| sum.saturating_add(inv.principal))
    }

    /// Finds a deposit by full id or unique id prefix.
    pub fn find<'a>(ledger: &'a Ledger, query: &str) -> ServiceResult<&'a Investment> {
        let needle = query.trim().to_lowercase();
        if let Ok(id) = Uuid::parse_str(&needle) {
            return ledger
                .investment(id)
                .ok_or_else(|| ServiceError::NotFound(format!("Investment {}", id)));
        }
        let matches: Vec<&Investment> = ledger
            .investments
            .iter()
            .filter(|inv| !needle.is_empty() && inv.id.to_string().starts_with(&needle))
            .collect();
        match matches.as_slice() {
            [single] => Ok(single),
            [] => Err(ServiceError::NotFound(format!(
                "Investment `{}`",
                query.trim()
            ))),
            _ => Err(ServiceError::Invalid(format!(
                "`{}` matches more than one investment",
                query.trim()
            ))),
        }
    }
}

fn bank_name(banks: &[Bank], bank_id: &str) -> String {
    banks
        .iter()
        .find(|bank| bank.id == bank_id)
        .map(|bank| bank.name.clone())
        .unwrap_or_else(|| bank_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{default_banks, Child, InvestmentStatus};
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap()
    }

    fn funded(points: i64) -> (Ledger, Uuid) {
        let mut ledger = Ledger::new();
        let child = Child::new("Alice");
        let id = child.id;
        ledger.children.push(child);
        ledger.post_entry(ActivityLog::new(id, "Savings", points, ActivityCategory::Chore));
        (ledger, id)
    }

    fn request(child_id: Uuid, amount: i64, months: u32) -> NewInvestment {
        NewInvestment {
            child_id,
            bank_id: "mbank".into(),
            amount,
            months,
        }
    }

    #[test]
    fn create_debits_exactly_the_principal() {
        let (mut ledger, child) = funded(100);
        let id = InvestmentService::create(
            &mut ledger,
            &default_banks(),
            &request(child, 40, 3),
            start(),
        )
        .unwrap();

        let investment = ledger.investment(id).unwrap();
        assert_eq!(investment.rate, 2.50);
        assert_eq!(investment.status, InvestmentStatus::Active);
        assert_eq!(ledger.child(child).unwrap().total_points, 60);
        assert_eq!(InvestmentService::locked_points(&ledger, child), 40);
        assert!(ledger.warnings().is_empty());
    }

    #[test]
    fn create_rejects_overdraft_without_change() {
        let (mut ledger, child) = funded(30);
        let before = ledger.clone();
        let err = InvestmentService::create(
            &mut ledger,
            &default_banks(),
            &request(child, 31, 3),
            start(),
        )
        .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid(_)));
        assert_eq!(ledger, before);
    }

    #[test]
    fn create_rejects_bad_terms() {
        let (mut ledger, child) = funded(30);
        let banks = default_banks();
        assert!(InvestmentService::create(&mut ledger, &banks, &request(child, 0, 3), start())
            .is_err());
        assert!(InvestmentService::create(&mut ledger, &banks, &request(child, 5, 0), start())
            .is_err());
        let mut unknown = request(child, 5, 1);
        unknown.bank_id = "xbank".into();
        assert!(InvestmentService::create(&mut ledger, &banks, &unknown, start())
            .unwrap_err()
            .is_not_found());
        assert!(ledger.investments.is_empty());
    }

    #[test]
    fn early_withdrawal_returns_principal_once() {
        let (mut ledger, child) = funded(100);
        let banks = default_banks();
        let id =
            InvestmentService::create(&mut ledger, &banks, &request(child, 50, 12), start())
                .unwrap();

        let settlement =
            InvestmentService::withdraw(&mut ledger, &banks, id, start() + Duration::days(10))
                .unwrap();
        assert_eq!(settlement.credited, 50);
        assert_eq!(settlement.kind, SettlementKind::Withdrawn);
        assert_eq!(ledger.child(child).unwrap().total_points, 100);

        let snapshot = ledger.clone();
        assert!(InvestmentService::withdraw(&mut ledger, &banks, id, start()).is_err());
        assert_eq!(ledger, snapshot);
    }

    #[test]
    fn maturity_credits_principal_and_interest_once() {
        let (mut ledger, child) = funded(1000);
        let mut banks = default_banks();
        banks[0].rate = 3.0;
        let id =
            InvestmentService::create(&mut ledger, &banks, &request(child, 1000, 12), start())
                .unwrap();

        let early = InvestmentService::settle_matured(
            &mut ledger,
            &banks,
            start() + Duration::days(359),
        );
        assert!(early.is_empty());

        let due = start() + Duration::days(360);
        let settled = InvestmentService::settle_matured(&mut ledger, &banks, due);
        assert_eq!(settled.len(), 1);
        assert_eq!(settled[0].credited, 1030);
        assert_eq!(ledger.investment(id).unwrap().status, InvestmentStatus::Completed);
        assert_eq!(ledger.child(child).unwrap().total_points, 1030);

        assert!(InvestmentService::settle_matured(&mut ledger, &banks, due).is_empty());
        assert_eq!(ledger.child(child).unwrap().total_points, 1030);
    }

    #[test]
    fn rate_changes_do_not_touch_open_deposits() {
        let (mut ledger, child) = funded(100);
        let mut banks = default_banks();
        let id =
            InvestmentService::create(&mut ledger, &banks, &request(child, 100, 12), start())
                .unwrap();
        banks[0].rate = 9.0;
        let investment = ledger.investment(id).unwrap();
        assert_eq!(investment.rate, 2.50);
        assert_eq!(investment.projected_return, 3);
    }

    #[test]
    fn create_rejects_terms_past_the_limit() {
        let (mut ledger, child) = funded(30);
        let before = ledger.clone();
        let banks = default_banks();
        for months in [MAX_TERM_MONTHS + 1, 4_000_000, u32::MAX] {
            let err = InvestmentService::create(
                &mut ledger,
                &banks,
                &request(child, 10, months),
                start(),
            )
            .unwrap_err();
            assert!(matches!(err, ServiceError::Invalid(_)), "{months}");
        }
        assert_eq!(ledger, before);

        let id = InvestmentService::create(
            &mut ledger,
            &banks,
            &request(child, 10, MAX_TERM_MONTHS),
            start(),
        )
        .unwrap();
        let investment = ledger.investment(id).unwrap();
        assert_eq!(investment.maturity_date, start() + Duration::days(3600));
    }

    #[test]
    fn payout_that_cannot_be_credited_leaves_the_deposit_active() {
        let (mut ledger, child) = funded(i64::MAX);
        let banks = default_banks();
        let id = InvestmentService::create(
            &mut ledger,
            &banks,
            &request(child, 1_000_000, 12),
            start(),
        )
        .unwrap();
        let before = ledger.clone();

        let settled =
            InvestmentService::settle_matured(&mut ledger, &banks, start() + Duration::days(400));
        assert!(settled.is_empty());
        assert_eq!(ledger, before);
        assert!(ledger.investment(id).unwrap().is_active());
        assert!(ledger.warnings().is_empty());
    }
}
