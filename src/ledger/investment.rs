use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Months are approximated as fixed 30 day blocks.
pub const DAYS_PER_MONTH: i64 = 30;

/// Terms offered when opening a deposit.
pub const TERM_CHOICES: [u32; 4] = [1, 3, 6, 12];

/// Longest term a deposit may run for.
pub const MAX_TERM_MONTHS: u32 = 120;

// Absorbs float noise such as 30.000000000000004 before rounding up.
const INTEREST_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    Active,
    Completed,
    EarlyWithdrawn,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStatus::Active => "active",
            InvestmentStatus::Completed => "completed",
            InvestmentStatus::EarlyWithdrawn => "early_withdrawn",
        }
    }
}

/// A fixed deposit of points locked with a bank for a number of months.
///
/// `rate` and `projected_return` are captured when the deposit opens and never
/// follow later bank rate changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: Uuid,
    pub child_id: Uuid,
    pub bank_id: String,
    pub principal: i64,
    pub rate: f64,
    pub duration_months: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub maturity_date: DateTime<Utc>,
    pub projected_return: i64,
    pub status: InvestmentStatus,
}

impl Investment {
    /// Opens an active deposit. `None` when the maturity date is not representable.
    pub fn open(
        child_id: Uuid,
        bank_id: impl Into<String>,
        principal: i64,
        rate: f64,
        duration_months: u32,
        start_date: DateTime<Utc>,
    ) -> Option<Self> {
        Some(Self {
            id: Uuid::new_v4(),
            child_id,
            bank_id: bank_id.into(),
            principal,
            rate,
            duration_months,
            start_date,
            maturity_date: maturity_date(start_date, duration_months)?,
            projected_return: projected_interest(principal, rate, duration_months),
            status: InvestmentStatus::Active,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == InvestmentStatus::Active
    }

    pub fn is_mature_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.maturity_date
    }

    /// Principal plus the promised interest, `None` if the sum overflows.
    pub fn maturity_payout(&self) -> Option<i64> {
        self.principal.checked_add(self.projected_return)
    }

    /// Moves an active deposit to `Completed`, returning the amount to credit.
    /// Leaves the deposit untouched when it is not active or the payout overflows.
    pub fn mature(&mut self) -> Option<i64> {
        if !self.is_active() {
            return None;
        }
        let payout = self.maturity_payout()?;
        self.status = InvestmentStatus::Completed;
        Some(payout)
    }

    /// Moves an active deposit to `EarlyWithdrawn`, returning the principal.
    pub fn withdraw_early(&mut self) -> Option<i64> {
        if !self.is_active() {
            return None;
        }
        self.status = InvestmentStatus::EarlyWithdrawn;
        Some(self.principal)
    }

    /// Elapsed share of the term in `0.0..=1.0`.
    pub fn progress_at(&self, now: DateTime<Utc>) -> f64 {
        let total = (self.maturity_date - self.start_date).num_milliseconds().max(1);
        let elapsed = (now - self.start_date).num_milliseconds().max(0);
        (elapsed as f64 / total as f64).min(1.0)
    }

    /// Whole days left until maturity, rounded up and never negative.
    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        let remaining = (self.maturity_date - now).num_milliseconds();
        if remaining <= 0 {
            return 0;
        }
        let day = Duration::days(1).num_milliseconds();
        (remaining + day - 1) / day
    }
}

/// Simple interest `principal * rate% * months/12`, rounded up to a whole point.
pub fn projected_interest(principal: i64, rate: f64, duration_months: u32) -> i64 {
    if principal <= 0 || !rate.is_finite() || rate <= 0.0 {
        return 0;
    }
    let raw = principal as f64 * (rate / 100.0) * (f64::from(duration_months) / 12.0);
    (raw - INTEREST_EPSILON).ceil().max(0.0) as i64
}

/// `start` plus `duration_months` blocks of thirty days, or `None` past the calendar range.
pub fn maturity_date(start: DateTime<Utc>, duration_months: u32) -> Option<DateTime<Utc>> {
    let term = Duration::try_days(i64::from(duration_months) * DAYS_PER_MONTH)?;
    start.checked_add_signed(term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn interest_for_a_year_at_three_percent() {
        assert_eq!(projected_interest(1000, 3.0, 12), 30);
    }

    #[test]
    fn interest_rounds_up_in_favor_of_the_saver() {
        // 100 * 2.5% * 1/12 = 0.2083..
        assert_eq!(projected_interest(100, 2.5, 1), 1);
        // 250 * 3.6% * 6/12 = 4.5
        assert_eq!(projected_interest(250, 3.6, 6), 5);
    }

    #[test]
    fn interest_ignores_float_noise() {
        // 0.1 + 0.2 style noise must not bump an exact result up by one.
        assert_eq!(projected_interest(1000, 2.4, 6), 12);
        assert_eq!(projected_interest(500, 3.0, 12), 15);
    }

    #[test]
    fn maturity_uses_thirty_day_months() {
        let investment = Investment::open(Uuid::new_v4(), "mbank", 100, 3.0, 3, start()).unwrap();
        assert_eq!(investment.maturity_date - investment.start_date, Duration::days(90));
    }

    #[test]
    fn maturity_past_the_calendar_is_unrepresentable() {
        assert!(maturity_date(start(), u32::MAX).is_none());
        assert!(maturity_date(start(), 4_000_000).is_none());
        assert!(Investment::open(Uuid::new_v4(), "mbank", 10, 2.5, 4_000_000, start()).is_none());
        assert_eq!(
            maturity_date(start(), MAX_TERM_MONTHS),
            Some(start() + Duration::days(3600))
        );
    }

    #[test]
    fn payout_overflow_keeps_the_deposit_active() {
        let mut investment =
            Investment::open(Uuid::new_v4(), "mbank", i64::MAX, 3.0, 12, start()).unwrap();
        assert!(investment.projected_return > 0);
        assert_eq!(investment.maturity_payout(), None);
        assert_eq!(investment.mature(), None);
        assert!(investment.is_active());
    }

    #[test]
    fn terminal_states_do_not_transition_again() {
        let mut investment = Investment::open(Uuid::new_v4(), "mbank", 100, 3.0, 12, start()).unwrap();
        assert_eq!(investment.withdraw_early(), Some(100));
        assert_eq!(investment.status, InvestmentStatus::EarlyWithdrawn);
        assert_eq!(investment.mature(), None);
        assert_eq!(investment.withdraw_early(), None);
        assert_eq!(investment.status, InvestmentStatus::EarlyWithdrawn);
    }

    #[test]
    fn progress_and_countdown_track_the_term() {
        let investment = Investment::open(Uuid::new_v4(), "cbank", 100, 3.0, 1, start()).unwrap();
        let halfway = start() + Duration::days(15);
        assert!((investment.progress_at(halfway) - 0.5).abs() < 1e-9);
        assert_eq!(investment.days_remaining(halfway), 15);
        assert_eq!(investment.days_remaining(halfway + Duration::hours(1)), 15);

        let later = start() + Duration::days(45);
        assert_eq!(investment.progress_at(later), 1.0);
        assert_eq!(investment.days_remaining(later), 0);
        assert!(investment.is_mature_at(later));
    }

    #[test]
    fn status_serializes_in_snake_case() {
        let investment = Investment::open(Uuid::new_v4(), "ubank", 10, 1.0, 1, start()).unwrap();
        let mut json = serde_json::to_value(&investment).unwrap();
        assert_eq!(json["status"], "active");
        json["status"] = "early_withdrawn".into();
        let parsed: Investment = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.status, InvestmentStatus::EarlyWithdrawn);
    }
}
